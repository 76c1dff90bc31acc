//! Managed-database cost analysis
//!
//! Runs an ordered battery of heuristics per RDS instance over a 7-day
//! utilization aggregate, plus an account-level reserved-capacity coverage
//! check. Every heuristic runs for every instance regardless of whether
//! earlier ones fired; only the type-upgrade check contributes dollars.

use crate::analyzer::{AnalysisResult, Analyzer, Category, CloudProvider};
use crate::error::Result;
use crate::inventory::{
    DatabaseInstance, DatabaseInventory, MetricQuery, MetricSeries, MetricSource, ReservationState,
    Statistic,
};
use crate::pricing::PricingSource;
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

/// Instance class upgrade paths for RDS cost optimization
pub const RDS_UPGRADE_PATHS: &[(&str, &str)] = &[
    ("db.t3.micro", "db.t4g.micro"),
    ("db.t3.small", "db.t4g.small"),
    ("db.t3.medium", "db.t4g.medium"),
    ("db.r5.large", "db.r6g.large"),
    ("db.r5.xlarge", "db.r6g.xlarge"),
    ("db.m5.large", "db.m6g.large"),
    ("db.m5.xlarge", "db.m6g.xlarge"),
];

/// Recommended replacement class for an RDS instance class, if one exists
pub fn rds_upgrade_target(instance_class: &str) -> Option<&'static str> {
    RDS_UPGRADE_PATHS
        .iter()
        .find(|(from, _)| *from == instance_class)
        .map(|(_, to)| *to)
}

/// Approximate max-connections ceiling by instance class
///
/// A static step function, not a live value; actual ceilings vary by engine
/// and parameter group.
pub fn estimated_max_connections(instance_class: &str) -> f64 {
    match instance_class {
        "db.t3.micro" => 66.0,
        "db.t3.small" => 150.0,
        "db.t3.medium" => 312.0,
        _ => 5000.0,
    }
}

/// Utilization lookback window
const METRIC_WINDOW_DAYS: i64 = 7;
/// Sample period for metric aggregation
const METRIC_PERIOD_SECS: i32 = 3600;
/// Reserved-capacity coverage below this triggers a recommendation
const MIN_RESERVED_COVERAGE_PCT: f64 = 80.0;

/// Per-instance utilization aggregate over the lookback window
///
/// Computed fresh each analysis run; a metric with no samples stays at its
/// zero default, matching how missing CloudWatch data reads as idle.
#[derive(Debug, Clone, Default)]
pub struct UtilizationMetrics {
    pub cpu_utilization: f64,
    pub connection_count: f64,
    pub max_connections: f64,
    /// Percent of allocated storage in use, derived from free-space samples
    pub storage_utilization: f64,
    pub read_iops: f64,
    pub write_iops: f64,
    /// Seconds
    pub read_latency: f64,
    /// Seconds
    pub write_latency: f64,
    pub freeable_memory: f64,
    /// Bytes
    pub swap_usage: f64,
    /// Bytes per second
    pub network_receive: f64,
    /// Bytes per second
    pub network_transmit: f64,
    pub replica_lag: f64,
    pub backup_retention_days: i32,
    pub burst_balance: f64,
    pub disk_queue_depth: f64,
    pub deadlock_count: f64,
    pub blocked_transactions: f64,
}

/// Build the metric battery for one instance
///
/// Replica lag is only requested for read replicas; deadlocks and blocked
/// transactions are engine-specific.
fn metric_battery(instance: &DatabaseInstance) -> Vec<MetricQuery> {
    let mut queries = vec![
        MetricQuery::new("cpu", "CPUUtilization", Statistic::Average),
        MetricQuery::new("connections", "DatabaseConnections", Statistic::Average),
        MetricQuery::new("storage", "FreeStorageSpace", Statistic::Average),
        MetricQuery::new("read_iops", "ReadIOPS", Statistic::Average),
        MetricQuery::new("write_iops", "WriteIOPS", Statistic::Average),
        MetricQuery::new("read_latency", "ReadLatency", Statistic::Average),
        MetricQuery::new("write_latency", "WriteLatency", Statistic::Average),
        MetricQuery::new("freeable_memory", "FreeableMemory", Statistic::Average),
        MetricQuery::new("swap_usage", "SwapUsage", Statistic::Average),
        MetricQuery::new("network_receive", "NetworkReceiveThroughput", Statistic::Average),
        MetricQuery::new("network_transmit", "NetworkTransmitThroughput", Statistic::Average),
        MetricQuery::new("burst_balance", "BurstBalance", Statistic::Average),
        MetricQuery::new("disk_queue_depth", "DiskQueueDepth", Statistic::Average),
    ];

    if instance.replica_source.is_some() {
        queries.push(MetricQuery::new("replica_lag", "ReplicaLag", Statistic::Average));
    }

    match instance.engine.as_str() {
        "mysql" | "mariadb" => {
            queries.push(MetricQuery::new("deadlocks", "Deadlocks", Statistic::Sum));
        }
        "postgres" => {
            queries.push(MetricQuery::new(
                "blocked_transactions",
                "BlockedTransactions",
                Statistic::Average,
            ));
        }
        _ => {}
    }

    queries
}

/// Fold fetched series into a `UtilizationMetrics` aggregate
fn aggregate_metrics(instance: &DatabaseInstance, series: &[MetricSeries]) -> UtilizationMetrics {
    let mut metrics = UtilizationMetrics {
        backup_retention_days: instance.backup_retention_days,
        max_connections: estimated_max_connections(&instance.instance_class),
        ..Default::default()
    };

    for s in series {
        let Some(avg) = s.average() else { continue };
        match s.id.as_str() {
            "cpu" => metrics.cpu_utilization = avg,
            "connections" => metrics.connection_count = avg,
            "storage" => {
                // FreeStorageSpace is bytes free; convert to percent used
                let total_bytes = instance.allocated_storage_gib as f64 * 1024.0 * 1024.0 * 1024.0;
                if total_bytes > 0.0 {
                    metrics.storage_utilization = ((total_bytes - avg) / total_bytes) * 100.0;
                }
            }
            "read_iops" => metrics.read_iops = avg,
            "write_iops" => metrics.write_iops = avg,
            "read_latency" => metrics.read_latency = avg,
            "write_latency" => metrics.write_latency = avg,
            "freeable_memory" => metrics.freeable_memory = avg,
            "swap_usage" => metrics.swap_usage = avg,
            "network_receive" => metrics.network_receive = avg,
            "network_transmit" => metrics.network_transmit = avg,
            "replica_lag" => metrics.replica_lag = avg,
            "burst_balance" => metrics.burst_balance = avg,
            "disk_queue_depth" => metrics.disk_queue_depth = avg,
            "deadlocks" => metrics.deadlock_count = avg,
            "blocked_transactions" => metrics.blocked_transactions = avg,
            other => warn!(id = other, "unrecognized metric series id"),
        }
    }

    metrics
}

/// Heuristic battery over one instance's utilization aggregate
///
/// Pure over its inputs so the thresholds are directly testable. Ordering is
/// fixed; every check runs. Comparisons are strict, so a value exactly at a
/// threshold does not fire.
pub fn heuristic_recommendations(
    instance: &DatabaseInstance,
    metrics: &UtilizationMetrics,
    snapshot_count: usize,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    // Resource utilization
    if metrics.cpu_utilization < 40.0
        && metrics.connection_count < metrics.max_connections * 0.4
    {
        recommendations.push(format!(
            "Consider downsizing due to low utilization (CPU: {:.1}%, Connections: {:.1}%)",
            metrics.cpu_utilization,
            (metrics.connection_count / metrics.max_connections) * 100.0
        ));
    }

    // Storage
    if metrics.storage_utilization < 50.0 && instance.allocated_storage_gib > 100 {
        recommendations.push(format!(
            "Consider reducing allocated storage (Current: {} GB, Utilization: {:.1}%)",
            instance.allocated_storage_gib, metrics.storage_utilization
        ));
    }

    // Memory: more than 50 MiB of swap in use
    if metrics.swap_usage > 50.0 * 1024.0 * 1024.0 {
        recommendations.push(format!(
            "High swap usage detected ({:.2} MB). Consider upgrading instance memory",
            metrics.swap_usage / (1024.0 * 1024.0)
        ));
    }

    // I/O pressure
    if metrics.disk_queue_depth > 1.0 {
        recommendations.push(format!(
            "High disk queue depth ({:.2}). Consider using Provisioned IOPS storage",
            metrics.disk_queue_depth
        ));
    }

    if metrics.read_latency > 0.02 || metrics.write_latency > 0.02 {
        recommendations.push(format!(
            "High I/O latency detected (Read: {:.2}ms, Write: {:.2}ms). Consider optimizing storage",
            metrics.read_latency * 1000.0,
            metrics.write_latency * 1000.0
        ));
    }

    // Network: more than 100 MiB/s either direction
    let network_threshold = 100.0 * 1024.0 * 1024.0;
    if metrics.network_receive > network_threshold || metrics.network_transmit > network_threshold {
        recommendations.push(format!(
            "High network utilization (Receive: {:.2} MB/s, Transmit: {:.2} MB/s). Consider network optimization",
            metrics.network_receive / (1024.0 * 1024.0),
            metrics.network_transmit / (1024.0 * 1024.0)
        ));
    }

    // Availability topology
    if instance.multi_az {
        if metrics.read_iops > metrics.write_iops * 4.0 {
            recommendations.push(
                "Consider using read replicas instead of Multi-AZ for read-heavy workload"
                    .to_string(),
            );
        }
    } else if metrics.write_iops > 1000.0
        || metrics.connection_count > metrics.max_connections * 0.7
    {
        recommendations.push(
            "Consider enabling Multi-AZ for high-availability due to heavy workload".to_string(),
        );
    }

    // Backups
    if metrics.backup_retention_days < 7 {
        recommendations.push(format!(
            "Low backup retention period ({} days). Consider increasing for better disaster recovery",
            metrics.backup_retention_days
        ));
    }

    if snapshot_count > 30 {
        recommendations.push(format!(
            "High number of snapshots ({}). Consider implementing a snapshot cleanup policy",
            snapshot_count
        ));
    }

    // Engine-specific
    match instance.engine.as_str() {
        "mysql" | "mariadb" => {
            if metrics.deadlock_count > 0.0 {
                recommendations.push(format!(
                    "Detected {} deadlocks. Consider reviewing application logic and indexing",
                    metrics.deadlock_count as i64
                ));
            }
        }
        "postgres" => {
            if metrics.blocked_transactions > 5.0 {
                recommendations.push(format!(
                    "High number of blocked transactions ({:.2} avg). Review transaction management",
                    metrics.blocked_transactions
                ));
            }
        }
        _ => {}
    }

    // Burst credits
    if metrics.burst_balance < 20.0 {
        recommendations.push(format!(
            "Low burst balance ({:.2}%). Consider upgrading to a larger instance type",
            metrics.burst_balance
        ));
    }

    recommendations
}

/// Cost analysis over RDS instances
pub struct DatabaseAnalyzer {
    inventory: Arc<dyn DatabaseInventory>,
    metric_source: Arc<dyn MetricSource>,
    pricing: Arc<dyn PricingSource>,
    region: String,
}

impl DatabaseAnalyzer {
    pub fn new(
        inventory: Arc<dyn DatabaseInventory>,
        metric_source: Arc<dyn MetricSource>,
        pricing: Arc<dyn PricingSource>,
        region: &str,
    ) -> Self {
        Self {
            inventory,
            metric_source,
            pricing,
            region: region.to_string(),
        }
    }

    /// Fetch and aggregate the metric battery for one instance
    async fn instance_metrics(&self, instance: &DatabaseInstance) -> Result<UtilizationMetrics> {
        let series = self
            .metric_source
            .get_metric_data(
                &instance.id,
                metric_battery(instance),
                Duration::days(METRIC_WINDOW_DAYS),
                METRIC_PERIOD_SECS,
            )
            .await?;
        Ok(aggregate_metrics(instance, &series))
    }

    /// Type-upgrade savings via the upgrade map, suppressing non-positive deltas
    fn upgrade_recommendation(&self, instance: &DatabaseInstance) -> Option<(f64, String)> {
        let target = rds_upgrade_target(&instance.instance_class)?;
        match self
            .pricing
            .upgrade_savings(&instance.instance_class, target, &self.region)
        {
            Ok(savings) if savings > 0.0 => Some((
                savings,
                format!(
                    "Consider upgrading from {} to {} for monthly savings of ${:.2}",
                    instance.instance_class, target, savings
                ),
            )),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    "Failed to calculate savings for instance {}: {}",
                    instance.id, e
                );
                None
            }
        }
    }
}

#[async_trait]
impl Analyzer for DatabaseAnalyzer {
    fn name(&self) -> &'static str {
        "RDS Cost Analyzer"
    }

    fn category(&self) -> Category {
        Category::Database
    }

    async fn execute(&self) -> Result<AnalysisResult> {
        info!(region = %self.region, "starting RDS analysis");

        let mut result = AnalysisResult::new(CloudProvider::Aws, Category::Database, "RDS");

        // Base instance inventory; failure here is fatal to the whole call
        let instances = self.inventory.list_instances().await?;

        let snapshots = match self.inventory.list_snapshots().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!("Failed to get DB snapshots: {}", e);
                Vec::new()
            }
        };

        let mut total_potential_savings = 0.0;

        for instance in &instances {
            // Aurora-family engines have their own optimization strategies
            if instance.is_cluster_engine() {
                continue;
            }

            let metrics = match self.instance_metrics(instance).await {
                Ok(metrics) => metrics,
                Err(e) => {
                    warn!("Failed to get metrics for instance {}: {}", instance.id, e);
                    continue;
                }
            };

            let snapshot_count = snapshots
                .iter()
                .filter(|s| s.instance_id == instance.id)
                .count();

            let mut instance_recommendations = Vec::new();
            if let Some((savings, recommendation)) = self.upgrade_recommendation(instance) {
                total_potential_savings += savings;
                instance_recommendations.push(recommendation);
            }
            instance_recommendations.extend(heuristic_recommendations(
                instance,
                &metrics,
                snapshot_count,
            ));

            if !instance_recommendations.is_empty() {
                result
                    .recommendations
                    .push(format!("Instance {}:", instance.id));
                for recommendation in instance_recommendations {
                    result.recommendations.push(format!("  - {}", recommendation));
                }
            }
        }

        // Reserved-capacity coverage; a fetch failure skips the check only
        match self.inventory.list_reserved_capacity().await {
            Ok(reservations) => {
                if !instances.is_empty() {
                    let active = reservations
                        .iter()
                        .filter(|r| r.state == ReservationState::Active)
                        .count();
                    let coverage = active as f64 / instances.len() as f64 * 100.0;
                    result.details.insert(
                        "Reserved Instance Coverage".to_string(),
                        format!("{:.1}%", coverage),
                    );

                    if coverage < MIN_RESERVED_COVERAGE_PCT {
                        result.recommendations.push(format!(
                            "Low Reserved Instance coverage ({:.1}%). Consider increasing coverage for consistent workloads",
                            coverage
                        ));
                    }
                }
            }
            Err(e) => warn!("Failed to get reserved DB instances: {}", e),
        }

        result.potential_savings = total_potential_savings;
        result.details.insert(
            "Total Monthly Savings".to_string(),
            format!("${:.2}", total_potential_savings),
        );

        Ok(result)
    }
}
