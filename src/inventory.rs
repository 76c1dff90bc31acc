//! Collaborator traits and read-only resource views
//!
//! Analyzers never talk to provider SDKs directly; they consume these traits.
//! The AWS-backed implementations live in `src/aws/`, test doubles are built
//! with `mockall::mock!` in the integration tests.

use crate::error::Result;
use async_trait::async_trait;
use chrono::Duration;

/// State of a compute instance as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Running,
    Stopped,
    Other(String),
}

/// Read-only view of a compute instance
#[derive(Debug, Clone)]
pub struct ComputeInstance {
    pub id: String,
    pub instance_type: String,
    pub state: InstanceState,
    pub name: Option<String>,
    pub tags: Vec<(String, String)>,
}

impl ComputeInstance {
    /// Display name for logs: the Name tag when present, the id otherwise
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// State of a block-storage volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeState {
    Available,
    InUse,
    Other(String),
}

/// Read-only view of a block-storage volume
#[derive(Debug, Clone)]
pub struct Volume {
    pub id: String,
    pub volume_type: String,
    pub size_gib: i64,
    pub state: VolumeState,
    pub attached_to: Option<String>,
    pub name: Option<String>,
}

/// Filter for volume listings
#[derive(Debug, Clone, Default)]
pub struct VolumeFilter {
    /// Restrict to volumes attached to this instance id
    pub attached_to: Option<String>,
}

impl VolumeFilter {
    pub fn attached_to(instance_id: &str) -> Self {
        Self {
            attached_to: Some(instance_id.to_string()),
        }
    }
}

/// Compute and block-storage inventory for one region
#[async_trait]
pub trait ComputeInventory: Send + Sync {
    async fn list_instances(&self, state: Option<InstanceState>) -> Result<Vec<ComputeInstance>>;
    async fn list_volumes(&self, filter: VolumeFilter) -> Result<Vec<Volume>>;
}

/// Read-only view of a managed-database instance
#[derive(Debug, Clone)]
pub struct DatabaseInstance {
    pub id: String,
    pub instance_class: String,
    pub engine: String,
    pub engine_version: String,
    pub allocated_storage_gib: i64,
    pub multi_az: bool,
    pub replica_source: Option<String>,
    pub backup_retention_days: i32,
}

impl DatabaseInstance {
    /// Managed-cluster engines carry their own optimization model and are
    /// skipped by the per-instance heuristics.
    pub fn is_cluster_engine(&self) -> bool {
        matches!(
            self.engine.as_str(),
            "aurora" | "aurora-mysql" | "aurora-postgresql"
        )
    }
}

/// Read-only view of a database snapshot
#[derive(Debug, Clone)]
pub struct DatabaseSnapshot {
    pub id: String,
    pub instance_id: String,
}

/// State of a reserved-capacity purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationState {
    Active,
    Other(String),
}

/// Read-only view of a reserved-capacity record
#[derive(Debug, Clone)]
pub struct ReservationRecord {
    pub id: String,
    pub state: ReservationState,
}

/// Managed-database inventory for one region
#[async_trait]
pub trait DatabaseInventory: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<DatabaseInstance>>;
    async fn list_snapshots(&self) -> Result<Vec<DatabaseSnapshot>>;
    async fn list_reserved_capacity(&self) -> Result<Vec<ReservationRecord>>;
}

/// Statistic applied when aggregating a metric series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Average,
    Sum,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
        }
    }
}

/// One metric requested from the metric source
#[derive(Debug, Clone)]
pub struct MetricQuery {
    /// Caller-chosen identifier, echoed back on the matching series
    pub id: String,
    /// Provider-side metric name (e.g. "CPUUtilization")
    pub metric_name: String,
    pub statistic: Statistic,
}

impl MetricQuery {
    pub fn new(id: &str, metric_name: &str, statistic: Statistic) -> Self {
        Self {
            id: id.to_string(),
            metric_name: metric_name.to_string(),
            statistic,
        }
    }
}

/// Samples returned for one `MetricQuery`
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub id: String,
    pub values: Vec<f64>,
}

impl MetricSeries {
    /// Mean of the samples, or None for an empty series
    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }
}

/// Time-series metric retrieval, batched per instance
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch all requested series for one instance in a single request
    async fn get_metric_data(
        &self,
        instance_id: &str,
        queries: Vec<MetricQuery>,
        window: Duration,
        period_secs: i32,
    ) -> Result<Vec<MetricSeries>>;
}
