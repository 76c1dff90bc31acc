//! Integration tests for the database analyzer

mod common;

use chrono::Duration;
use common::{db_instance, quiet_series, series, StaticPricing};
use costctl::analyzer::Analyzer;
use costctl::database::DatabaseAnalyzer;
use costctl::error::{CostctlError, Result};
use costctl::inventory::{
    DatabaseInstance, DatabaseInventory, DatabaseSnapshot, MetricQuery, MetricSeries,
    MetricSource, ReservationRecord, ReservationState,
};
use std::sync::Arc;

mockall::mock! {
    pub DatabaseApi {}

    #[async_trait::async_trait]
    impl DatabaseInventory for DatabaseApi {
        async fn list_instances(&self) -> Result<Vec<DatabaseInstance>>;
        async fn list_snapshots(&self) -> Result<Vec<DatabaseSnapshot>>;
        async fn list_reserved_capacity(&self) -> Result<Vec<ReservationRecord>>;
    }
}

mockall::mock! {
    pub MetricApi {}

    #[async_trait::async_trait]
    impl MetricSource for MetricApi {
        async fn get_metric_data(
            &self,
            instance_id: &str,
            queries: Vec<MetricQuery>,
            window: Duration,
            period_secs: i32,
        ) -> Result<Vec<MetricSeries>>;
    }
}

fn inventory_with(
    instances: Vec<DatabaseInstance>,
    snapshots: Vec<DatabaseSnapshot>,
    reservations: Vec<ReservationRecord>,
) -> MockDatabaseApi {
    let mut inventory = MockDatabaseApi::new();
    inventory
        .expect_list_instances()
        .returning(move || Ok(instances.clone()));
    inventory
        .expect_list_snapshots()
        .returning(move || Ok(snapshots.clone()));
    inventory
        .expect_list_reserved_capacity()
        .returning(move || Ok(reservations.clone()));
    inventory
}

fn metrics_returning(series: Vec<MetricSeries>) -> MockMetricApi {
    let mut metrics = MockMetricApi::new();
    metrics
        .expect_get_metric_data()
        .returning(move |_, _, _, _| Ok(series.clone()));
    metrics
}

fn analyzer(
    inventory: MockDatabaseApi,
    metrics: MockMetricApi,
    pricing: StaticPricing,
) -> DatabaseAnalyzer {
    DatabaseAnalyzer::new(
        Arc::new(inventory),
        Arc::new(metrics),
        Arc::new(pricing),
        "us-east-1",
    )
}

#[tokio::test]
async fn low_utilization_and_low_retention_scenario() {
    let mut instance = db_instance("orders-db", "db.r6g.large", "postgres");
    instance.backup_retention_days = 3;

    let inventory = inventory_with(vec![instance], vec![], vec![]);

    // CPU 30%, connections at 10% of the default 5000 ceiling
    let mut battery = quiet_series();
    battery.retain(|s| s.id != "cpu" && s.id != "connections");
    battery.push(series("cpu", 30.0));
    battery.push(series("connections", 500.0));
    let metrics = metrics_returning(battery);

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await
        .unwrap();

    assert!(result
        .recommendations
        .iter()
        .any(|r| r == "Instance orders-db:"));
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("downsizing due to low utilization (CPU: 30.0%, Connections: 10.0%)")));
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("Low backup retention period (3 days)")));

    // Zero active reservations against one instance: 0% coverage
    assert_eq!(
        result.details.get("Reserved Instance Coverage"),
        Some(&"0.0%".to_string())
    );
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("Low Reserved Instance coverage (0.0%)")));

    // Heuristics are advisory; no dollars attributed
    assert_eq!(result.potential_savings, 0.0);
}

#[tokio::test]
async fn aurora_instances_are_skipped() {
    let inventory = inventory_with(
        vec![db_instance("wiki-db", "db.r5.large", "aurora-postgresql")],
        vec![],
        vec![],
    );

    let mut metrics = MockMetricApi::new();
    metrics.expect_get_metric_data().never();

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await
        .unwrap();

    assert!(!result
        .recommendations
        .iter()
        .any(|r| r.starts_with("Instance ")));
    assert_eq!(result.potential_savings, 0.0);
}

#[tokio::test]
async fn upgrade_savings_accumulate_into_total() {
    let inventory = inventory_with(
        vec![
            db_instance("a-db", "db.t3.micro", "postgres"),
            db_instance("b-db", "db.m5.large", "mysql"),
        ],
        vec![],
        vec![ReservationRecord {
            id: "ri-1".to_string(),
            state: ReservationState::Active,
        }],
    );
    let metrics = metrics_returning(quiet_series());
    let pricing = StaticPricing::priced()
        .with_upgrade_savings("db.t3.micro", "db.t4g.micro", 0.72)
        .with_upgrade_savings("db.m5.large", "db.m6g.large", 13.68);

    let result = analyzer(inventory, metrics, pricing).execute().await.unwrap();

    assert!((result.potential_savings - 14.40).abs() < 1e-9);
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("upgrading from db.t3.micro to db.t4g.micro for monthly savings of $0.72")));
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("upgrading from db.m5.large to db.m6g.large for monthly savings of $13.68")));
    assert_eq!(
        result.details.get("Total Monthly Savings"),
        Some(&"$14.40".to_string())
    );
}

#[tokio::test]
async fn pricing_failure_skips_upgrade_but_keeps_heuristics() {
    let mut instance = db_instance("c-db", "db.t3.micro", "postgres");
    instance.backup_retention_days = 1;

    let inventory = inventory_with(vec![instance], vec![], vec![]);
    let metrics = metrics_returning(quiet_series());
    // db.t3.micro is in the upgrade map but has no pricing entry
    let pricing = StaticPricing::priced();

    let result = analyzer(inventory, metrics, pricing).execute().await.unwrap();

    assert_eq!(result.potential_savings, 0.0);
    assert!(!result.recommendations.iter().any(|r| r.contains("upgrading")));
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("Low backup retention period (1 days)")));
}

#[tokio::test]
async fn metrics_failure_skips_only_that_instance() {
    let inventory = inventory_with(
        vec![
            db_instance("flaky-db", "db.r6g.large", "postgres"),
            db_instance("steady-db", "db.r6g.large", "postgres"),
        ],
        vec![],
        vec![],
    );

    let mut metrics = MockMetricApi::new();
    metrics
        .expect_get_metric_data()
        .returning(move |instance_id, _, _, _| {
            if instance_id == "flaky-db" {
                Err(CostctlError::Metrics {
                    instance_id: instance_id.to_string(),
                    message: "GetMetricData throttled".to_string(),
                })
            } else {
                let mut battery = quiet_series();
                battery.retain(|s| s.id != "burst_balance");
                battery.push(series("burst_balance", 5.0));
                Ok(battery)
            }
        });

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await
        .unwrap();

    // No partial output for the failed instance
    assert!(!result.recommendations.iter().any(|r| r.contains("flaky-db")));
    assert!(result.recommendations.iter().any(|r| r == "Instance steady-db:"));
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("Low burst balance (5.00%)")));
}

#[tokio::test]
async fn snapshot_pileup_counts_only_owning_instance() {
    let snapshots: Vec<DatabaseSnapshot> = (0..35)
        .map(|i| DatabaseSnapshot {
            id: format!("snap-{}", i),
            instance_id: "busy-db".to_string(),
        })
        .chain(std::iter::once(DatabaseSnapshot {
            id: "snap-other".to_string(),
            instance_id: "other-db".to_string(),
        }))
        .collect();

    let inventory = inventory_with(
        vec![
            db_instance("busy-db", "db.r6g.large", "postgres"),
            db_instance("tidy-db", "db.r6g.large", "postgres"),
        ],
        snapshots,
        vec![],
    );
    let metrics = metrics_returning(quiet_series());

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await
        .unwrap();

    let busy_header = result
        .recommendations
        .iter()
        .position(|r| r == "Instance busy-db:");
    assert!(busy_header.is_some());
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("High number of snapshots (35)")));
    assert!(!result.recommendations.iter().any(|r| r == "Instance tidy-db:"));
}

#[tokio::test]
async fn full_coverage_reports_detail_without_recommendation() {
    let inventory = inventory_with(
        vec![db_instance("a-db", "db.r6g.large", "postgres")],
        vec![],
        vec![ReservationRecord {
            id: "ri-1".to_string(),
            state: ReservationState::Active,
        }],
    );
    let metrics = metrics_returning(quiet_series());

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await
        .unwrap();

    assert_eq!(
        result.details.get("Reserved Instance Coverage"),
        Some(&"100.0%".to_string())
    );
    assert!(!result
        .recommendations
        .iter()
        .any(|r| r.contains("Reserved Instance coverage")));
}

#[tokio::test]
async fn inactive_reservations_do_not_count_toward_coverage() {
    let inventory = inventory_with(
        vec![db_instance("a-db", "db.r6g.large", "postgres")],
        vec![],
        vec![ReservationRecord {
            id: "ri-retired".to_string(),
            state: ReservationState::Other("retired".to_string()),
        }],
    );
    let metrics = metrics_returning(quiet_series());

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await
        .unwrap();

    assert_eq!(
        result.details.get("Reserved Instance Coverage"),
        Some(&"0.0%".to_string())
    );
}

#[tokio::test]
async fn reserved_capacity_failure_skips_coverage_check() {
    let mut inventory = MockDatabaseApi::new();
    inventory
        .expect_list_instances()
        .returning(|| Ok(vec![db_instance("a-db", "db.r6g.large", "postgres")]));
    inventory.expect_list_snapshots().returning(|| Ok(vec![]));
    inventory
        .expect_list_reserved_capacity()
        .returning(|| Err(CostctlError::Aws("access denied".to_string())));

    let metrics = metrics_returning(quiet_series());

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await
        .unwrap();

    assert!(result.details.get("Reserved Instance Coverage").is_none());
    assert!(!result
        .recommendations
        .iter()
        .any(|r| r.contains("Reserved Instance coverage")));
}

#[tokio::test]
async fn snapshot_listing_failure_is_not_fatal() {
    let mut inventory = MockDatabaseApi::new();
    inventory
        .expect_list_instances()
        .returning(|| Ok(vec![db_instance("a-db", "db.r6g.large", "postgres")]));
    inventory
        .expect_list_snapshots()
        .returning(|| Err(CostctlError::Aws("access denied".to_string())));
    inventory.expect_list_reserved_capacity().returning(|| Ok(vec![]));

    let metrics = metrics_returning(quiet_series());

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn base_instance_listing_failure_is_fatal() {
    let mut inventory = MockDatabaseApi::new();
    inventory
        .expect_list_instances()
        .returning(|| Err(CostctlError::Aws("DescribeDBInstances timed out".to_string())));
    inventory.expect_list_snapshots().never();
    inventory.expect_list_reserved_capacity().never();

    let metrics = MockMetricApi::new();

    let result = analyzer(inventory, metrics, StaticPricing::priced())
        .execute()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn identical_inputs_yield_identical_results() {
    let build = || {
        let mut instance = db_instance("orders-db", "db.t3.micro", "mysql");
        instance.backup_retention_days = 2;
        let inventory = inventory_with(vec![instance], vec![], vec![]);
        let metrics = metrics_returning(quiet_series());
        let pricing =
            StaticPricing::priced().with_upgrade_savings("db.t3.micro", "db.t4g.micro", 0.72);
        analyzer(inventory, metrics, pricing)
    };

    let first = build().execute().await.unwrap();
    let second = build().execute().await.unwrap();

    assert_eq!(first.potential_savings, second.potential_savings);
    assert_eq!(first.recommendations, second.recommendations);
    assert_eq!(first.details, second.details);
}
