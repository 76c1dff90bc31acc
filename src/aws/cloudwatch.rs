//! CloudWatch-backed metric retrieval
//!
//! One `GetMetricData` request per instance carries the whole metric battery.

use crate::error::{CostctlError, Result};
use crate::inventory::{MetricQuery, MetricSeries, MetricSource};
use async_trait::async_trait;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat};
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use chrono::{Duration, Utc};

/// Metric source over the CloudWatch API, scoped to one namespace
pub struct CloudWatchMetrics {
    client: CloudWatchClient,
    namespace: String,
    dimension_name: String,
}

impl CloudWatchMetrics {
    /// Metric source for RDS instance metrics
    pub fn for_rds(client: CloudWatchClient) -> Self {
        Self {
            client,
            namespace: "AWS/RDS".to_string(),
            dimension_name: "DBInstanceIdentifier".to_string(),
        }
    }
}

#[async_trait]
impl MetricSource for CloudWatchMetrics {
    async fn get_metric_data(
        &self,
        instance_id: &str,
        queries: Vec<MetricQuery>,
        window: Duration,
        period_secs: i32,
    ) -> Result<Vec<MetricSeries>> {
        let end = Utc::now();
        let start = end - window;

        let mut request = self
            .client
            .get_metric_data()
            .start_time(AwsDateTime::from_secs(start.timestamp()))
            .end_time(AwsDateTime::from_secs(end.timestamp()));

        for query in &queries {
            let metric = Metric::builder()
                .namespace(&self.namespace)
                .metric_name(&query.metric_name)
                .dimensions(
                    Dimension::builder()
                        .name(&self.dimension_name)
                        .value(instance_id)
                        .build(),
                )
                .build();

            request = request.metric_data_queries(
                MetricDataQuery::builder()
                    .id(&query.id)
                    .metric_stat(
                        MetricStat::builder()
                            .metric(metric)
                            .period(period_secs)
                            .stat(query.statistic.as_str())
                            .build(),
                    )
                    .build(),
            );
        }

        let response = request.send().await.map_err(|e| {
            CostctlError::Aws(format!(
                "Failed to get metric data for {}: {}",
                instance_id, e
            ))
        })?;

        let series = response
            .metric_data_results()
            .iter()
            .filter_map(|r| {
                Some(MetricSeries {
                    id: r.id()?.to_string(),
                    values: r.values().to_vec(),
                })
            })
            .collect();
        Ok(series)
    }
}
