//! Analyzer registry
//!
//! Instantiates analyzers with their collaborator handles for a requested
//! provider/region. The pricing service is constructed once by the caller
//! and shared across all analyzers by handle.

use crate::analyzer::Analyzer;
use crate::aws::{CloudWatchMetrics, Ec2Inventory, RdsInventory};
use crate::compute::ComputeAnalyzer;
use crate::config::TargetConfig;
use crate::database::DatabaseAnalyzer;
use crate::error::{ConfigError, Result};
use crate::inventory::{ComputeInventory, DatabaseInventory, MetricSource};
use crate::pricing::PricingSource;
use aws_config::{BehaviorVersion, Region};
use std::sync::Arc;

/// Build the analyzers for one provider/region target
pub async fn build_analyzers(
    target: &TargetConfig,
    pricing: Arc<dyn PricingSource>,
) -> Result<Vec<Box<dyn Analyzer>>> {
    match target.provider.as_str() {
        "aws" => {
            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(target.region.clone()))
                .load()
                .await;

            let compute_inventory: Arc<dyn ComputeInventory> =
                Arc::new(Ec2Inventory::new(aws_sdk_ec2::Client::new(&sdk_config)));
            let database_inventory: Arc<dyn DatabaseInventory> =
                Arc::new(RdsInventory::new(aws_sdk_rds::Client::new(&sdk_config)));
            let metric_source: Arc<dyn MetricSource> = Arc::new(CloudWatchMetrics::for_rds(
                aws_sdk_cloudwatch::Client::new(&sdk_config),
            ));

            Ok(vec![
                Box::new(ComputeAnalyzer::new(
                    compute_inventory,
                    pricing.clone(),
                    &target.region,
                )),
                Box::new(DatabaseAnalyzer::new(
                    database_inventory,
                    metric_source,
                    pricing,
                    &target.region,
                )),
            ])
        }
        other => Err(ConfigError::InvalidProvider(other.to_string()).into()),
    }
}
