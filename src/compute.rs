//! Compute fleet cost analysis
//!
//! Three independent checks over one region's compute inventory: running
//! instances on superseded instance families, stopped instances still paying
//! for attached volumes, and unattached volumes. Each check's recoverable
//! failures are logged and skipped; only the up-front volume listing is fatal.

use crate::analyzer::{AnalysisResult, Analyzer, Category, CloudProvider};
use crate::error::Result;
use crate::inventory::{ComputeInventory, InstanceState, Volume, VolumeFilter, VolumeState};
use crate::pricing::PricingSource;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Instance type upgrade paths for cost optimization
///
/// Externally-sourced product knowledge (AWS instance family successions);
/// the same table drives both upgrade eligibility and savings lookups.
pub const EC2_UPGRADE_PATHS: &[(&str, &str)] = &[
    ("t2.micro", "t3.micro"),
    ("t2.small", "t3.small"),
    ("t2.medium", "t3.medium"),
    ("m4.large", "m5.large"),
    ("m4.xlarge", "m5.xlarge"),
    ("c4.large", "c5.large"),
    ("c4.xlarge", "c5.xlarge"),
];

/// Recommended replacement type for an instance type, if one exists
pub fn ec2_upgrade_target(instance_type: &str) -> Option<&'static str> {
    EC2_UPGRADE_PATHS
        .iter()
        .find(|(from, _)| *from == instance_type)
        .map(|(_, to)| *to)
}

/// Cost analysis over EC2 instances and their EBS volumes
pub struct ComputeAnalyzer {
    inventory: Arc<dyn ComputeInventory>,
    pricing: Arc<dyn PricingSource>,
    region: String,
}

impl ComputeAnalyzer {
    pub fn new(
        inventory: Arc<dyn ComputeInventory>,
        pricing: Arc<dyn PricingSource>,
        region: &str,
    ) -> Self {
        Self {
            inventory,
            pricing,
            region: region.to_string(),
        }
    }

    /// Running instances whose type has a cheaper modern replacement
    async fn analyze_underutilized_instances(&self) -> Result<(f64, Vec<String>)> {
        let instances = self
            .inventory
            .list_instances(Some(InstanceState::Running))
            .await?;

        let mut total_savings = 0.0;
        let mut flagged: Vec<(String, String, f64)> = Vec::new();

        for instance in &instances {
            info!(
                name = instance.display_name(),
                id = %instance.id,
                instance_type = %instance.instance_type,
                "found running instance"
            );

            let Some(target_type) = ec2_upgrade_target(&instance.instance_type) else {
                continue;
            };

            match self
                .pricing
                .upgrade_savings(&instance.instance_type, target_type, &self.region)
            {
                Ok(savings) if savings > 0.0 => {
                    flagged.push((
                        instance.id.clone(),
                        format!("Upgrade from {} to {}", instance.instance_type, target_type),
                        savings,
                    ));
                    total_savings += savings;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to calculate savings for instance {}: {}", instance.id, e);
                }
            }
        }

        let mut recommendations = Vec::new();
        if !flagged.is_empty() {
            recommendations.push(format!(
                "Found {} instances with optimization opportunities:",
                flagged.len()
            ));
            for (id, action, savings) in &flagged {
                recommendations.push(format!(
                    "Instance {}: {} (Monthly savings: ${:.2})",
                    id, action, savings
                ));
            }
        }

        Ok((total_savings, recommendations))
    }

    /// Stopped instances whose attached volumes keep accruing storage cost
    async fn analyze_stopped_instances(&self) -> Result<(f64, Vec<String>)> {
        let instances = self
            .inventory
            .list_instances(Some(InstanceState::Stopped))
            .await?;

        let mut potential_savings = 0.0;
        let mut stopped_count = 0usize;
        let mut volume_lines = Vec::new();

        for instance in &instances {
            info!(
                name = instance.display_name(),
                id = %instance.id,
                "found stopped instance"
            );

            let volumes = match self
                .inventory
                .list_volumes(VolumeFilter::attached_to(&instance.id))
                .await
            {
                Ok(volumes) => volumes,
                Err(e) => {
                    warn!("Failed to get volumes for instance {}: {}", instance.id, e);
                    continue;
                }
            };

            let mut instance_volume_cost = 0.0;
            for volume in &volumes {
                if !self.pricing.is_region_priced(&self.region) {
                    warn!(region = %self.region, "region not supported for pricing calculations");
                    continue;
                }

                let price = match self.pricing.volume_price(&volume.volume_type, &self.region) {
                    Ok(price) => price,
                    Err(e) => {
                        warn!("Failed to get price for volume {}: {}", volume.id, e);
                        continue;
                    }
                };

                // GiB-month price times size gives the monthly cost directly
                let monthly_cost = price * volume.size_gib as f64;
                instance_volume_cost += monthly_cost;

                volume_lines.push(format!(
                    "Instance {}: {} volume of size {} GB costing ${:.2} per month",
                    instance.id, volume.volume_type, volume.size_gib, monthly_cost
                ));
            }

            stopped_count += 1;
            potential_savings += instance_volume_cost;
        }

        let mut recommendations = Vec::new();
        if stopped_count > 0 {
            recommendations.push(format!(
                "Found {} stopped instances that are still incurring EBS costs:",
                stopped_count
            ));
            recommendations.extend(volume_lines);
            recommendations.push(format!(
                "Total potential monthly savings: ${:.2}",
                potential_savings
            ));
            recommendations.push("Consider taking these actions:".to_string());
            recommendations
                .push("- Terminate instances that have been stopped for extended periods".to_string());
            recommendations
                .push("- Create snapshots of important volumes before termination".to_string());
            recommendations.push(
                "- Implement automated cleanup of stopped instances after defined period".to_string(),
            );
            recommendations
                .push("- Use automated snapshots to recreate volumes when needed".to_string());
        }

        Ok((potential_savings, recommendations))
    }

    /// Volumes in `available` state, attached to nothing
    fn analyze_unattached_volumes(&self, volumes: &[Volume]) -> (f64, Vec<String>) {
        let mut potential_savings = 0.0;
        let mut recommendations = Vec::new();

        for volume in volumes {
            if volume.state != VolumeState::Available {
                continue;
            }

            info!(
                id = %volume.id,
                volume_type = %volume.volume_type,
                size_gib = volume.size_gib,
                "found unattached volume"
            );

            if !self.pricing.is_region_priced(&self.region) {
                recommendations.push(format!(
                    "Unattached volume {} in region {} (pricing not available)",
                    volume.id, self.region
                ));
                continue;
            }

            let price = match self.pricing.volume_price(&volume.volume_type, &self.region) {
                Ok(price) => price,
                Err(e) => {
                    warn!("Failed to get price for volume {}: {}", volume.id, e);
                    continue;
                }
            };

            // Historical report formula: the GiB-month price is expanded by
            // hours x days even though it is already monthly, unlike the
            // stopped-instance path above. Downstream consumers key on these
            // figures, so the asymmetry is pinned by tests.
            // TODO: confirm the intended formula against actual billing data
            // and reconcile the two paths.
            let monthly_cost = price * volume.size_gib as f64 * 24.0 * 30.0;
            potential_savings += monthly_cost;

            recommendations.push(format!(
                "Unattached {} volume {} of size {} GB costing approximately ${:.2} per month",
                volume.volume_type, volume.id, volume.size_gib, monthly_cost
            ));
        }

        (potential_savings, recommendations)
    }
}

#[async_trait]
impl Analyzer for ComputeAnalyzer {
    fn name(&self) -> &'static str {
        "EC2 Cost Analyzer"
    }

    fn category(&self) -> Category {
        Category::Compute
    }

    async fn execute(&self) -> Result<AnalysisResult> {
        info!(region = %self.region, "starting EC2 analysis");

        let mut result = AnalysisResult::new(CloudProvider::Aws, Category::Compute, "EC2");

        // Base volume inventory; failure here is fatal to the whole call
        let volumes = self.inventory.list_volumes(VolumeFilter::default()).await?;

        match self.analyze_underutilized_instances().await {
            Ok((savings, recommendations)) => {
                result.potential_savings += savings;
                result.recommendations.extend(recommendations);
            }
            Err(e) => error!("Failed to analyze underutilized instances: {}", e),
        }

        match self.analyze_stopped_instances().await {
            Ok((savings, recommendations)) => {
                result.potential_savings += savings;
                result.recommendations.extend(recommendations);
            }
            Err(e) => error!("Failed to analyze stopped instances: {}", e),
        }

        let (volume_savings, volume_recommendations) = self.analyze_unattached_volumes(&volumes);
        result.potential_savings += volume_savings;
        result.recommendations.extend(volume_recommendations);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_table_hits_and_misses() {
        assert_eq!(ec2_upgrade_target("t2.micro"), Some("t3.micro"));
        assert_eq!(ec2_upgrade_target("m4.xlarge"), Some("m5.xlarge"));
        assert_eq!(ec2_upgrade_target("t3.micro"), None);
        assert_eq!(ec2_upgrade_target("g4dn.xlarge"), None);
    }

    #[test]
    fn upgrade_targets_are_distinct_from_sources() {
        for (from, to) in EC2_UPGRADE_PATHS {
            assert_ne!(from, to);
            // A target must not itself be a source, or savings would chain
            assert_eq!(ec2_upgrade_target(to), None);
        }
    }
}
