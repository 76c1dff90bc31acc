//! EC2-backed compute inventory

use crate::error::{CostctlError, Result};
use crate::inventory::{
    ComputeInstance, ComputeInventory, InstanceState, Volume, VolumeFilter, VolumeState,
};
use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::Client as Ec2Client;

/// Compute inventory over the EC2 API
pub struct Ec2Inventory {
    client: Ec2Client,
}

impl Ec2Inventory {
    pub fn new(client: Ec2Client) -> Self {
        Self { client }
    }
}

fn state_filter_value(state: &InstanceState) -> &str {
    match state {
        InstanceState::Running => "running",
        InstanceState::Stopped => "stopped",
        InstanceState::Other(name) => name.as_str(),
    }
}

fn parse_instance_state(name: &str) -> InstanceState {
    match name {
        "running" => InstanceState::Running,
        "stopped" => InstanceState::Stopped,
        other => InstanceState::Other(other.to_string()),
    }
}

fn parse_volume_state(name: &str) -> VolumeState {
    match name {
        "available" => VolumeState::Available,
        "in-use" => VolumeState::InUse,
        other => VolumeState::Other(other.to_string()),
    }
}

fn name_tag(tags: &[(String, String)]) -> Option<String> {
    tags.iter()
        .find(|(k, _)| k == "Name")
        .map(|(_, v)| v.clone())
}

#[async_trait]
impl ComputeInventory for Ec2Inventory {
    async fn list_instances(&self, state: Option<InstanceState>) -> Result<Vec<ComputeInstance>> {
        let mut request = self.client.describe_instances();
        if let Some(state) = &state {
            request = request.filters(
                Filter::builder()
                    .name("instance-state-name")
                    .values(state_filter_value(state))
                    .build(),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| CostctlError::Aws(format!("Failed to list EC2 instances: {}", e)))?;

        let mut instances = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                let Some(id) = instance.instance_id() else {
                    continue;
                };

                let tags: Vec<(String, String)> = instance
                    .tags()
                    .iter()
                    .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
                    .collect();

                instances.push(ComputeInstance {
                    id: id.to_string(),
                    instance_type: instance
                        .instance_type()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    state: instance
                        .state()
                        .and_then(|s| s.name())
                        .map(|n| parse_instance_state(n.as_str()))
                        .unwrap_or(InstanceState::Other("unknown".to_string())),
                    name: name_tag(&tags),
                    tags,
                });
            }
        }
        Ok(instances)
    }

    async fn list_volumes(&self, filter: VolumeFilter) -> Result<Vec<Volume>> {
        let mut request = self.client.describe_volumes();
        if let Some(instance_id) = &filter.attached_to {
            request = request.filters(
                Filter::builder()
                    .name("attachment.instance-id")
                    .values(instance_id)
                    .build(),
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| CostctlError::Aws(format!("Failed to list EBS volumes: {}", e)))?;

        let mut volumes = Vec::new();
        for volume in response.volumes() {
            let Some(id) = volume.volume_id() else {
                continue;
            };

            let tags: Vec<(String, String)> = volume
                .tags()
                .iter()
                .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
                .collect();

            volumes.push(Volume {
                id: id.to_string(),
                volume_type: volume
                    .volume_type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                size_gib: volume.size().unwrap_or(0) as i64,
                state: volume
                    .state()
                    .map(|s| parse_volume_state(s.as_str()))
                    .unwrap_or(VolumeState::Other("unknown".to_string())),
                attached_to: volume
                    .attachments()
                    .iter()
                    .find_map(|a| a.instance_id())
                    .map(|s| s.to_string()),
                name: name_tag(&tags),
            });
        }
        Ok(volumes)
    }
}
