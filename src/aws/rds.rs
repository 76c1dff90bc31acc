//! RDS-backed database inventory

use crate::error::{CostctlError, Result};
use crate::inventory::{
    DatabaseInstance, DatabaseInventory, DatabaseSnapshot, ReservationRecord, ReservationState,
};
use async_trait::async_trait;
use aws_sdk_rds::Client as RdsClient;

/// Managed-database inventory over the RDS API
pub struct RdsInventory {
    client: RdsClient,
}

impl RdsInventory {
    pub fn new(client: RdsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DatabaseInventory for RdsInventory {
    async fn list_instances(&self) -> Result<Vec<DatabaseInstance>> {
        let response = self
            .client
            .describe_db_instances()
            .send()
            .await
            .map_err(|e| CostctlError::Aws(format!("Failed to list DB instances: {}", e)))?;

        let mut instances = Vec::new();
        for instance in response.db_instances() {
            let Some(id) = instance.db_instance_identifier() else {
                continue;
            };

            instances.push(DatabaseInstance {
                id: id.to_string(),
                instance_class: instance
                    .db_instance_class()
                    .unwrap_or("unknown")
                    .to_string(),
                engine: instance.engine().unwrap_or("unknown").to_string(),
                engine_version: instance.engine_version().unwrap_or("unknown").to_string(),
                allocated_storage_gib: instance.allocated_storage().unwrap_or(0) as i64,
                multi_az: instance.multi_az().unwrap_or(false),
                replica_source: instance
                    .read_replica_source_db_instance_identifier()
                    .map(|s| s.to_string()),
                backup_retention_days: instance.backup_retention_period().unwrap_or(0),
            });
        }
        Ok(instances)
    }

    async fn list_snapshots(&self) -> Result<Vec<DatabaseSnapshot>> {
        let response = self
            .client
            .describe_db_snapshots()
            .send()
            .await
            .map_err(|e| CostctlError::Aws(format!("Failed to list DB snapshots: {}", e)))?;

        let snapshots = response
            .db_snapshots()
            .iter()
            .filter_map(|s| {
                Some(DatabaseSnapshot {
                    id: s.db_snapshot_identifier()?.to_string(),
                    instance_id: s.db_instance_identifier()?.to_string(),
                })
            })
            .collect();
        Ok(snapshots)
    }

    async fn list_reserved_capacity(&self) -> Result<Vec<ReservationRecord>> {
        let response = self
            .client
            .describe_reserved_db_instances()
            .send()
            .await
            .map_err(|e| {
                CostctlError::Aws(format!("Failed to list reserved DB instances: {}", e))
            })?;

        let reservations = response
            .reserved_db_instances()
            .iter()
            .filter_map(|r| {
                Some(ReservationRecord {
                    id: r.reserved_db_instance_id()?.to_string(),
                    state: match r.state() {
                        Some("active") => ReservationState::Active,
                        Some(other) => ReservationState::Other(other.to_string()),
                        None => ReservationState::Other("unknown".to_string()),
                    },
                })
            })
            .collect();
        Ok(reservations)
    }
}
