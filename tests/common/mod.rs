//! Shared test doubles and builders for analyzer integration tests
#![allow(dead_code)]

use costctl::error::{CostctlError, Result};
use costctl::inventory::{
    ComputeInstance, DatabaseInstance, InstanceState, MetricSeries, Volume, VolumeState,
};
use costctl::pricing::PricingSource;
use std::collections::HashMap;

/// Fixed-table pricing stub; missing entries behave like unsupported lookups
#[derive(Default)]
pub struct StaticPricing {
    pub region_priced: bool,
    pub volume_prices: HashMap<String, f64>,
    pub upgrade_savings: HashMap<(String, String), f64>,
}

impl StaticPricing {
    pub fn priced() -> Self {
        Self {
            region_priced: true,
            ..Default::default()
        }
    }

    pub fn unpriced() -> Self {
        Self::default()
    }

    pub fn with_volume_price(mut self, volume_type: &str, price: f64) -> Self {
        self.volume_prices.insert(volume_type.to_string(), price);
        self
    }

    pub fn with_upgrade_savings(mut self, current: &str, target: &str, savings: f64) -> Self {
        self.upgrade_savings
            .insert((current.to_string(), target.to_string()), savings);
        self
    }
}

impl PricingSource for StaticPricing {
    fn is_region_priced(&self, _region: &str) -> bool {
        self.region_priced
    }

    fn volume_price(&self, volume_type: &str, _region: &str) -> Result<f64> {
        self.volume_prices.get(volume_type).copied().ok_or_else(|| {
            CostctlError::Pricing(format!("no pricing data for volume type {}", volume_type))
        })
    }

    fn upgrade_savings(&self, current: &str, target: &str, _region: &str) -> Result<f64> {
        self.upgrade_savings
            .get(&(current.to_string(), target.to_string()))
            .copied()
            .ok_or_else(|| {
                CostctlError::Pricing(format!("no pricing data for instance type {}", current))
            })
    }
}

pub fn instance(id: &str, instance_type: &str, state: InstanceState) -> ComputeInstance {
    ComputeInstance {
        id: id.to_string(),
        instance_type: instance_type.to_string(),
        state,
        name: None,
        tags: vec![],
    }
}

pub fn volume(
    id: &str,
    volume_type: &str,
    size_gib: i64,
    state: VolumeState,
    attached_to: Option<&str>,
) -> Volume {
    Volume {
        id: id.to_string(),
        volume_type: volume_type.to_string(),
        size_gib,
        state,
        attached_to: attached_to.map(|s| s.to_string()),
        name: None,
    }
}

pub fn db_instance(id: &str, instance_class: &str, engine: &str) -> DatabaseInstance {
    DatabaseInstance {
        id: id.to_string(),
        instance_class: instance_class.to_string(),
        engine: engine.to_string(),
        engine_version: "1.0".to_string(),
        allocated_storage_gib: 50,
        multi_az: false,
        replica_source: None,
        backup_retention_days: 7,
    }
}

pub fn series(id: &str, value: f64) -> MetricSeries {
    MetricSeries {
        id: id.to_string(),
        values: vec![value],
    }
}

/// Series battery that trips no heuristic
pub fn quiet_series() -> Vec<MetricSeries> {
    vec![
        series("cpu", 60.0),
        series("connections", 10.0),
        series("read_iops", 10.0),
        series("write_iops", 10.0),
        series("read_latency", 0.001),
        series("write_latency", 0.001),
        series("swap_usage", 0.0),
        series("network_receive", 1000.0),
        series("network_transmit", 1000.0),
        series("burst_balance", 100.0),
        series("disk_queue_depth", 0.1),
    ]
}
