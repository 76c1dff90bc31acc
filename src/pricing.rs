//! Local pricing catalog lookups
//!
//! Prices come from JSON catalog files shipped alongside the binary (see
//! `data/`). Parsed catalog pages are cached per (region, service) with a
//! 24-hour freshness window behind an `RwLock`: lookups take the read lock,
//! a stale or missing page takes the write lock and re-reads the file.
//!
//! One `PricingService` is constructed at startup and handed to every
//! analyzer as an `Arc` - there is no process-wide singleton.

use crate::error::{CostctlError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// On-demand hours billed per month when converting hourly deltas
const HOURS_PER_MONTH: f64 = 720.0;

/// Catalog page freshness window
const CACHE_TTL_HOURS: i64 = 24;

/// Closed set of catalog services the lookup layer understands
///
/// Each variant maps to one catalog file and one price dimension; an
/// unsupported service cannot be expressed, and an unknown region or resource
/// type inside a catalog is an explicit runtime error rather than a silent
/// empty match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CatalogService {
    Ec2Instances,
    EbsVolumes,
    RdsInstances,
}

impl CatalogService {
    fn file_name(&self) -> &'static str {
        match self {
            CatalogService::Ec2Instances => "ec2_pricing.json",
            CatalogService::EbsVolumes => "ebs_pricing.json",
            CatalogService::RdsInstances => "rds_pricing.json",
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstancePrice {
    #[serde(rename = "onDemandPrice")]
    on_demand_price: f64,
}

#[derive(Debug, Deserialize)]
struct VolumePrice {
    #[serde(rename = "pricePerGBMonth")]
    price_per_gib_month: f64,
}

/// One parsed catalog page: resource type -> unit price
struct CachedPage {
    loaded_at: DateTime<Utc>,
    prices: HashMap<String, f64>,
}

impl CachedPage {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.loaded_at < Duration::hours(CACHE_TTL_HOURS)
    }
}

/// Pricing lookup contract consumed by the analyzers
pub trait PricingSource: Send + Sync {
    /// Whether any catalog carries prices for this region
    fn is_region_priced(&self, region: &str) -> bool;

    /// GiB-month price for a volume type in a region
    fn volume_price(&self, volume_type: &str, region: &str) -> Result<f64>;

    /// Monthly savings of switching from one instance type to another
    ///
    /// Tries the compute catalog first and falls back to the database
    /// catalog, mirroring how upgrade paths span both resource families.
    /// The delta may be non-positive; callers suppress those.
    fn upgrade_savings(&self, current: &str, target: &str, region: &str) -> Result<f64>;
}

/// File-backed pricing catalogs with a freshness-bounded page cache
pub struct PricingService {
    data_dir: PathBuf,
    cache: RwLock<HashMap<(CatalogService, String), CachedPage>>,
}

impl PricingService {
    /// Create a pricing service reading catalogs from `data_dir`
    ///
    /// Fails fast if the directory is missing so a misconfigured deployment
    /// surfaces at startup rather than as per-lookup errors.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if !data_dir.is_dir() {
            return Err(CostctlError::Pricing(format!(
                "pricing data directory not found: {}",
                data_dir.display()
            )));
        }
        Ok(Self {
            data_dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Fetch a catalog page, serving from cache while fresh
    fn page_prices(&self, service: CatalogService, region: &str) -> Result<HashMap<String, f64>> {
        let key = (service, region.to_string());
        let now = Utc::now();

        {
            let cache = self
                .cache
                .read()
                .map_err(|_| CostctlError::Pricing("pricing cache lock poisoned".to_string()))?;
            if let Some(page) = cache.get(&key) {
                if page.is_fresh(now) {
                    return Ok(page.prices.clone());
                }
            }
        }

        let prices = load_region_page(&self.data_dir, service, region)?;
        debug!(
            region,
            catalog = service.file_name(),
            entries = prices.len(),
            "loaded pricing catalog page"
        );

        let mut cache = self
            .cache
            .write()
            .map_err(|_| CostctlError::Pricing("pricing cache lock poisoned".to_string()))?;
        cache.insert(
            key,
            CachedPage {
                loaded_at: now,
                prices: prices.clone(),
            },
        );
        Ok(prices)
    }

    fn unit_price(&self, service: CatalogService, resource_type: &str, region: &str) -> Result<f64> {
        let prices = self.page_prices(service, region)?;
        prices.get(resource_type).copied().ok_or_else(|| {
            CostctlError::Pricing(format!(
                "no pricing data for {} in region {}",
                resource_type, region
            ))
        })
    }
}

impl PricingSource for PricingService {
    fn is_region_priced(&self, region: &str) -> bool {
        self.page_prices(CatalogService::Ec2Instances, region).is_ok()
            || self.page_prices(CatalogService::RdsInstances, region).is_ok()
    }

    fn volume_price(&self, volume_type: &str, region: &str) -> Result<f64> {
        self.unit_price(CatalogService::EbsVolumes, volume_type, region)
    }

    fn upgrade_savings(&self, current: &str, target: &str, region: &str) -> Result<f64> {
        let hourly_delta = match (
            self.unit_price(CatalogService::Ec2Instances, current, region),
            self.unit_price(CatalogService::Ec2Instances, target, region),
        ) {
            (Ok(cur), Ok(tgt)) => cur - tgt,
            _ => {
                let cur = self.unit_price(CatalogService::RdsInstances, current, region)?;
                let tgt = self.unit_price(CatalogService::RdsInstances, target, region)?;
                cur - tgt
            }
        };
        Ok(hourly_delta * HOURS_PER_MONTH)
    }
}

/// Read one catalog file and extract the page for `region`
fn load_region_page(
    data_dir: &Path,
    service: CatalogService,
    region: &str,
) -> Result<HashMap<String, f64>> {
    let path = data_dir.join(service.file_name());
    let raw = std::fs::read_to_string(&path).map_err(|e| {
        CostctlError::Pricing(format!("failed to read {}: {}", path.display(), e))
    })?;

    let page = match service {
        CatalogService::Ec2Instances | CatalogService::RdsInstances => {
            let catalog: HashMap<String, HashMap<String, InstancePrice>> =
                serde_json::from_str(&raw).map_err(|e| {
                    CostctlError::Pricing(format!("failed to parse {}: {}", path.display(), e))
                })?;
            catalog.get(region).map(|types| {
                types
                    .iter()
                    .map(|(t, p)| (t.clone(), p.on_demand_price))
                    .collect()
            })
        }
        CatalogService::EbsVolumes => {
            let catalog: HashMap<String, HashMap<String, VolumePrice>> =
                serde_json::from_str(&raw).map_err(|e| {
                    CostctlError::Pricing(format!("failed to parse {}: {}", path.display(), e))
                })?;
            catalog.get(region).map(|types| {
                types
                    .iter()
                    .map(|(t, p)| (t.clone(), p.price_per_gib_month))
                    .collect()
            })
        }
    };

    page.ok_or_else(|| {
        CostctlError::Pricing(format!(
            "region {} not present in {}",
            region,
            service.file_name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_catalogs(dir: &Path) {
        std::fs::write(
            dir.join("ec2_pricing.json"),
            r#"{"us-east-1": {"t2.micro": {"onDemandPrice": 0.0116}, "t3.micro": {"onDemandPrice": 0.0104}}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("ebs_pricing.json"),
            r#"{"us-east-1": {"gp2": {"pricePerGBMonth": 0.10}, "gp3": {"pricePerGBMonth": 0.08}}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("rds_pricing.json"),
            r#"{"us-east-1": {"db.t3.micro": {"onDemandPrice": 0.017}, "db.t4g.micro": {"onDemandPrice": 0.016}}}"#,
        )
        .unwrap();
    }

    #[test]
    fn missing_data_dir_fails_at_construction() {
        let result = PricingService::new("/nonexistent/pricing/data");
        assert!(result.is_err());
    }

    #[test]
    fn volume_price_lookup() {
        let dir = TempDir::new().unwrap();
        write_catalogs(dir.path());
        let pricing = PricingService::new(dir.path()).unwrap();

        let price = pricing.volume_price("gp2", "us-east-1").unwrap();
        assert_eq!(price, 0.10);
        assert!(pricing.volume_price("io1", "us-east-1").is_err());
        assert!(pricing.volume_price("gp2", "mars-central-1").is_err());
    }

    #[test]
    fn upgrade_savings_uses_720_hours() {
        let dir = TempDir::new().unwrap();
        write_catalogs(dir.path());
        let pricing = PricingService::new(dir.path()).unwrap();

        let savings = pricing
            .upgrade_savings("t2.micro", "t3.micro", "us-east-1")
            .unwrap();
        let expected = (0.0116 - 0.0104) * 720.0;
        assert!((savings - expected).abs() < 1e-9);
    }

    #[test]
    fn upgrade_savings_falls_back_to_database_catalog() {
        let dir = TempDir::new().unwrap();
        write_catalogs(dir.path());
        let pricing = PricingService::new(dir.path()).unwrap();

        let savings = pricing
            .upgrade_savings("db.t3.micro", "db.t4g.micro", "us-east-1")
            .unwrap();
        let expected = (0.017 - 0.016) * 720.0;
        assert!((savings - expected).abs() < 1e-9);
    }

    #[test]
    fn region_priced_checks_both_catalogs() {
        let dir = TempDir::new().unwrap();
        write_catalogs(dir.path());
        let pricing = PricingService::new(dir.path()).unwrap();

        assert!(pricing.is_region_priced("us-east-1"));
        assert!(!pricing.is_region_priced("eu-north-1"));
    }

    #[test]
    fn cache_serves_page_after_file_removal() {
        let dir = TempDir::new().unwrap();
        write_catalogs(dir.path());
        let pricing = PricingService::new(dir.path()).unwrap();

        assert_eq!(pricing.volume_price("gp3", "us-east-1").unwrap(), 0.08);

        // Page is cached; removing the file must not affect fresh lookups
        std::fs::remove_file(dir.path().join("ebs_pricing.json")).unwrap();
        assert_eq!(pricing.volume_price("gp3", "us-east-1").unwrap(), 0.08);
    }
}
