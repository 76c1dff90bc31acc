//! Analyzer trait and shared result model
//!
//! Each analyzer is a flat struct holding its collaborator handles and
//! implementing exactly three operations: `name`, `category`, `execute`.
//! A run produces one fresh `AnalysisResult`; nothing is shared between
//! analyzers and nothing is persisted between runs.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cloud service provider tag carried on every result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azure",
            CloudProvider::Gcp => "gcp",
        }
    }
}

impl std::fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of resources an analyzer covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Compute,
    Storage,
    Network,
    Database,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Compute => "compute",
            Category::Storage => "storage",
            Category::Network => "network",
            Category::Database => "database",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated output of a single analyzer run
///
/// `potential_savings` is always the sum of the dollar amounts attributable to
/// the recommendations in the same result. Advisory recommendations (no dollar
/// estimate) contribute zero; a non-positive savings delta is never reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub provider: CloudProvider,
    pub category: Category,
    pub resource_type: String,
    pub potential_savings: f64,
    pub recommendations: Vec<String>,
    pub details: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(provider: CloudProvider, category: Category, resource_type: &str) -> Self {
        Self {
            provider,
            category,
            resource_type: resource_type.to_string(),
            potential_savings: 0.0,
            recommendations: Vec::new(),
            details: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }
}

/// One self-contained cost-analysis unit for one resource category
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Human-readable analyzer name
    fn name(&self) -> &'static str;

    /// Category of resources this analyzer inspects
    fn category(&self) -> Category;

    /// Run the analysis and return the aggregated result
    async fn execute(&self) -> Result<AnalysisResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_result_is_empty() {
        let result = AnalysisResult::new(CloudProvider::Aws, Category::Compute, "EC2");
        assert_eq!(result.potential_savings, 0.0);
        assert!(result.recommendations.is_empty());
        assert!(result.details.is_empty());
        assert_eq!(result.provider.as_str(), "aws");
        assert_eq!(result.category.as_str(), "compute");
    }

    #[test]
    fn result_serializes_with_lowercase_tags() {
        let result = AnalysisResult::new(CloudProvider::Aws, Category::Database, "RDS");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["provider"], "aws");
        assert_eq!(json["category"], "database");
        assert_eq!(json["resource_type"], "RDS");
    }
}
