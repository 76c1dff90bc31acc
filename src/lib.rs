//! costctl library
//!
//! Cost-saving analysis over a cloud account's compute and storage resources:
//! inventory collaborators feed rule-based analyzers that emit ranked
//! recommendations with dollar estimates.

pub mod analyzer;
pub mod aws;
pub mod compute;
pub mod config;
pub mod database;
pub mod error;
pub mod inventory;
pub mod pricing;
pub mod registry;
pub mod report;

// Re-export commonly used types
pub use analyzer::{AnalysisResult, Analyzer, Category, CloudProvider};
pub use error::{CostctlError, Result};
pub use report::Report;
