//! AWS-backed collaborators
//!
//! SDK clients wrapped behind the inventory and metric traits so the
//! analyzers never touch AWS types directly.

pub mod cloudwatch;
pub mod credentials;
pub mod ec2;
pub mod rds;

pub use cloudwatch::CloudWatchMetrics;
pub use credentials::validate_credentials;
pub use ec2::Ec2Inventory;
pub use rds::RdsInventory;
