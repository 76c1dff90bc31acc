//! AWS credential validation
//!
//! A cheap STS call before any analysis so missing or expired credentials
//! fail up front with a useful message instead of mid-run.

use crate::error::{CostctlError, Result};
use aws_config::SdkConfig;
use aws_sdk_sts::Client as StsClient;
use tracing::info;

/// Verify the resolved credentials can make authenticated calls
pub async fn validate_credentials(config: &SdkConfig) -> Result<()> {
    let client = StsClient::new(config);
    let identity = client.get_caller_identity().send().await.map_err(|e| {
        CostctlError::Aws(format!("AWS credentials validation failed: {}", e))
    })?;

    info!(
        account = identity.account().unwrap_or("unknown"),
        arn = identity.arn().unwrap_or("unknown"),
        "AWS credentials validated"
    );
    Ok(())
}
