//! AWS Authentication
//!
//! Credentials and the default region come from the standard AWS provider
//! chain (environment, shared config/credentials profiles with assume-role
//! and SSO, web identity, ECS and IMDS). The account id comes from STS
//! when it is not configured.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;

use super::error::AwsError;

/// Where to look for credentials and which region to prefer
#[derive(Debug, Clone, Default)]
pub struct SdkConfigOptions<'a> {
    pub profile: Option<&'a str>,
    pub region: Option<&'a str>,
    /// Endpoint override applied to every SDK client (local stacks)
    pub endpoint: Option<&'a str>,
}

/// Load the shared SDK configuration
pub async fn load_sdk_config(options: &SdkConfigOptions<'_>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = options.profile {
        tracing::debug!("Using AWS profile {}", profile);
        loader = loader.profile_name(profile);
    }
    if let Some(region) = options.region {
        loader = loader.region(Region::new(region.to_string()));
    }
    if let Some(endpoint) = options.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}

/// Credentials provider of a loaded configuration
pub fn credentials_provider(config: &SdkConfig) -> Result<SharedCredentialsProvider, AwsError> {
    config
        .credentials_provider()
        .ok_or_else(|| AwsError::Credentials("no credentials provider configured".to_string()))
}

/// Account the resolved credentials belong to, from `GetCallerIdentity`
pub async fn caller_account_id(config: &SdkConfig) -> Result<String, AwsError> {
    let client = aws_sdk_sts::Client::new(config);
    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| AwsError::Identity(aws_sdk_sts::error::DisplayErrorContext(e).to_string()))?;

    let account_id = identity
        .account()
        .ok_or_else(|| AwsError::Identity("response carries no account".to_string()))?;
    tracing::debug!("Caller account is {}", account_id);
    Ok(account_id.to_string())
}

/// Validate an AWS account ID (exactly 12 digits)
pub fn validate_account_id(account_id: &str) -> bool {
    account_id.len() == 12 && account_id.chars().all(|c| c.is_ascii_digit())
}

/// Validate a region name such as `us-east-1` or `cn-north-1`
pub fn validate_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return false;
    }
    region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && parts
            .last()
            .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
}

/// Partition a region belongs to
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else {
        "aws"
    }
}

/// DNS suffix for service endpoints in a partition
pub fn dns_suffix(partition: &str) -> &'static str {
    match partition {
        "aws-cn" => "amazonaws.com.cn",
        "aws-iso" => "c2s.ic.gov",
        "aws-iso-b" => "sc2s.sgov.gov",
        _ => "amazonaws.com",
    }
}
