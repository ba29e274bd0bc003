//! Desired and actual state of a REST API

use serde::{Deserialize, Deserializer, Serialize};

/// Largest accepted minimum compression size, in bytes
pub const MAX_MINIMUM_COMPRESSION_SIZE: u32 = 10_485_760;

/// Legacy state documents use -1 to mean "compression disabled"
const COMPRESSION_DISABLED_SENTINEL: i64 = -1;

pub const ENDPOINT_TYPE_EDGE: &str = "EDGE";
pub const ENDPOINT_TYPE_REGIONAL: &str = "REGIONAL";

/// Endpoint types a configuration may declare
pub const ENDPOINT_TYPES: &[&str] = &[ENDPOINT_TYPE_EDGE, ENDPOINT_TYPE_REGIONAL];

/// Where the API is served. Exactly one type is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfiguration {
    #[serde(default)]
    pub types: Vec<String>,
}

impl EndpointConfiguration {
    pub fn new(endpoint_type: &str) -> Self {
        Self {
            types: vec![endpoint_type.to_string()],
        }
    }

    /// The single declared endpoint type
    pub fn endpoint_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }
}

/// Fields the caller declares
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// IAM policy document, compared structurally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    /// Compared as a set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binary_media_types: Vec<String>,

    /// `None` disables compression
    #[serde(
        default,
        deserialize_with = "deserialize_compression_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_compression_size: Option<u32>,

    /// OpenAPI definition imported in overwrite mode; never read back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_configuration: Option<EndpointConfiguration>,
}

impl RestApiConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Description, treating an empty string as unset
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// Policy, treating an empty string as unset
    pub fn policy(&self) -> Option<&str> {
        self.policy.as_deref().filter(|p| !p.is_empty())
    }

    /// Declared endpoint type, if any
    pub fn endpoint_type(&self) -> Option<&str> {
        self.endpoint_configuration
            .as_ref()
            .and_then(EndpointConfiguration::endpoint_type)
    }
}

/// Recorded state of a REST API that exists remotely
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestApiState {
    /// Identifier assigned by the service
    pub id: String,

    #[serde(flatten)]
    pub config: RestApiConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_resource_id: Option<String>,

    /// RFC 3339, UTC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,

    /// Derived locally from partition, region, account and id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_arn: Option<String>,
}

impl RestApiState {
    /// State for a freshly created REST API, before read-back
    pub fn new(id: impl Into<String>, config: RestApiConfig) -> Self {
        Self {
            id: id.into(),
            config,
            ..Default::default()
        }
    }
}

fn deserialize_compression_size<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<i64>::deserialize(deserializer)? {
        None | Some(COMPRESSION_DISABLED_SENTINEL) => Ok(None),
        Some(size) => u32::try_from(size).map(Some).map_err(|_| {
            D::Error::custom(format!(
                "minimum_compression_size must be between -1 and {}, got {}",
                MAX_MINIMUM_COMPRESSION_SIZE, size
            ))
        }),
    }
}
