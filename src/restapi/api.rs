//! Wire shapes of the API Gateway REST API calls

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{EndpointConfiguration, RestApiConfig};

/// Page size used when listing path resources
pub const RESOURCES_PAGE_LIMIT: &str = "500";

/// Path of the implicit root resource
pub const ROOT_PATH: &str = "/";

/// Body of `POST /restapis`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestApiInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_configuration: Option<EndpointConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub binary_media_types: Vec<String>,
    /// Omitted entirely when compression is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_compression_size: Option<u32>,
}

impl From<&RestApiConfig> for CreateRestApiInput {
    fn from(config: &RestApiConfig) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description().map(String::from),
            endpoint_configuration: config
                .endpoint_configuration
                .clone()
                .filter(|c| !c.types.is_empty()),
            policy: config.policy().map(String::from),
            binary_media_types: config.binary_media_types.clone(),
            minimum_compression_size: config.minimum_compression_size,
        }
    }
}

/// A REST API as returned by the service
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApi {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Epoch seconds, or an RFC 3339 string from some emulators
    #[serde(default)]
    pub created_date: Option<Value>,
    #[serde(default)]
    pub binary_media_types: Option<Vec<String>>,
    #[serde(default)]
    pub minimum_compression_size: Option<u32>,
    /// Escaped one level deeper than the submitted document
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub endpoint_configuration: Option<EndpointConfiguration>,
}

/// A path resource of a REST API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResource {
    pub id: String,
    #[serde(default)]
    pub path: String,
}

/// One page of `GET /restapis/{id}/resources`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesPage {
    #[serde(default, alias = "items")]
    pub item: Vec<PathResource>,
    #[serde(default)]
    pub position: Option<String>,
}

impl ResourcesPage {
    pub fn root(&self) -> Option<&PathResource> {
        self.item.iter().find(|r| r.path == ROOT_PATH)
    }
}

/// Format a service timestamp as RFC 3339 (UTC, whole seconds)
pub fn format_created_date(value: &Value) -> Option<String> {
    let time: DateTime<Utc> = match value {
        Value::Number(n) => {
            let secs = n.as_f64()?;
            DateTime::from_timestamp(secs.trunc() as i64, 0)?
        },
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc),
        _ => return None,
    };
    Some(time.to_rfc3339_opts(SecondsFormat::Secs, true))
}
