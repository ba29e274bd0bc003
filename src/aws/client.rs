//! AWS Client
//!
//! Main client for the API Gateway control plane, combining credentials,
//! request signing and the HTTP layer.

use aws_credential_types::provider::SharedCredentialsProvider;
use serde_json::Value;
use url::Url;

use super::arn::Arn;
use super::auth;
use super::error::AwsError;
use super::http::{AwsHttpClient, Signer};

/// Signing name of the API Gateway control plane
pub const APIGATEWAY_SERVICE: &str = "apigateway";

/// Service name used in execution ARNs
pub const EXECUTE_API_SERVICE: &str = "execute-api";

/// Settings a client is built from, already resolved by [`crate::config`]
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub credentials: SharedCredentialsProvider,
    pub region: String,
    /// Derived from the region when unset
    pub partition: Option<String>,
    pub account_id: String,
    /// Override of the service endpoint (local stacks, tests)
    pub endpoint: Option<String>,
}

/// Main AWS client
#[derive(Clone)]
pub struct AwsClient {
    pub http: AwsHttpClient,
    pub region: String,
    pub partition: String,
    pub account_id: String,
    endpoint: Url,
    signer: Signer,
}

impl AwsClient {
    /// Create a new client
    pub fn new(settings: ClientSettings) -> Result<Self, AwsError> {
        if !auth::validate_region(&settings.region) {
            return Err(AwsError::Config(format!("invalid region: {}", settings.region)));
        }
        if !auth::validate_account_id(&settings.account_id) {
            return Err(AwsError::Config(format!(
                "invalid account ID: {}",
                settings.account_id
            )));
        }

        let partition = settings
            .partition
            .unwrap_or_else(|| auth::partition_for_region(&settings.region).to_string());

        let endpoint = match settings.endpoint {
            Some(endpoint) => endpoint,
            None => format!(
                "https://{}.{}.{}",
                APIGATEWAY_SERVICE,
                settings.region,
                auth::dns_suffix(&partition)
            ),
        };
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| AwsError::Config(format!("invalid endpoint {}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(AwsError::Config(format!("invalid endpoint: {}", endpoint)));
        }

        let signer = Signer {
            credentials: settings.credentials,
            region: settings.region.clone(),
            service: APIGATEWAY_SERVICE.to_string(),
        };

        tracing::debug!("API Gateway endpoint: {}", endpoint);

        Ok(Self {
            http: AwsHttpClient::new()?,
            region: settings.region,
            partition,
            account_id: settings.account_id,
            endpoint,
            signer,
        })
    }

    /// Make a GET request
    pub async fn get(&self, url: &Url) -> Result<Value, AwsError> {
        self.http.get(url, &self.signer).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &Url, body: &Value) -> Result<Value, AwsError> {
        self.http.post(url, &self.signer, body).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &Url, body: &Value) -> Result<Value, AwsError> {
        self.http.patch(url, &self.signer, body).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &Url, body: Vec<u8>) -> Result<Value, AwsError> {
        self.http.put(url, &self.signer, body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &Url) -> Result<Value, AwsError> {
        self.http.delete(url, &self.signer).await
    }

    // =========================================================================
    // API Gateway URL helpers
    // =========================================================================

    /// Build an API Gateway URL from raw path segments and query pairs
    /// Segments are percent-encoded, so identifiers cannot alter the path
    pub fn apigateway_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// URL of the REST API collection
    pub fn rest_apis_url(&self) -> Url {
        self.apigateway_url(&["restapis"], &[])
    }

    /// URL of one REST API
    pub fn rest_api_url(&self, rest_api_id: &str) -> Url {
        self.apigateway_url(&["restapis", rest_api_id], &[])
    }

    /// URL of the path resources of a REST API
    pub fn resources_url(&self, rest_api_id: &str, query: &[(&str, &str)]) -> Url {
        self.apigateway_url(&["restapis", rest_api_id, "resources"], query)
    }

    /// ARN used to reference a deployed API in permission policies
    pub fn execution_arn(&self, rest_api_id: &str) -> Arn {
        Arn {
            partition: self.partition.clone(),
            service: EXECUTE_API_SERVICE.to_string(),
            region: self.region.clone(),
            account_id: self.account_id.clone(),
            resource: rest_api_id.to_string(),
        }
    }
}
