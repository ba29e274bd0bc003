//! Create/Read/Update/Delete for a REST API
//!
//! Each verb runs its remote calls strictly in sequence. Only delete
//! retries; every other failure goes straight back to the caller.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::api::{self, CreateRestApiInput, ResourcesPage, RestApi, RESOURCES_PAGE_LIMIT};
use super::error::{Error, Result};
use super::model::{RestApiConfig, RestApiState};
use super::patch;
use super::policy;
use super::retry::{self, RetryError, RetryFailure, RetryPolicy};
use crate::aws::client::AwsClient;
use crate::aws::AwsError;

/// Put mode that replaces the whole API definition
const PUT_MODE_OVERWRITE: &str = "overwrite";

/// Reconciles one REST API resource against API Gateway
#[derive(Clone)]
pub struct RestApiHandler {
    client: AwsClient,
    delete_retry: RetryPolicy,
}

impl RestApiHandler {
    pub fn new(client: AwsClient) -> Self {
        Self {
            client,
            delete_retry: RetryPolicy::default(),
        }
    }

    /// Override the delete retry policy
    pub fn with_delete_retry(mut self, policy: RetryPolicy) -> Self {
        self.delete_retry = policy;
        self
    }

    pub fn client(&self) -> &AwsClient {
        &self.client
    }

    /// Create the REST API, import its definition if one is given, then
    /// read everything back
    ///
    /// Once the create call succeeds the REST API exists, so every later
    /// failure carries its id: [`Error::Specification`] for the definition
    /// import, [`Error::IncompleteCreate`] for root discovery and read-back.
    pub async fn create(&self, config: &RestApiConfig) -> Result<RestApiState> {
        config.validate()?;
        tracing::debug!("Creating API Gateway {}", config.name);

        let input = serde_json::to_value(CreateRestApiInput::from(config))?;
        let response = self
            .client
            .post(&self.client.rest_apis_url(), &input)
            .await
            .map_err(Error::Create)?;

        let created: RestApi = decode(response)?;
        if created.id.is_empty() {
            return Err(Error::UnexpectedResponse(
                "create response carries no REST API id".to_string(),
            ));
        }
        tracing::info!("Created API Gateway {} ({})", config.name, created.id);

        let state = RestApiState::new(created.id, config.clone());

        if let Some(body) = &config.body {
            tracing::debug!("Importing OpenAPI definition into API Gateway {}", state.id);
            self.put_definition(&state.id, body)
                .await
                .map_err(|source| Error::Specification {
                    action: "creating",
                    rest_api_id: state.id.clone(),
                    source,
                })?;
        }

        let rest_api_id = state.id.clone();
        self.complete_create(state)
            .await
            .map_err(|source| Error::IncompleteCreate {
                rest_api_id,
                source: Box::new(source),
            })
    }

    async fn complete_create(&self, mut state: RestApiState) -> Result<RestApiState> {
        self.refresh_resources(&mut state).await?;

        self.read(&state).await?.ok_or_else(|| {
            Error::UnexpectedResponse(format!(
                "API Gateway {} not found right after creation",
                state.id
            ))
        })
    }

    /// Find the root path resource and record its id
    pub async fn refresh_resources(&self, state: &mut RestApiState) -> Result<()> {
        let rest_api_id = require_id(state)?.to_string();
        let mut position: Option<String> = None;

        loop {
            let mut query = vec![("limit", RESOURCES_PAGE_LIMIT)];
            if let Some(position) = position.as_deref() {
                query.push(("position", position));
            }

            let url = self.client.resources_url(&rest_api_id, &query);
            let page: ResourcesPage = decode(self.client.get(&url).await?)?;

            if let Some(root) = page.root() {
                tracing::debug!("Root resource of {} is {}", rest_api_id, root.id);
                state.root_resource_id = Some(root.id.clone());
                return Ok(());
            }

            match page.position.filter(|p| !p.is_empty()) {
                Some(next) if page.item.is_empty() => {
                    tracing::warn!("Empty resources page with position {}, stopping", next);
                    return Ok(());
                },
                Some(next) => position = Some(next),
                None => return Ok(()),
            }
        }
    }

    /// Re-read authoritative state
    ///
    /// `Ok(None)` means the REST API no longer exists and the caller should
    /// drop its record. Fields the service never returns (`body`,
    /// `root_resource_id`) are carried over from `prior`.
    pub async fn read(&self, prior: &RestApiState) -> Result<Option<RestApiState>> {
        let rest_api_id = require_id(prior)?;
        tracing::debug!("Reading API Gateway {}", rest_api_id);

        let response = match self.client.get(&self.client.rest_api_url(rest_api_id)).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                tracing::warn!("API Gateway ({}) not found, removing from state", rest_api_id);
                return Ok(None);
            },
            Err(err) => return Err(err.into()),
        };

        let api: RestApi = decode(response)?;
        self.state_from_api(prior, api).map(Some)
    }

    fn state_from_api(&self, prior: &RestApiState, api: RestApi) -> Result<RestApiState> {
        let policy = policy::unescape_policy(api.policy.as_deref().unwrap_or_default())
            .map_err(Error::PolicyUnescape)?;

        let created_date = api.created_date.as_ref().and_then(|v| {
            let formatted = api::format_created_date(v);
            if formatted.is_none() {
                tracing::debug!("Unrecognized createdDate {}", v);
            }
            formatted
        });

        let config = RestApiConfig {
            name: api.name,
            description: api.description.filter(|d| !d.is_empty()),
            policy: Some(policy).filter(|p| !p.is_empty()),
            binary_media_types: api.binary_media_types.unwrap_or_default(),
            minimum_compression_size: api.minimum_compression_size,
            body: prior.config.body.clone(),
            endpoint_configuration: api.endpoint_configuration,
        };

        Ok(RestApiState {
            id: prior.id.clone(),
            config,
            root_resource_id: prior.root_resource_id.clone(),
            created_date,
            execution_arn: Some(self.client.execution_arn(&prior.id).to_string()),
        })
    }

    /// Apply the difference between `prior` and `config`, then read back
    ///
    /// A changed definition document is imported first. The patch call is
    /// sent even when there are no operations.
    pub async fn update(&self, prior: &RestApiState, config: &RestApiConfig) -> Result<RestApiState> {
        config.validate()?;
        let rest_api_id = require_id(prior)?;
        tracing::debug!("Updating API Gateway {}", rest_api_id);

        if prior.config.body != config.body {
            if let Some(body) = &config.body {
                tracing::debug!("Reimporting OpenAPI definition into API Gateway {}", rest_api_id);
                self.put_definition(rest_api_id, body)
                    .await
                    .map_err(|source| Error::Specification {
                        action: "updating",
                        rest_api_id: rest_api_id.to_string(),
                        source,
                    })?;
            }
        }

        let operations = patch::update_operations(&prior.config, config);
        tracing::debug!("Sending {} patch operations to {}", operations.len(), rest_api_id);

        let body = json!({ "patchOperations": operations });
        self.client
            .patch(&self.client.rest_api_url(rest_api_id), &body)
            .await?;
        tracing::info!("Updated API Gateway {}", rest_api_id);

        let next = RestApiState {
            config: config.clone(),
            ..prior.clone()
        };
        self.read(&next).await?.ok_or_else(|| {
            Error::UnexpectedResponse(format!("API Gateway {} disappeared during update", rest_api_id))
        })
    }

    /// Delete the REST API; an already absent one counts as deleted
    pub async fn delete(&self, state: &RestApiState) -> Result<()> {
        let rest_api_id = require_id(state)?;
        tracing::debug!("Deleting API Gateway: {}", rest_api_id);

        let client = &self.client;
        let url = &client.rest_api_url(rest_api_id);
        let result = retry::retry(&self.delete_retry, || async move {
            match client.delete(url).await {
                Ok(_) => Ok(()),
                Err(err) if err.is_not_found() => {
                    tracing::debug!("API Gateway {} already gone", rest_api_id);
                    Ok(())
                },
                Err(err) if err.is_transient() => Err(RetryError::Retryable(err)),
                Err(err) => Err(RetryError::NonRetryable(err)),
            }
        })
        .await;

        match result {
            Ok(()) => {
                tracing::info!("Deleted API Gateway {}", rest_api_id);
                Ok(())
            },
            Err(RetryFailure::Aborted(err)) => Err(err.into()),
            Err(RetryFailure::TimedOut { last, elapsed }) => Err(Error::DeleteTimeout {
                rest_api_id: rest_api_id.to_string(),
                elapsed,
                source: last,
            }),
        }
    }

    async fn put_definition(&self, rest_api_id: &str, body: &str) -> std::result::Result<Value, AwsError> {
        let url = self
            .client
            .apigateway_url(&["restapis", rest_api_id], &[("mode", PUT_MODE_OVERWRITE)]);
        self.client.put(&url, body.as_bytes().to_vec()).await
    }
}

fn require_id(state: &RestApiState) -> Result<&str> {
    if state.id.is_empty() {
        return Err(Error::MissingId);
    }
    Ok(&state.id)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Aws(AwsError::Decode(e)))
}
