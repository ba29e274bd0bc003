//! Shared fixtures for integration tests against a mocked API Gateway

#![allow(dead_code)]

use std::time::Duration;

use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use apigw_restapi::aws::client::{AwsClient, ClientSettings};
use apigw_restapi::restapi::{RestApiHandler, RetryPolicy};
use serde_json::{json, Value};
use wiremock::{MockServer, Request};

pub const REST_API_ID: &str = "a1b2c3";
pub const ROOT_RESOURCE_ID: &str = "r00t";
pub const ACCOUNT_ID: &str = "123456789012";

pub const POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":"*","Action":"execute-api:Invoke","Resource":"*"}]}"#;

/// Client signing with fixed test credentials, pointed at the mock server
pub fn client_for(server: &MockServer) -> AwsClient {
    AwsClient::new(ClientSettings {
        credentials: SharedCredentialsProvider::new(Credentials::new(
            "AKIDTEST",
            "test-secret",
            None,
            None,
            "test",
        )),
        region: "us-east-1".to_string(),
        partition: None,
        account_id: ACCOUNT_ID.to_string(),
        endpoint: Some(server.uri()),
    })
    .expect("test client settings are valid")
}

/// Handler whose delete retries run in milliseconds
pub fn handler_for(server: &MockServer) -> RestApiHandler {
    RestApiHandler::new(client_for(server)).with_delete_retry(fast_retry(Duration::from_secs(5)))
}

pub fn fast_retry(timeout: Duration) -> RetryPolicy {
    RetryPolicy {
        timeout,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
    }
}

/// A REST API as the service describes it
pub fn rest_api_json(name: &str) -> Value {
    json!({
        "id": REST_API_ID,
        "name": name,
        "createdDate": 1700000000,
        "apiKeySource": "HEADER",
        "endpointConfiguration": {"types": ["EDGE"]},
        "disableExecuteApiEndpoint": false
    })
}

/// Escape a document one level, the way the service returns policies
pub fn service_escaped(policy: &str) -> String {
    policy.replace('"', "\\\"")
}

pub fn resources_json() -> Value {
    json!({
        "item": [
            {"id": "pets1", "parentId": ROOT_RESOURCE_ID, "path": "/pets", "pathPart": "pets"},
            {"id": ROOT_RESOURCE_ID, "path": "/"}
        ]
    })
}

pub fn not_found_body() -> Value {
    json!({"message": format!("Invalid API identifier specified {}:{}", ACCOUNT_ID, REST_API_ID)})
}

pub const NOT_FOUND_TYPE: &str =
    "NotFoundException:http://internal.amazon.com/coral/com.amazonaws.backplane.controlplane/";

/// Requests the server received with the given method, in arrival order
pub async fn requests_with_method(server: &MockServer, method: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .into_iter()
        .filter(|r| r.method.as_str() == method)
        .collect()
}

/// Methods of every received request, in arrival order
pub async fn received_methods(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(|r| r.method.as_str().to_string())
        .collect()
}
