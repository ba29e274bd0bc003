//! End-to-end tests of the REST API handler against a mocked API Gateway

mod common;

use std::time::Duration;

use apigw_restapi::restapi::{Error, RestApiConfig, RestApiState};
use common::*;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_read(server: &MockServer, api: Value) {
    Mock::given(method("GET"))
        .and(path("/restapis/a1b2c3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api))
        .mount(server)
        .await;
}

async fn mount_resources(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/restapis/a1b2c3/resources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resources_json()))
        .mount(server)
        .await;
}

fn recorded_state(config: RestApiConfig) -> RestApiState {
    RestApiState {
        root_resource_id: Some(ROOT_RESOURCE_ID.to_string()),
        ..RestApiState::new(REST_API_ID, config)
    }
}

mod create_tests {
    use super::*;

    /// Create, root discovery and read-back produce a complete state
    #[tokio::test]
    async fn test_create_minimal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(rest_api_json("pets")))
            .expect(1)
            .mount(&server)
            .await;
        mount_resources(&server).await;
        mount_read(&server, rest_api_json("pets")).await;

        let state = handler_for(&server)
            .create(&RestApiConfig::new("pets"))
            .await
            .expect("create should succeed");

        assert_eq!(state.id, REST_API_ID);
        assert_eq!(state.config.name, "pets");
        assert_eq!(state.root_resource_id.as_deref(), Some(ROOT_RESOURCE_ID));
        assert_eq!(state.created_date.as_deref(), Some("2023-11-14T22:13:20Z"));
        assert_eq!(
            state.execution_arn.as_deref(),
            Some("arn:aws:execute-api:us-east-1:123456789012:a1b2c3")
        );
        assert_eq!(state.config.minimum_compression_size, None);
        assert_eq!(state.config.endpoint_type(), Some("EDGE"));

        assert_eq!(received_methods(&server).await, vec!["POST", "GET", "GET"]);
    }

    /// Disabled compression and empty fields are not sent
    #[tokio::test]
    async fn test_create_request_omits_unset_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(rest_api_json("pets")))
            .mount(&server)
            .await;
        mount_resources(&server).await;
        mount_read(&server, rest_api_json("pets")).await;

        let mut config = RestApiConfig::new("pets");
        config.binary_media_types = vec!["image/png".to_string()];
        handler_for(&server).create(&config).await.unwrap();

        let posts = requests_with_method(&server, "POST").await;
        assert_eq!(posts.len(), 1);
        let sent: Value = posts[0].body_json().unwrap();
        assert_eq!(sent, json!({"name": "pets", "binaryMediaTypes": ["image/png"]}));
    }

    /// Every set field is sent on create
    #[tokio::test]
    async fn test_create_request_carries_all_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .and(body_json(json!({
                "name": "pets",
                "description": "Pet store",
                "policy": POLICY,
                "minimumCompressionSize": 0,
                "endpointConfiguration": {"types": ["REGIONAL"]}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(rest_api_json("pets")))
            .expect(1)
            .mount(&server)
            .await;
        mount_resources(&server).await;
        mount_read(&server, rest_api_json("pets")).await;

        let config: RestApiConfig = serde_json::from_value(json!({
            "name": "pets",
            "description": "Pet store",
            "policy": POLICY,
            "minimum_compression_size": 0,
            "endpoint_configuration": {"types": ["REGIONAL"]}
        }))
        .unwrap();

        handler_for(&server).create(&config).await.unwrap();
    }

    /// A definition document is imported in overwrite mode, byte for byte
    #[tokio::test]
    async fn test_create_with_body_imports_definition() {
        let server = MockServer::start().await;
        let body = r#"{"openapi":"3.0.1","info":{"title":"pets","version":"1"},"paths":{}}"#;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(rest_api_json("pets")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/restapis/a1b2c3"))
            .and(query_param("mode", "overwrite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rest_api_json("pets")))
            .expect(1)
            .mount(&server)
            .await;
        mount_resources(&server).await;
        mount_read(&server, rest_api_json("pets")).await;

        let mut config = RestApiConfig::new("pets");
        config.body = Some(body.to_string());
        let state = handler_for(&server).create(&config).await.unwrap();

        assert_eq!(state.config.body.as_deref(), Some(body));
        let puts = requests_with_method(&server, "PUT").await;
        assert_eq!(puts[0].body, body.as_bytes());
        assert_eq!(received_methods(&server).await, vec!["POST", "PUT", "GET", "GET"]);
    }

    /// A failed import reports the id of the REST API that now exists
    #[tokio::test]
    async fn test_create_body_failure_carries_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(rest_api_json("pets")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("x-amzn-ErrorType", "BadRequestException")
                    .set_body_json(json!({"message": "Invalid OpenAPI input"})),
            )
            .mount(&server)
            .await;

        let mut config = RestApiConfig::new("pets");
        config.body = Some("not an openapi document".to_string());
        let err = handler_for(&server).create(&config).await.unwrap_err();

        match &err {
            Error::Specification { action, rest_api_id, .. } => {
                assert_eq!(*action, "creating");
                assert_eq!(rest_api_id, REST_API_ID);
            },
            other => panic!("expected a specification error, got {other:?}"),
        }
        assert_eq!(err.partial_rest_api_id(), Some(REST_API_ID));
        assert_eq!(received_methods(&server).await, vec!["POST", "PUT"]);
    }

    /// A failed root lookup still reports the id of the created REST API
    #[tokio::test]
    async fn test_create_discovery_failure_carries_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(rest_api_json("pets")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/restapis/a1b2c3/resources"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("x-amzn-ErrorType", "BadRequestException")
                    .set_body_json(json!({"message": "boom"})),
            )
            .mount(&server)
            .await;

        let err = handler_for(&server)
            .create(&RestApiConfig::new("pets"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::IncompleteCreate { .. }));
        assert_eq!(err.partial_rest_api_id(), Some(REST_API_ID));
        assert_eq!(received_methods(&server).await, vec!["POST", "GET"]);
    }

    /// A REST API missing right after creation still reports its id
    #[tokio::test]
    async fn test_create_read_back_missing_carries_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .respond_with(ResponseTemplate::new(201).set_body_json(rest_api_json("pets")))
            .mount(&server)
            .await;
        mount_resources(&server).await;
        Mock::given(method("GET"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-amzn-ErrorType", NOT_FOUND_TYPE)
                    .set_body_json(not_found_body()),
            )
            .mount(&server)
            .await;

        let err = handler_for(&server)
            .create(&RestApiConfig::new("pets"))
            .await
            .unwrap_err();

        match &err {
            Error::IncompleteCreate { rest_api_id, source } => {
                assert_eq!(rest_api_id, REST_API_ID);
                assert!(matches!(**source, Error::UnexpectedResponse(_)));
            },
            other => panic!("expected an incomplete create, got {other:?}"),
        }
        assert_eq!(err.partial_rest_api_id(), Some(REST_API_ID));
    }

    /// A rejected create makes no further calls
    #[tokio::test]
    async fn test_create_failure_is_labeled() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/restapis"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("x-amzn-ErrorType", "BadRequestException")
                    .set_body_json(json!({"message": "Invalid policy document"})),
            )
            .mount(&server)
            .await;

        let err = handler_for(&server)
            .create(&RestApiConfig::new("pets"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Create(_)));
        assert!(err.to_string().starts_with("error creating API Gateway"));
        assert!(err.partial_rest_api_id().is_none());
        assert_eq!(received_methods(&server).await, vec!["POST"]);
    }

    /// Invalid configuration never reaches the service
    #[tokio::test]
    async fn test_invalid_config_makes_no_calls() {
        let server = MockServer::start().await;

        let mut config = RestApiConfig::new("pets");
        config.policy = Some("{not json".to_string());
        let err = handler_for(&server).create(&config).await.unwrap_err();

        assert!(matches!(err, Error::Validation { field: "policy", .. }));
        assert!(received_methods(&server).await.is_empty());
    }
}

mod resources_tests {
    use super::*;

    /// The root resource is found on a later page
    #[tokio::test]
    async fn test_root_found_across_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/restapis/a1b2c3/resources"))
            .and(query_param("limit", "500"))
            .and(query_param_is_missing("position"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "item": [{"id": "pets1", "parentId": ROOT_RESOURCE_ID, "path": "/pets"}],
                "position": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/restapis/a1b2c3/resources"))
            .and(query_param("position", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "item": [{"id": ROOT_RESOURCE_ID, "path": "/"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut state = RestApiState::new(REST_API_ID, RestApiConfig::new("pets"));
        handler_for(&server).refresh_resources(&mut state).await.unwrap();

        assert_eq!(state.root_resource_id.as_deref(), Some(ROOT_RESOURCE_ID));
    }

    /// No root path leaves the field unset
    #[tokio::test]
    async fn test_missing_root_leaves_field_unset() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/restapis/a1b2c3/resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "pets1", "path": "/pets"}]
            })))
            .mount(&server)
            .await;

        let mut state = RestApiState::new(REST_API_ID, RestApiConfig::new("pets"));
        handler_for(&server).refresh_resources(&mut state).await.unwrap();

        assert!(state.root_resource_id.is_none());
    }
}

mod read_tests {
    use super::*;

    /// A policy returned escaped is recorded as the plain document
    #[tokio::test]
    async fn test_read_unescapes_policy() {
        let server = MockServer::start().await;

        let mut api = rest_api_json("pets");
        api["policy"] = json!(service_escaped(POLICY));
        api["description"] = json!("Pet store");
        api["binaryMediaTypes"] = json!(["image/png", "application/octet-stream"]);
        api["minimumCompressionSize"] = json!(1024);
        mount_read(&server, api).await;

        let prior = recorded_state(RestApiConfig::new("pets"));
        let state = handler_for(&server)
            .read(&prior)
            .await
            .unwrap()
            .expect("REST API exists");

        assert_eq!(state.config.policy.as_deref(), Some(POLICY));
        assert_eq!(state.config.description.as_deref(), Some("Pet store"));
        assert_eq!(
            state.config.binary_media_types,
            vec!["image/png", "application/octet-stream"]
        );
        assert_eq!(state.config.minimum_compression_size, Some(1024));
        assert_eq!(state.root_resource_id.as_deref(), Some(ROOT_RESOURCE_ID));
    }

    /// A missing REST API is reported as gone, not as an error
    #[tokio::test]
    async fn test_read_not_found_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-amzn-ErrorType", NOT_FOUND_TYPE)
                    .set_body_json(not_found_body()),
            )
            .mount(&server)
            .await;

        let prior = recorded_state(RestApiConfig::new("pets"));
        let state = handler_for(&server).read(&prior).await.unwrap();

        assert!(state.is_none());
    }

    /// Other read failures propagate
    #[tokio::test]
    async fn test_read_access_denied_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-amzn-ErrorType", "AccessDeniedException")
                    .set_body_json(json!({"message": "not authorized"})),
            )
            .mount(&server)
            .await;

        let prior = recorded_state(RestApiConfig::new("pets"));
        let err = handler_for(&server).read(&prior).await.unwrap_err();

        assert!(matches!(err, Error::Aws(_)));
        assert!(!err.is_not_found());
    }

    /// A policy that cannot be unescaped fails the read
    #[tokio::test]
    async fn test_read_bad_policy_escape() {
        let server = MockServer::start().await;

        let mut api = rest_api_json("pets");
        api["policy"] = json!(r#"{"Version":"2012-10-17"}"#);
        mount_read(&server, api).await;

        let prior = recorded_state(RestApiConfig::new("pets"));
        let err = handler_for(&server).read(&prior).await.unwrap_err();

        assert!(matches!(err, Error::PolicyUnescape(_)));
    }
}

mod update_tests {
    use super::*;

    /// Changes are sent as one ordered patch
    #[tokio::test]
    async fn test_update_sends_ordered_patch() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/restapis/a1b2c3"))
            .and(body_json(json!({
                "patchOperations": [
                    {"op": "replace", "path": "/name", "value": "pets-v2"},
                    {"op": "replace", "path": "/minimumCompressionSize", "value": ""},
                    {"op": "remove", "path": "/binaryMediaTypes/image~1png"},
                    {"op": "add", "path": "/binaryMediaTypes/application~1octet-stream"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(rest_api_json("pets-v2")))
            .expect(1)
            .mount(&server)
            .await;
        mount_read(&server, rest_api_json("pets-v2")).await;

        let mut old = RestApiConfig::new("pets");
        old.minimum_compression_size = Some(1024);
        old.binary_media_types = vec!["image/png".to_string()];

        let mut new = RestApiConfig::new("pets-v2");
        new.binary_media_types = vec!["application/octet-stream".to_string()];

        let state = handler_for(&server)
            .update(&recorded_state(old), &new)
            .await
            .unwrap();

        assert_eq!(state.config.name, "pets-v2");
        assert_eq!(received_methods(&server).await, vec!["PATCH", "GET"]);
    }

    /// The patch call goes out even when nothing changed
    #[tokio::test]
    async fn test_update_without_changes_still_patches() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/restapis/a1b2c3"))
            .and(body_json(json!({"patchOperations": []})))
            .respond_with(ResponseTemplate::new(200).set_body_json(rest_api_json("pets")))
            .expect(1)
            .mount(&server)
            .await;
        mount_read(&server, rest_api_json("pets")).await;

        let config = RestApiConfig::new("pets");
        handler_for(&server)
            .update(&recorded_state(config.clone()), &config)
            .await
            .unwrap();
    }

    /// A changed definition is imported before the patch
    #[tokio::test]
    async fn test_update_imports_changed_body_first() {
        let server = MockServer::start().await;
        let body = r#"{"openapi":"3.0.1","paths":{"/pets":{}}}"#;

        Mock::given(method("PUT"))
            .and(path("/restapis/a1b2c3"))
            .and(query_param("mode", "overwrite"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rest_api_json("pets")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rest_api_json("pets")))
            .expect(1)
            .mount(&server)
            .await;
        mount_read(&server, rest_api_json("pets")).await;

        let mut new = RestApiConfig::new("pets");
        new.body = Some(body.to_string());
        let state = handler_for(&server)
            .update(&recorded_state(RestApiConfig::new("pets")), &new)
            .await
            .unwrap();

        assert_eq!(state.config.body.as_deref(), Some(body));
        assert_eq!(received_methods(&server).await, vec!["PUT", "PATCH", "GET"]);
    }

    /// A failed import stops the update before the patch
    #[tokio::test]
    async fn test_update_body_failure_skips_patch() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("x-amzn-ErrorType", "BadRequestException")
                    .set_body_json(json!({"message": "Invalid OpenAPI input"})),
            )
            .mount(&server)
            .await;

        let mut new = RestApiConfig::new("pets");
        new.body = Some("{}".to_string());
        let err = handler_for(&server)
            .update(&recorded_state(RestApiConfig::new("pets")), &new)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Specification { action: "updating", .. }));
        assert_eq!(received_methods(&server).await, vec!["PUT"]);
    }

    /// A policy reformatted by the service produces no patch operation
    #[tokio::test]
    async fn test_update_equivalent_policy_not_patched() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/restapis/a1b2c3"))
            .and(body_json(json!({"patchOperations": []})))
            .respond_with(ResponseTemplate::new(200).set_body_json(rest_api_json("pets")))
            .expect(1)
            .mount(&server)
            .await;
        mount_read(&server, rest_api_json("pets")).await;

        let mut old = RestApiConfig::new("pets");
        old.policy = Some(POLICY.to_string());
        let reformatted: Value = serde_json::from_str(POLICY).unwrap();
        let mut new = RestApiConfig::new("pets");
        new.policy = Some(serde_json::to_string_pretty(&reformatted).unwrap());

        handler_for(&server)
            .update(&recorded_state(old), &new)
            .await
            .unwrap();
    }
}

mod delete_tests {
    use super::*;

    fn state() -> RestApiState {
        recorded_state(RestApiConfig::new("pets"))
    }

    #[tokio::test]
    async fn test_delete_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        handler_for(&server).delete(&state()).await.unwrap();
    }

    /// Deleting something already gone succeeds
    #[tokio::test]
    async fn test_delete_not_found_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-amzn-ErrorType", NOT_FOUND_TYPE)
                    .set_body_json(not_found_body()),
            )
            .expect(1)
            .mount(&server)
            .await;

        handler_for(&server).delete(&state()).await.unwrap();
    }

    /// Throttling is retried until the delete goes through
    #[tokio::test]
    async fn test_delete_retries_transient_errors() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("x-amzn-ErrorType", "TooManyRequestsException")
                    .set_body_json(json!({"message": "Too Many Requests"})),
            )
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        handler_for(&server).delete(&state()).await.unwrap();

        assert_eq!(requests_with_method(&server, "DELETE").await.len(), 3);
    }

    /// A permanent failure aborts after one attempt
    #[tokio::test]
    async fn test_delete_permanent_error_aborts() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(403)
                    .insert_header("x-amzn-ErrorType", "AccessDeniedException")
                    .set_body_json(json!({"message": "not authorized"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = handler_for(&server).delete(&state()).await.unwrap_err();

        assert!(matches!(err, Error::Aws(_)));
    }

    /// Transient errors past the deadline become a timeout
    #[tokio::test]
    async fn test_delete_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/restapis/a1b2c3"))
            .respond_with(
                ResponseTemplate::new(409)
                    .insert_header("x-amzn-ErrorType", "ConflictException")
                    .set_body_json(json!({"message": "Unable to complete operation due to concurrent modification"})),
            )
            .mount(&server)
            .await;

        let handler = handler_for(&server).with_delete_retry(fast_retry(Duration::from_millis(200)));
        let err = handler.delete(&state()).await.unwrap_err();

        match err {
            Error::DeleteTimeout { rest_api_id, source, .. } => {
                assert_eq!(rest_api_id, REST_API_ID);
                assert_eq!(source.api_error().map(|e| e.code.as_str()), Some("ConflictException"));
            },
            other => panic!("expected a timeout, got {other:?}"),
        }
        assert!(requests_with_method(&server, "DELETE").await.len() >= 2);
    }
}
