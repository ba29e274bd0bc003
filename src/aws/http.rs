//! HTTP utilities for signed AWS REST/JSON API calls

use std::time::SystemTime;

use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;

use super::error::{ApiError, AwsError};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Header carrying the machine-readable error code
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Signing identity for one service in one region
#[derive(Debug, Clone)]
pub struct Signer {
    pub credentials: SharedCredentialsProvider,
    pub region: String,
    pub service: String,
}

impl Signer {
    /// SigV4 headers (`authorization`, `x-amz-date`, and
    /// `x-amz-security-token` for temporary credentials) for one request
    ///
    /// Credentials are asked for on every request so that expiring ones
    /// are refreshed by their provider.
    pub async fn sign(
        &self,
        method: &Method,
        url: &Url,
        headers: &[(&str, &str)],
        payload: &[u8],
    ) -> Result<Vec<(String, String)>, AwsError> {
        self.sign_at(method, url, headers, payload, SystemTime::now()).await
    }

    async fn sign_at(
        &self,
        method: &Method,
        url: &Url,
        headers: &[(&str, &str)],
        payload: &[u8],
        time: SystemTime,
    ) -> Result<Vec<(String, String)>, AwsError> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| AwsError::Credentials(e.to_string()))?;
        let identity: Identity = credentials.into();

        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(&self.service)
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| AwsError::Signing(e.to_string()))?
            .into();

        let signable = SignableRequest::new(
            method.as_str(),
            url.as_str(),
            headers.iter().copied(),
            SignableBody::Bytes(payload),
        )
        .map_err(|e| AwsError::Signing(e.to_string()))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| AwsError::Signing(e.to_string()))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}

/// HTTP client wrapper for AWS API calls
#[derive(Clone)]
pub struct AwsHttpClient {
    client: Client,
}

impl AwsHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, AwsError> {
        let client = Client::builder()
            .user_agent(concat!("apigw-restapi/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &Url, signer: &Signer) -> Result<Value, AwsError> {
        self.execute(Method::GET, url, None, signer).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &Url, signer: &Signer, body: &Value) -> Result<Value, AwsError> {
        let payload = serde_json::to_vec(body)?;
        self.execute(Method::POST, url, Some(payload), signer).await
    }

    /// Make a PATCH request with a JSON body
    pub async fn patch(&self, url: &Url, signer: &Signer, body: &Value) -> Result<Value, AwsError> {
        let payload = serde_json::to_vec(body)?;
        self.execute(Method::PATCH, url, Some(payload), signer).await
    }

    /// Make a PUT request with a raw document body
    pub async fn put(&self, url: &Url, signer: &Signer, body: Vec<u8>) -> Result<Value, AwsError> {
        self.execute(Method::PUT, url, Some(body), signer).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &Url, signer: &Signer) -> Result<Value, AwsError> {
        self.execute(Method::DELETE, url, None, signer).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &Url,
        body: Option<Vec<u8>>,
        signer: &Signer,
    ) -> Result<Value, AwsError> {
        tracing::debug!("{} {}", method, url);

        let payload = body.unwrap_or_default();
        let content_headers: &[(&str, &str)] = if payload.is_empty() {
            &[]
        } else {
            &[("content-type", JSON_CONTENT_TYPE)]
        };
        let signed = signer.sign(&method, url, content_headers, &payload).await?;

        let mut request = self.client.request(method, url.clone());
        for (name, value) in content_headers.iter().copied().chain(
            signed.iter().map(|(n, v)| (n.as_str(), v.as_str())),
        ) {
            request = request.header(name, value);
        }
        if !payload.is_empty() {
            request = request.body(payload);
        }

        let response = request.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(parse_api_error(status.as_u16(), &headers, &response_body).into());
        }

        // Handle empty response (delete answers 202 with no body)
        if response_body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response_body)?)
    }
}

/// Classify an error response
///
/// The code comes from the `x-amzn-ErrorType` header when present
/// (`NotFoundException:http://internal.amazon.com/...`), then from the
/// body's `__type` or `code` fields, and finally from the status alone.
pub fn parse_api_error(status: u16, headers: &HeaderMap, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let header_code = headers
        .get(ERROR_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(':').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty());

    let body_code = parsed.as_ref().and_then(|v| {
        v.get("__type")
            .or_else(|| v.get("code"))
            .and_then(|c| c.as_str())
            // `__type` may be namespaced: `com.amazonaws.apigateway#NotFoundException`
            .map(|c| c.rsplit('#').next().unwrap_or(c).to_string())
    });

    let code = header_code
        .or(body_code)
        .unwrap_or_else(|| code_for_status(status).to_string());

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message").or_else(|| v.get("Message")))
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| sanitize_for_log(body));

    ApiError {
        status,
        code,
        message,
    }
}

fn code_for_status(status: u16) -> &'static str {
    match status {
        400 => "BadRequestException",
        401 => "UnauthorizedException",
        403 => "AccessDeniedException",
        404 => "NotFoundException",
        409 => "ConflictException",
        429 => "TooManyRequestsException",
        503 => "ServiceUnavailableException",
        _ => "UnknownError",
    }
}
