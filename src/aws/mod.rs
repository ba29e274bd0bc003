//! AWS API interaction module
//!
//! This module provides the plumbing for talking to the API Gateway control
//! plane: credential resolution through the AWS provider chain, SigV4
//! request signing, the HTTP layer and error classification.
//!
//! # Module Structure
//!
//! - [`arn`] - Amazon Resource Name formatting
//! - [`auth`] - Credential and region resolution
//! - [`client`] - Main AWS client for making API requests
//! - [`error`] - Error classification of failed calls
//! - [`http`] - HTTP utilities and SigV4 signing of REST/JSON calls
//!
//! # Example
//!
//! ```ignore
//! use apigw_restapi::aws::client::{AwsClient, ClientSettings};
//!
//! async fn example(settings: ClientSettings) -> Result<(), apigw_restapi::aws::AwsError> {
//!     let client = AwsClient::new(settings)?;
//!     let api = client.get(&client.rest_api_url("a1b2c3")).await?;
//!     Ok(())
//! }
//! ```

pub mod arn;
pub mod auth;
pub mod client;
pub mod error;
pub mod http;

pub use error::{ApiError, AwsError};
