//! REST API resource handler
//!
//! Reconciles a declared API Gateway REST API against the service through
//! Create/Read/Update/Delete verbs invoked by a host engine.
//!
//! # Architecture
//!
//! - [`model`] - Typed desired configuration and recorded state
//! - [`schema`] - Static schema descriptor and per-field constraint checks
//! - [`policy`] - Policy validation, equivalence and read-side unescaping
//! - [`patch`] - Diff-to-patch-operations translation for updates
//! - [`api`] - Wire shapes of the service calls
//! - [`handler`] - The CRUD verbs
//! - [`retry`] - Deadline-bounded retry used by delete
//!
//! # Example
//!
//! ```ignore
//! use apigw_restapi::restapi::{RestApiConfig, RestApiHandler};
//!
//! async fn apply(handler: &RestApiHandler) -> apigw_restapi::restapi::Result<()> {
//!     let state = handler.create(&RestApiConfig::new("pets")).await?;
//!     println!("created {}", state.id);
//!     Ok(())
//! }
//! ```

pub mod api;
mod error;
pub mod handler;
pub mod model;
pub mod patch;
pub mod policy;
pub mod retry;
pub mod schema;

pub use error::{Error, Result};
pub use handler::RestApiHandler;
pub use model::{EndpointConfiguration, RestApiConfig, RestApiState};
pub use patch::{escape_json_pointer, update_operations, PatchOp, PatchOperation};
pub use retry::RetryPolicy;
pub use schema::resource_schema;
