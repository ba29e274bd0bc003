//! API Gateway REST API resource handler
//!
//! - [`restapi`] - schema, validation, diff-to-patch translation and the CRUD verbs
//! - [`aws`] - signed calls to the API Gateway control plane
//! - [`config`] - persisted settings and their resolution

pub mod aws;
pub mod config;
pub mod restapi;
