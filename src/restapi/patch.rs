//! Diff-to-patch translation for REST API updates
//!
//! Changed fields turn into an ordered list of patch operations in a fixed
//! field order: name, description, policy, minimum compression size,
//! binary media types, endpoint type.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::RestApiConfig;
use super::policy;

const BINARY_MEDIA_TYPES_PATH: &str = "/binaryMediaTypes";

/// Patch verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

/// One add/remove/replace instruction against a JSON-pointer-style path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PatchOperation {
    pub fn replace(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value.into()),
        }
    }

    pub fn add(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: None,
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }
}

/// Escape a value for use as one JSON pointer segment (RFC 6901)
pub fn escape_json_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Operations that move a REST API from `old` to `new`
pub fn update_operations(old: &RestApiConfig, new: &RestApiConfig) -> Vec<PatchOperation> {
    let mut operations = Vec::new();

    if old.name != new.name {
        operations.push(PatchOperation::replace("/name", new.name.as_str()));
    }

    if old.description() != new.description() {
        operations.push(PatchOperation::replace(
            "/description",
            new.description().unwrap_or_default(),
        ));
    }

    if !policy::policies_equivalent(old.policy(), new.policy()) {
        operations.push(PatchOperation::replace(
            "/policy",
            new.policy().unwrap_or_default(),
        ));
    }

    if old.minimum_compression_size != new.minimum_compression_size {
        // An empty value disables compression
        let value = new
            .minimum_compression_size
            .map(|size| size.to_string())
            .unwrap_or_default();
        operations.push(PatchOperation::replace("/minimumCompressionSize", value));
    }

    if binary_media_types_changed(&old.binary_media_types, &new.binary_media_types) {
        // There is no per-entry replace: drop every old entry, then add every new one
        for media_type in unique(&old.binary_media_types) {
            operations.push(PatchOperation::remove(binary_media_type_path(media_type)));
        }
        for media_type in unique(&new.binary_media_types) {
            operations.push(PatchOperation::add(binary_media_type_path(media_type)));
        }
    }

    if old.endpoint_type() != new.endpoint_type() {
        // The service requires an endpoint type, so clearing it is skipped
        if let Some(endpoint_type) = new.endpoint_type() {
            operations.push(PatchOperation::replace(
                "/endpointConfiguration/types/0",
                endpoint_type,
            ));
        }
    }

    operations
}

fn binary_media_types_changed(old: &[String], new: &[String]) -> bool {
    let old: BTreeSet<&str> = old.iter().map(String::as_str).collect();
    let new: BTreeSet<&str> = new.iter().map(String::as_str).collect();
    old != new
}

/// Entries in their original order, first occurrence kept
fn unique(values: &[String]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .map(String::as_str)
        .filter(|v| seen.insert(*v))
        .collect()
}

fn binary_media_type_path(media_type: &str) -> String {
    format!("{}/{}", BINARY_MEDIA_TYPES_PATH, escape_json_pointer(media_type))
}
