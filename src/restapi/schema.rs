//! Schema descriptor and field constraint checks
//!
//! The descriptor is static data the host uses for plan/diff computation.
//! Each user-settable field has a matching check that runs before any
//! remote call.

use serde::Serialize;

use super::error::{Error, Result};
use super::model::{
    EndpointConfiguration, RestApiConfig, ENDPOINT_TYPES, MAX_MINIMUM_COMPRESSION_SIZE,
};
use super::policy;

/// Resource type name the host knows this handler by
pub const RESOURCE_TYPE: &str = "aws_api_gateway_rest_api";

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    List,
    Object,
}

/// Who supplies a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    Required,
    Optional,
    /// Server-assigned, never supplied by the caller
    Computed,
    /// Caller may set it; otherwise the server's value is recorded
    OptionalComputed,
}

/// How the host should compare old and new values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffRule {
    Exact,
    /// Structural JSON equality
    JsonEquivalent,
    /// Order and duplicates ignored
    Set,
}

/// Descriptor of one field
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub mode: FieldMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<FieldType>,
    #[serde(skip_serializing_if = "no_values")]
    pub allowed_values: &'static [&'static str],
    /// Inclusive bounds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(i64, i64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Value must be a JSON document
    pub json: bool,
    /// Sent to the service but never read back
    pub write_only: bool,
    pub diff: DiffRule,
    #[serde(skip_serializing_if = "no_fields")]
    pub nested: &'static [FieldSchema],
}

impl FieldSchema {
    const fn new(name: &'static str, field_type: FieldType, mode: FieldMode) -> Self {
        Self {
            name,
            field_type,
            mode,
            elem: None,
            allowed_values: &[],
            range: None,
            min_items: None,
            max_items: None,
            json: false,
            write_only: false,
            diff: DiffRule::Exact,
            nested: &[],
        }
    }
}

fn no_values(values: &&[&str]) -> bool {
    values.is_empty()
}

fn no_fields(fields: &&[FieldSchema]) -> bool {
    fields.is_empty()
}

/// Schema of the whole resource
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResourceSchema {
    pub resource_type: &'static str,
    pub version: u32,
    pub fields: &'static [FieldSchema],
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const ENDPOINT_CONFIGURATION_FIELDS: &[FieldSchema] = &[FieldSchema {
    elem: Some(FieldType::String),
    allowed_values: ENDPOINT_TYPES,
    min_items: Some(1),
    max_items: Some(1),
    ..FieldSchema::new("types", FieldType::List, FieldMode::Required)
}];

const FIELDS: &[FieldSchema] = &[
    FieldSchema::new("name", FieldType::String, FieldMode::Required),
    FieldSchema::new("description", FieldType::String, FieldMode::Optional),
    FieldSchema {
        json: true,
        diff: DiffRule::JsonEquivalent,
        ..FieldSchema::new("policy", FieldType::String, FieldMode::Optional)
    },
    FieldSchema {
        elem: Some(FieldType::String),
        diff: DiffRule::Set,
        ..FieldSchema::new("binary_media_types", FieldType::List, FieldMode::Optional)
    },
    FieldSchema {
        write_only: true,
        ..FieldSchema::new("body", FieldType::String, FieldMode::Optional)
    },
    FieldSchema {
        range: Some((-1, MAX_MINIMUM_COMPRESSION_SIZE as i64)),
        ..FieldSchema::new("minimum_compression_size", FieldType::Int, FieldMode::Optional)
    },
    FieldSchema::new("root_resource_id", FieldType::String, FieldMode::Computed),
    FieldSchema::new("created_date", FieldType::String, FieldMode::Computed),
    FieldSchema::new("execution_arn", FieldType::String, FieldMode::Computed),
    FieldSchema {
        min_items: Some(1),
        max_items: Some(1),
        nested: ENDPOINT_CONFIGURATION_FIELDS,
        ..FieldSchema::new(
            "endpoint_configuration",
            FieldType::List,
            FieldMode::OptionalComputed,
        )
    },
];

static SCHEMA: ResourceSchema = ResourceSchema {
    resource_type: RESOURCE_TYPE,
    version: 0,
    fields: FIELDS,
};

/// The static schema descriptor
pub fn resource_schema() -> &'static ResourceSchema {
    &SCHEMA
}

// =============================================================================
// Constraint checks
// =============================================================================

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    Ok(())
}

pub fn validate_policy(policy: Option<&str>) -> Result<()> {
    match policy.filter(|p| !p.is_empty()) {
        Some(policy) => policy::validate_json_string(policy).map_err(|e| Error::validation("policy", e)),
        None => Ok(()),
    }
}

pub fn validate_minimum_compression_size(size: Option<u32>) -> Result<()> {
    match size {
        Some(size) if size > MAX_MINIMUM_COMPRESSION_SIZE => Err(Error::validation(
            "minimum_compression_size",
            format!(
                "must be between -1 and {}, got {}",
                MAX_MINIMUM_COMPRESSION_SIZE, size
            ),
        )),
        _ => Ok(()),
    }
}

pub fn validate_endpoint_configuration(config: Option<&EndpointConfiguration>) -> Result<()> {
    let Some(config) = config else {
        return Ok(());
    };

    if config.types.len() != 1 {
        return Err(Error::validation(
            "endpoint_configuration",
            format!("exactly one endpoint type is required, got {}", config.types.len()),
        ));
    }

    for endpoint_type in &config.types {
        if !ENDPOINT_TYPES.contains(&endpoint_type.as_str()) {
            return Err(Error::validation(
                "endpoint_configuration",
                format!(
                    "expected type to be one of {:?}, got {}",
                    ENDPOINT_TYPES, endpoint_type
                ),
            ));
        }
    }

    Ok(())
}

impl RestApiConfig {
    /// Run every field check; the first failure is returned
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_policy(self.policy.as_deref())?;
        validate_minimum_compression_size(self.minimum_compression_size)?;
        validate_endpoint_configuration(self.endpoint_configuration.as_ref())?;
        Ok(())
    }
}
