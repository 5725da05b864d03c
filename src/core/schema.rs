//! Per-kind document schemas and the validator that applies them.
//!
//! Schemas are static configuration loaded from JSON:
//!
//! ```json
//! { "agent-hardening": { "requiredFields": ["Owner"], "requiredHeadings": ["Scope"] } }
//! ```
//!
//! A document whose kind has no schema entry fails closed with
//! `MISSING_SCHEMA` rather than being skipped.

use crate::core::corpus::Document;
use crate::core::error::DocgateError;
use crate::core::finding::{Finding, FindingCode};
use crate::core::markdown;
use crate::core::metadata::MetadataSection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub required_headings: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SchemaSet {
    kinds: BTreeMap<String, Schema>,
}

impl SchemaSet {
    pub fn from_json(raw: &str) -> Result<Self, DocgateError> {
        serde_json::from_str(raw)
            .map_err(|e| DocgateError::SchemaError(format!("invalid schema JSON: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, DocgateError> {
        let raw = fs::read_to_string(path).map_err(|e| DocgateError::io_at(path, e))?;
        Self::from_json(&raw).map_err(|e| match e {
            DocgateError::SchemaError(msg) => {
                DocgateError::SchemaError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn get(&self, kind: &str) -> Option<&Schema> {
        self.kinds.get(kind)
    }

    pub fn insert(&mut self, kind: impl Into<String>, schema: Schema) {
        self.kinds.insert(kind.into(), schema);
    }
}

/// One `MISSING_METADATA` per absent field. An empty value counts as present.
pub fn validate_fields(file: &str, metadata: &MetadataSection, fields: &[String]) -> Vec<Finding> {
    fields
        .iter()
        .filter(|field| !metadata.contains(field))
        .map(|field| {
            Finding::at(
                FindingCode::MissingMetadata,
                file,
                format!("missing required metadata field `{field}`"),
            )
        })
        .collect()
}

/// One `MISSING_HEADING` per required level-2 heading not found verbatim.
pub fn validate_headings(file: &str, content: &str, headings: &[String]) -> Vec<Finding> {
    headings
        .iter()
        .filter(|heading| !markdown::has_level2(content, heading))
        .map(|heading| {
            Finding::at(
                FindingCode::MissingHeading,
                file,
                format!("missing required heading `## {}`", heading.trim()),
            )
        })
        .collect()
}

pub fn validate_document(
    doc: &Document,
    metadata: &MetadataSection,
    schema: &Schema,
) -> Vec<Finding> {
    let mut findings = validate_fields(&doc.path, metadata, &schema.required_fields);
    findings.extend(validate_headings(
        &doc.path,
        &doc.content,
        &schema.required_headings,
    ));
    findings
}

/// Looks up the document's schema and validates against it, failing closed
/// when the kind is unknown.
pub fn check_document(
    doc: &Document,
    metadata: &MetadataSection,
    schemas: &SchemaSet,
) -> Vec<Finding> {
    match schemas.get(&doc.kind) {
        Some(schema) => validate_document(doc, metadata, schema),
        None => vec![missing_schema(&doc.path, &doc.kind)],
    }
}

pub fn missing_schema(file: &str, kind: &str) -> Finding {
    Finding::at(
        FindingCode::MissingSchema,
        file,
        format!("no schema configured for document kind `{kind}`"),
    )
}
