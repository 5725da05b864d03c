//! Finding taxonomy shared by every validator.
//!
//! Codes are a closed set. New defects get new codes; existing codes are never
//! reused for a different meaning, because release gates match on them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    MissingFile,
    MissingMetadata,
    MissingHeading,
    MissingSchema,
    InvalidJson,
    MissingField,
    InvalidField,
    InvalidStatusForBucket,
    DuplicatePlanId,
    DuplicateCapabilityId,
    DuplicateOutOfScope,
    InvalidCapabilityStatus,
    EvidenceOutsideRepo,
    MissingEvidenceFile,
    StaleDocument,
    StaleArtifact,
    TransitionPending,
}

impl FindingCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingCode::MissingFile => "MISSING_FILE",
            FindingCode::MissingMetadata => "MISSING_METADATA",
            FindingCode::MissingHeading => "MISSING_HEADING",
            FindingCode::MissingSchema => "MISSING_SCHEMA",
            FindingCode::InvalidJson => "INVALID_JSON",
            FindingCode::MissingField => "MISSING_FIELD",
            FindingCode::InvalidField => "INVALID_FIELD",
            FindingCode::InvalidStatusForBucket => "INVALID_STATUS_FOR_BUCKET",
            FindingCode::DuplicatePlanId => "DUPLICATE_PLAN_ID",
            FindingCode::DuplicateCapabilityId => "DUPLICATE_CAPABILITY_ID",
            FindingCode::DuplicateOutOfScope => "DUPLICATE_OUT_OF_SCOPE",
            FindingCode::InvalidCapabilityStatus => "INVALID_CAPABILITY_STATUS",
            FindingCode::EvidenceOutsideRepo => "EVIDENCE_OUTSIDE_REPO",
            FindingCode::MissingEvidenceFile => "MISSING_EVIDENCE_FILE",
            FindingCode::StaleDocument => "STALE_DOCUMENT",
            FindingCode::StaleArtifact => "STALE_ARTIFACT",
            FindingCode::TransitionPending => "TRANSITION_PENDING",
        }
    }

    /// Severity is a property of the code, not of the call site.
    pub fn severity(self) -> Severity {
        match self {
            FindingCode::StaleDocument
            | FindingCode::StaleArtifact
            | FindingCode::TransitionPending => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which validator emitted a finding. Declaration order is report order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Producer {
    Documents,
    Plans,
    Conformance,
}

impl Producer {
    pub const ALL: [Producer; 3] = [Producer::Documents, Producer::Plans, Producer::Conformance];

    pub fn suite_id(self) -> &'static str {
        match self {
            Producer::Documents => "policy_documents",
            Producer::Plans => "plan_lifecycle",
            Producer::Conformance => "conformance_artifact",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub code: FindingCode,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Finding {
    pub fn new(code: FindingCode, message: impl Into<String>) -> Self {
        Finding {
            code,
            severity: code.severity(),
            message: message.into(),
            file: None,
        }
    }

    pub fn at(code: FindingCode, file: &str, message: impl Into<String>) -> Self {
        Finding {
            file: Some(file.to_string()),
            ..Finding::new(code, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "[{}] {}: {}", self.code, file, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}
