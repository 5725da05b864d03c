//! Engine configuration.
//!
//! Loaded from `.docgate/config.toml` when present; every key is optional and
//! falls back to the built-in layout. The resolved [`GovernanceConfig`] is an
//! immutable value passed explicitly through the pipeline.

use crate::core::corpus::DocumentRef;
use crate::core::error::DocgateError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const CONFIG_PATH: &str = ".docgate/config.toml";
pub const STALE_DAYS_ENV: &str = "DOCGATE_STALE_DAYS";
pub const DEFAULT_STALE_AFTER_DAYS: u32 = 90;
pub const AGENT_HARDENING_KIND: &str = "agent-hardening";

const DEFAULT_AGENT_HARDENING_DOCS: &[&str] = &[
    "docs/agent-hardening/threat-model.md",
    "docs/agent-hardening/tool-permissions.md",
    "docs/agent-hardening/prompt-injection.md",
    "docs/agent-hardening/incident-response.md",
    "docs/agent-hardening/evaluation.md",
];

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    schema: Option<String>,
    stale_after_days: Option<u32>,
    documents: Option<Vec<DocumentEntry>>,
    #[serde(default)]
    plans: PlansSection,
    #[serde(default)]
    conformance: ConformanceSection,
    #[serde(default)]
    report: ReportSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentEntry {
    path: String,
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlansSection {
    root: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConformanceSection {
    artifact: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReportSection {
    path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GovernanceConfig {
    /// Schema JSON, repository-relative. `None` selects the built-in schema.
    pub schema_path: Option<String>,
    pub stale_after_days: u32,
    pub documents: Vec<DocumentRef>,
    pub plans_root: String,
    pub conformance_artifact: String,
    pub report_path: String,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        GovernanceConfig {
            schema_path: None,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            documents: DEFAULT_AGENT_HARDENING_DOCS
                .iter()
                .map(|path| DocumentRef {
                    path: path.to_string(),
                    kind: AGENT_HARDENING_KIND.to_string(),
                })
                .collect(),
            plans_root: "docs/plans".to_string(),
            conformance_artifact: "docs/conformance/capabilities.json".to_string(),
            report_path: "artifacts/governance-report.json".to_string(),
        }
    }
}

impl GovernanceConfig {
    pub fn from_toml(raw: &str) -> Result<Self, DocgateError> {
        let file: ConfigFile =
            toml::from_str(raw).map_err(|e| DocgateError::ConfigError(e.to_string()))?;
        let defaults = GovernanceConfig::default();
        let stale_after_days = match file.stale_after_days {
            Some(0) => {
                return Err(DocgateError::ConfigError(
                    "stale_after_days must be a positive integer".to_string(),
                ));
            }
            Some(days) => days,
            None => defaults.stale_after_days,
        };
        Ok(GovernanceConfig {
            schema_path: file.schema,
            stale_after_days,
            documents: match file.documents {
                Some(entries) => entries
                    .into_iter()
                    .map(|e| DocumentRef {
                        path: e.path,
                        kind: e.kind,
                    })
                    .collect(),
                None => defaults.documents,
            },
            plans_root: file.plans.root.unwrap_or(defaults.plans_root),
            conformance_artifact: file
                .conformance
                .artifact
                .unwrap_or(defaults.conformance_artifact),
            report_path: file.report.path.unwrap_or(defaults.report_path),
        })
    }

    /// Loads `explicit` (which must exist), else `<root>/.docgate/config.toml`
    /// if present, else the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, DocgateError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_PATH);
                if !candidate.is_file() {
                    return Ok(GovernanceConfig::default());
                }
                candidate
            }
        };
        let raw = fs::read_to_string(&path).map_err(|e| DocgateError::io_at(&path, e))?;
        Self::from_toml(&raw).map_err(|e| match e {
            DocgateError::ConfigError(msg) => {
                DocgateError::ConfigError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }
}

/// Staleness threshold override: a positive integer, nothing else.
pub fn parse_stale_days(raw: &str) -> Result<u32, DocgateError> {
    let reject = || {
        DocgateError::ConfigError(format!(
            "staleness threshold must be a positive integer, got `{raw}`"
        ))
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(reject());
    }
    match trimmed.parse::<u32>() {
        Ok(0) | Err(_) => Err(reject()),
        Ok(days) => Ok(days),
    }
}

/// Flag beats environment beats config file.
pub fn resolve_stale_days(
    flag: Option<&str>,
    env: Option<&str>,
    configured: u32,
) -> Result<u32, DocgateError> {
    match (flag, env) {
        (Some(raw), _) => parse_stale_days(raw),
        (None, Some(raw)) => parse_stale_days(raw),
        (None, None) => Ok(configured),
    }
}
