//! Capability manifest (conformance artifact) validation.
//!
//! The artifact is walked as untyped JSON so every violation is collected in
//! one pass; a typed deserialize would stop at the first bad field. Only a
//! parse failure ends the check early, since nothing else can be inspected.

use crate::core::finding::{Finding, FindingCode};
use crate::core::time;
use chrono::NaiveDate;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

pub const CAPABILITY_STATUSES: &[&str] = &["implemented", "partial"];
const MIN_TIMESTAMP_LEN: usize = 20;

static SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(?:_[a-z0-9]+)*$").unwrap());

pub fn is_snake_case(s: &str) -> bool {
    SNAKE_CASE.is_match(s)
}

pub struct ConformanceContext<'a> {
    pub repo_root: &'a Path,
    pub today: NaiveDate,
    pub stale_after_days: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ConformanceOutcome {
    pub findings: Vec<Finding>,
    pub capabilities_checked: usize,
    pub evidence_checked: usize,
    /// Contained, existing evidence paths; sorted and de-duplicated.
    pub evidence: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvidencePath {
    /// Existing file strictly inside the root.
    Inside { rel: String, abs: PathBuf },
    /// Contained, but no file exists there.
    Missing { rel: String },
    /// Absolute, escapes the root lexically or through a symlink, or is the
    /// root itself.
    Outside,
}

/// Resolves an evidence reference against the repository root without ever
/// trusting `..` or absolute paths, even when the target exists.
pub fn resolve_evidence(root: &Path, raw: &str) -> EvidencePath {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return EvidencePath::Outside;
                }
            }
            Component::RootDir | Component::Prefix(_) => return EvidencePath::Outside,
        }
    }
    if parts.is_empty() {
        return EvidencePath::Outside;
    }

    let rel = parts.join("/");
    let abs = parts.iter().fold(root.to_path_buf(), |acc, p| acc.join(p));
    if !abs.is_file() {
        return EvidencePath::Missing { rel };
    }
    match (fs::canonicalize(root), fs::canonicalize(&abs)) {
        (Ok(root_c), Ok(abs_c)) if abs_c.starts_with(&root_c) && abs_c != root_c => {
            EvidencePath::Inside { rel, abs }
        }
        _ => EvidencePath::Outside,
    }
}

struct ArtifactCheck<'a> {
    file: &'a str,
    ctx: &'a ConformanceContext<'a>,
    out: ConformanceOutcome,
    evidence: BTreeSet<String>,
}

impl<'a> ArtifactCheck<'a> {
    fn push(&mut self, code: FindingCode, message: String) {
        self.out.findings.push(Finding::at(code, self.file, message));
    }

    /// Non-empty string at `key`, or a finding.
    fn required_str<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        label: &str,
    ) -> Option<&'v str> {
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.push(FindingCode::MissingField, format!("missing required field `{label}`"));
                None
            }
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            Some(_) => {
                self.push(
                    FindingCode::InvalidField,
                    format!("`{label}` must be a non-empty string"),
                );
                None
            }
        }
    }

    fn required_snake(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        label: &str,
    ) -> Option<String> {
        let value = self.required_str(obj, key, label)?;
        if is_snake_case(value) {
            Some(value.to_string())
        } else {
            self.push(
                FindingCode::InvalidField,
                format!("`{label}` must be snake_case, got `{value}`"),
            );
            None
        }
    }

    /// Non-empty array at `key`, or a finding.
    fn required_array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        label: &str,
    ) -> Option<&'v Vec<Value>> {
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.push(FindingCode::MissingField, format!("missing required field `{label}`"));
                None
            }
            Some(Value::Array(items)) if !items.is_empty() => Some(items),
            Some(Value::Array(_)) => {
                self.push(
                    FindingCode::InvalidField,
                    format!("`{label}` must contain at least one entry"),
                );
                None
            }
            Some(_) => {
                self.push(FindingCode::InvalidField, format!("`{label}` must be an array"));
                None
            }
        }
    }

    fn generated_at(&mut self, obj: &Map<String, Value>) {
        let Some(raw) = self.required_str(obj, "generatedAtUtc", "generatedAtUtc") else {
            return;
        };
        if raw.chars().count() < MIN_TIMESTAMP_LEN {
            self.push(
                FindingCode::InvalidField,
                format!("`generatedAtUtc` must be a full ISO 8601 timestamp, got `{raw}`"),
            );
            return;
        }
        let Some(ts) = time::parse_timestamp(raw) else {
            self.push(
                FindingCode::InvalidField,
                format!("`generatedAtUtc` is not a valid date-time: `{raw}`"),
            );
            return;
        };
        let age = time::age_in_days(ts.date_naive(), self.ctx.today);
        if age > i64::from(self.ctx.stale_after_days) {
            self.push(
                FindingCode::StaleArtifact,
                format!(
                    "artifact generated {age} days ago (threshold {} days)",
                    self.ctx.stale_after_days
                ),
            );
        }
    }

    fn out_of_scope(&mut self, obj: &Map<String, Value>) {
        let Some(items) = self.required_array(obj, "outOfScope", "outOfScope") else {
            return;
        };
        let mut seen = FxHashSet::default();
        for (idx, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(token) if is_snake_case(token) => {
                    if !seen.insert(token) {
                        self.push(
                            FindingCode::DuplicateOutOfScope,
                            format!("`outOfScope` lists `{token}` more than once"),
                        );
                    }
                }
                _ => self.push(
                    FindingCode::InvalidField,
                    format!("`outOfScope[{idx}]` must be a snake_case string, got {item}"),
                ),
            }
        }
    }

    fn capabilities(&mut self, obj: &Map<String, Value>) {
        let Some(items) = self.required_array(obj, "coreCapabilities", "coreCapabilities") else {
            return;
        };
        let mut seen_ids: FxHashSet<String> = FxHashSet::default();
        for (idx, item) in items.iter().enumerate() {
            self.out.capabilities_checked += 1;
            let label = format!("coreCapabilities[{idx}]");
            let Some(entry) = item.as_object() else {
                self.push(FindingCode::InvalidField, format!("`{label}` must be an object"));
                continue;
            };

            if let Some(id) = self.required_snake(entry, "id", &format!("{label}.id"))
                && !seen_ids.insert(id.clone())
            {
                self.push(
                    FindingCode::DuplicateCapabilityId,
                    format!("capability id `{id}` is declared more than once"),
                );
            }

            match entry.get("status") {
                None | Some(Value::Null) => self.push(
                    FindingCode::MissingField,
                    format!("missing required field `{label}.status`"),
                ),
                Some(Value::String(s)) if CAPABILITY_STATUSES.contains(&s.as_str()) => {}
                Some(other) => self.push(
                    FindingCode::InvalidCapabilityStatus,
                    format!(
                        "`{label}.status` must be one of {}, got {other}",
                        CAPABILITY_STATUSES.join(", ")
                    ),
                ),
            }

            let evidence_label = format!("{label}.evidence");
            if let Some(paths) = self.required_array(entry, "evidence", &evidence_label) {
                for (pidx, path) in paths.iter().enumerate() {
                    match path.as_str().filter(|p| !p.trim().is_empty()) {
                        Some(p) => self.evidence_path(&evidence_label, p),
                        None => self.push(
                            FindingCode::InvalidField,
                            format!("`{evidence_label}[{pidx}]` must be a non-empty path string"),
                        ),
                    }
                }
            }
        }
    }

    fn evidence_path(&mut self, label: &str, raw: &str) {
        self.out.evidence_checked += 1;
        match resolve_evidence(self.ctx.repo_root, raw) {
            EvidencePath::Outside => self.push(
                FindingCode::EvidenceOutsideRepo,
                format!("`{label}` path `{raw}` resolves outside the repository root"),
            ),
            EvidencePath::Missing { rel } => self.push(
                FindingCode::MissingEvidenceFile,
                format!("`{label}` references missing file `{rel}`"),
            ),
            EvidencePath::Inside { rel, abs } => {
                if rel.ends_with(".json") {
                    let parsed = fs::read_to_string(&abs)
                        .map_err(|e| e.to_string())
                        .and_then(|raw| {
                            serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string())
                        });
                    if let Err(e) = parsed {
                        self.out.findings.push(Finding::at(
                            FindingCode::InvalidJson,
                            &rel,
                            format!("evidence referenced by `{label}` is not valid JSON: {e}"),
                        ));
                    }
                }
                self.evidence.insert(rel);
            }
        }
    }
}

/// Validates the raw artifact text. `file` is the artifact's repository
/// relative path, used to attribute findings.
pub fn check_conformance(
    file: &str,
    raw: &str,
    ctx: &ConformanceContext<'_>,
) -> ConformanceOutcome {
    let mut check = ArtifactCheck {
        file,
        ctx,
        out: ConformanceOutcome::default(),
        evidence: BTreeSet::new(),
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            check.push(
                FindingCode::InvalidJson,
                format!("conformance artifact is not valid JSON: {e}"),
            );
            return check.out;
        }
    };
    let Some(obj) = value.as_object() else {
        check.push(
            FindingCode::InvalidField,
            "conformance artifact must be a JSON object".to_string(),
        );
        return check.out;
    };

    check.generated_at(obj);
    check.required_str(obj, "source", "source");
    check.required_snake(obj, "repositoryProfile", "repositoryProfile");
    check.required_str(obj, "purpose", "purpose");
    check.out_of_scope(obj);
    check.capabilities(obj);

    let mut out = check.out;
    out.evidence = check.evidence.into_iter().collect();
    out
}
