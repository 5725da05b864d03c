//! Aggregation of validator findings into the governance report.
//!
//! Ordering is fixed here and nowhere else: producer, then file path
//! (file-less findings first), then emission order. Two runs over the same
//! tree therefore yield identical finding lists and the same digest.

use crate::core::error::DocgateError;
use crate::core::finding::{Finding, Producer};
use crate::core::lifecycle::Bucket;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub documents_analyzed: usize,
    pub plans_analyzed: usize,
    pub plans_by_bucket: BTreeMap<Bucket, usize>,
    pub capabilities_analyzed: usize,
    pub evidence_files_checked: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Regressions {
    pub critical_open: usize,
    pub high_open: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    pub id: String,
    pub status: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceReport {
    pub generated_at_utc: String,
    pub pass: bool,
    pub summary: Summary,
    pub regressions: Regressions,
    pub suites: Vec<Suite>,
    pub counts: Counts,
    pub warnings: Vec<Finding>,
    pub errors: Vec<Finding>,
    pub evidence: Vec<String>,
    pub digest: String,
}

impl GovernanceReport {
    /// Non-zero iff there is at least one error. Warnings never fail a run.
    pub fn exit_code(&self) -> i32 {
        if self.pass { 0 } else { 1 }
    }

    pub fn to_json_pretty(&self) -> Result<String, DocgateError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DocgateError::ValidationError(format!("Unable to serialize report: {e}")))
    }

    pub fn write_artifact(&self, path: &Path) -> Result<(), DocgateError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DocgateError::io_at(parent, e))?;
        }
        let mut body = self.to_json_pretty()?;
        body.push('\n');
        fs::write(path, body).map_err(|e| DocgateError::io_at(path, e))
    }
}

/// Collects findings and subjects from each producer before building the
/// final report.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    entries: Vec<(Producer, Option<String>, Finding)>,
    subjects: BTreeMap<Producer, BTreeSet<String>>,
    evidence: BTreeSet<String>,
    counts: Counts,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, producer: Producer, findings: impl IntoIterator<Item = Finding>) {
        self.entries
            .extend(findings.into_iter().map(|f| (producer, None, f)));
    }

    /// Records findings that count against `subject` in the suite tallies,
    /// whatever file they point at.
    pub fn record_for(
        &mut self,
        producer: Producer,
        subject: &str,
        findings: impl IntoIterator<Item = Finding>,
    ) {
        self.entries.extend(
            findings
                .into_iter()
                .map(|f| (producer, Some(subject.to_string()), f)),
        );
    }

    /// Registers a file a producer looked at, for the per-suite tallies.
    pub fn subject(&mut self, producer: Producer, path: &str) {
        self.subjects
            .entry(producer)
            .or_default()
            .insert(path.to_string());
    }

    pub fn evidence(&mut self, paths: impl IntoIterator<Item = String>) {
        self.evidence.extend(paths);
    }

    pub fn counts_mut(&mut self) -> &mut Counts {
        &mut self.counts
    }

    fn suite(&self, producer: Producer) -> Suite {
        let subjects = self.subjects.get(&producer);
        let mut failing: BTreeSet<&str> = BTreeSet::new();
        let mut has_errors = false;
        for (p, charge, f) in &self.entries {
            if *p != producer || !f.is_error() {
                continue;
            }
            has_errors = true;
            if let Some(file) = charge.as_deref().or(f.file.as_deref())
                && subjects.is_some_and(|s| s.contains(file))
            {
                failing.insert(file);
            }
        }
        // An error tied to no registered subject still fails one.
        let failed = if has_errors { failing.len().max(1) } else { 0 };
        let total = subjects.map_or(0, BTreeSet::len).max(failed);
        Suite {
            id: producer.suite_id().to_string(),
            status: if has_errors { "failed" } else { "passed" }.to_string(),
            total,
            passed: total - failed,
            failed,
        }
    }

    pub fn build(self, generated_at_utc: String) -> GovernanceReport {
        let suites: Vec<Suite> = Producer::ALL.iter().map(|p| self.suite(*p)).collect();

        let mut entries = self.entries;
        // Stable: emission order survives within a (producer, file) group.
        entries.sort_by(|(pa, _, fa), (pb, _, fb)| {
            pa.cmp(pb).then_with(|| fa.file.cmp(&fb.file))
        });
        let (errors, warnings): (Vec<Finding>, Vec<Finding>) = entries
            .into_iter()
            .map(|(_, _, f)| f)
            .partition(Finding::is_error);

        let total: usize = suites.iter().map(|s| s.total).sum();
        let passed: usize = suites.iter().map(|s| s.passed).sum();
        let failed: usize = suites.iter().map(|s| s.failed).sum();
        let pass_rate = if total == 0 {
            1.0
        } else {
            (passed as f64 / total as f64 * 10_000.0).round() / 10_000.0
        };

        GovernanceReport {
            generated_at_utc,
            pass: errors.is_empty(),
            summary: Summary {
                total,
                passed,
                failed,
                pass_rate,
            },
            regressions: Regressions {
                critical_open: errors.len(),
                high_open: warnings.len(),
            },
            suites,
            counts: self.counts,
            digest: findings_digest(&warnings, &errors),
            warnings,
            errors,
            evidence: self.evidence.into_iter().collect(),
        }
    }
}

/// SHA-256 over the ordered warning and error lists.
pub fn findings_digest(warnings: &[Finding], errors: &[Finding]) -> String {
    let canonical = serde_json::json!({ "warnings": warnings, "errors": errors });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
