//! Plan lifecycle tracking.
//!
//! A plan's bucket is the directory it sits in (`future/`, `active/`,
//! `completed/`), never its `Status` field. Each bucket is a state of
//! [`LifecycleMachine`] with its own permitted statuses and required fields;
//! the tracker checks that every plan's status is legal for the bucket it
//! occupies, and that plan identifiers are unique across all buckets.
//!
//! Transitions only move forward: `future -> active -> completed`. A plan whose
//! status says it is ready for the next bucket but has not been moved yet is
//! reported as a `TRANSITION_PENDING` warning.

use crate::core::corpus::Document;
use crate::core::finding::{Finding, FindingCode};
use crate::core::markdown;
use crate::core::metadata::{self, MetadataSection};
use crate::core::schema::{self, Schema};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Future,
    Active,
    Completed,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Future, Bucket::Active, Bucket::Completed];

    pub fn dir_name(self) -> &'static str {
        match self {
            Bucket::Future => "future",
            Bucket::Active => "active",
            Bucket::Completed => "completed",
        }
    }

    pub fn next(self) -> Option<Bucket> {
        match self {
            Bucket::Future => Some(Bucket::Active),
            Bucket::Active => Some(Bucket::Completed),
            Bucket::Completed => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.dir_name())
    }
}

pub const DEFAULT_PLAN_FIELDS: &[&str] = &[
    "Status",
    "Priority",
    "Owner",
    "Acceptance-Criteria",
    "Dependencies",
    "Spec-Targets",
    "Done-Evidence",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketRules {
    pub permitted_statuses: Vec<String>,
    pub required_fields: Vec<String>,
    pub required_headings: Vec<String>,
    /// Status that makes a plan eligible for the next bucket.
    pub advance_on: Option<String>,
}

impl BucketRules {
    fn new(statuses: &[&str], advance_on: Option<&str>) -> Self {
        BucketRules {
            permitted_statuses: statuses.iter().map(|s| s.to_string()).collect(),
            required_fields: DEFAULT_PLAN_FIELDS.iter().map(|s| s.to_string()).collect(),
            required_headings: Vec::new(),
            advance_on: advance_on.map(str::to_string),
        }
    }
}

/// Immutable lifecycle configuration, indexed by bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub future: BucketRules,
    pub active: BucketRules,
    pub completed: BucketRules,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            future: BucketRules::new(
                &["draft", "ready-for-promotion"],
                Some("ready-for-promotion"),
            ),
            active: BucketRules::new(
                &[
                    "queued",
                    "in-progress",
                    "blocked",
                    "validation",
                    "completed",
                    "failed",
                ],
                Some("completed"),
            ),
            completed: BucketRules::new(&["completed"], None),
        }
    }
}

impl LifecycleConfig {
    /// Applies a `plan` document schema to every bucket.
    pub fn with_plan_schema(mut self, schema: &Schema) -> Self {
        for rules in [&mut self.future, &mut self.active, &mut self.completed] {
            rules.required_fields = schema.required_fields.clone();
            rules.required_headings = schema.required_headings.clone();
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleState {
    pub bucket: Bucket,
    pub rules: BucketRules,
}

impl LifecycleState {
    pub fn permits(&self, status: &str) -> bool {
        let status = normalize_status(status);
        self.rules.permitted_statuses.iter().any(|s| *s == status)
    }

    /// Bucket the plan should move to, if its status calls for a transition.
    pub fn transition_target(&self, status: &str) -> Option<Bucket> {
        let advance_on = self.rules.advance_on.as_deref()?;
        if normalize_status(status) == advance_on {
            self.bucket.next()
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct LifecycleMachine {
    states: [LifecycleState; 3],
}

impl LifecycleMachine {
    pub fn new(config: LifecycleConfig) -> Self {
        let LifecycleConfig {
            future,
            active,
            completed,
        } = config;
        LifecycleMachine {
            states: [
                LifecycleState {
                    bucket: Bucket::Future,
                    rules: future,
                },
                LifecycleState {
                    bucket: Bucket::Active,
                    rules: active,
                },
                LifecycleState {
                    bucket: Bucket::Completed,
                    rules: completed,
                },
            ],
        }
    }

    pub fn state(&self, bucket: Bucket) -> &LifecycleState {
        &self.states[bucket.index()]
    }
}

impl Default for LifecycleMachine {
    fn default() -> Self {
        LifecycleMachine::new(LifecycleConfig::default())
    }
}

pub fn normalize_status(status: &str) -> String {
    status.trim().to_lowercase()
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
    P3,
}

impl Priority {
    /// Unrecognized or absent values fall back to `p2`.
    pub fn normalize(raw: Option<&str>) -> Priority {
        match raw.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("p0") => Priority::P0,
            Some("p1") | Some("high") => Priority::P1,
            Some("p2") | Some("medium") => Priority::P2,
            Some("p3") | Some("low") => Priority::P3,
            _ => Priority::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P0 => "p0",
            Priority::P1 => "p1",
            Priority::P2 => "p2",
            Priority::P3 => "p3",
        }
    }
}

/// `""`, `none` and `n/a` mean no dependencies. Order and repeats are kept.
pub fn parse_dependencies(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("n/a")
    {
        return Vec::new();
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanIdSource {
    Metadata,
    Heading,
    FileName,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub path: String,
    pub bucket: Bucket,
    pub plan_id: String,
    pub plan_id_source: PlanIdSource,
    pub status: Option<String>,
    pub priority: Priority,
    pub owner: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub dependencies: Vec<String>,
    pub autonomy_allowed: Option<String>,
    pub risk_tier: Option<String>,
    pub spec_targets: Option<String>,
    pub done_evidence: Option<String>,
}

impl Plan {
    pub fn resolve(bucket: Bucket, doc: &Document, md: &MetadataSection) -> Plan {
        let field = |key: &str| md.value(key).map(str::to_string);
        let (plan_id, plan_id_source) = resolve_plan_id(&doc.path, &doc.content, md);
        Plan {
            path: doc.path.clone(),
            bucket,
            plan_id,
            plan_id_source,
            status: field("Status"),
            priority: Priority::normalize(md.value("Priority")),
            owner: field("Owner"),
            acceptance_criteria: field("Acceptance-Criteria"),
            dependencies: parse_dependencies(md.value("Dependencies")),
            autonomy_allowed: field("Autonomy-Allowed"),
            risk_tier: field("Risk-Tier"),
            spec_targets: field("Spec-Targets"),
            done_evidence: field("Done-Evidence"),
        }
    }
}

/// Explicit `Plan-ID`, else the first title's slug, else the file stem's slug.
pub fn resolve_plan_id(path: &str, content: &str, md: &MetadataSection) -> (String, PlanIdSource) {
    if let Some(explicit) = md.value("Plan-ID").filter(|v| !v.is_empty()) {
        return (explicit.to_string(), PlanIdSource::Metadata);
    }
    if let Some((_, title)) = markdown::first_level1(content) {
        let slug = markdown::slugify(title);
        if !slug.is_empty() {
            return (slug, PlanIdSource::Heading);
        }
    }
    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path);
    (markdown::slugify(stem), PlanIdSource::FileName)
}

#[derive(Clone, Debug)]
pub struct PlanFile {
    pub bucket: Bucket,
    pub document: Document,
}

#[derive(Clone, Debug, Default)]
pub struct LifecycleOutcome {
    /// Plans in bucket order, then path order.
    pub plans: Vec<Plan>,
    pub findings: Vec<Finding>,
}

impl LifecycleOutcome {
    pub fn count_in(&self, bucket: Bucket) -> usize {
        self.plans.iter().filter(|p| p.bucket == bucket).count()
    }
}

fn check_plan(
    plan: &Plan,
    doc: &Document,
    md: &MetadataSection,
    state: &LifecycleState,
) -> Vec<Finding> {
    let mut findings = schema::validate_fields(&doc.path, md, &state.rules.required_fields);
    findings.extend(schema::validate_headings(
        &doc.path,
        &doc.content,
        &state.rules.required_headings,
    ));

    let Some(status) = plan.status.as_deref() else {
        return findings;
    };
    if !state.permits(status) {
        findings.push(Finding::at(
            FindingCode::InvalidStatusForBucket,
            &doc.path,
            format!(
                "status `{}` is not permitted in `{}/` (allowed: {})",
                status,
                state.bucket,
                state.rules.permitted_statuses.join(", ")
            ),
        ));
    } else if let Some(target) = state.transition_target(status) {
        findings.push(Finding::at(
            FindingCode::TransitionPending,
            &doc.path,
            format!(
                "plan `{}` has status `{}` and should move from `{}/` to `{}/`",
                plan.plan_id,
                normalize_status(status),
                state.bucket,
                target
            ),
        ));
    }
    findings
}

pub fn track_plans(files: &[PlanFile], machine: &LifecycleMachine) -> LifecycleOutcome {
    let mut ordered: Vec<&PlanFile> = files.iter().collect();
    ordered.sort_by(|a, b| {
        a.bucket
            .cmp(&b.bucket)
            .then_with(|| a.document.path.cmp(&b.document.path))
    });

    let mut outcome = LifecycleOutcome::default();
    let mut first_seen: FxHashMap<String, String> = FxHashMap::default();
    let mut duplicates = Vec::new();

    for file in ordered {
        let md = metadata::extract_metadata(&file.document.content);
        let plan = Plan::resolve(file.bucket, &file.document, &md);
        outcome.findings.extend(check_plan(
            &plan,
            &file.document,
            &md,
            machine.state(file.bucket),
        ));

        match first_seen.get(&plan.plan_id) {
            Some(first) => duplicates.push(Finding::at(
                FindingCode::DuplicatePlanId,
                &plan.path,
                format!("plan id `{}` is already used by {}", plan.plan_id, first),
            )),
            None => {
                first_seen.insert(plan.plan_id.clone(), plan.path.clone());
            }
        }
        outcome.plans.push(plan);
    }

    outcome.findings.extend(duplicates);
    outcome
}
