//! Governance verification pipeline.
//!
//! Runs the gates in a fixed order and hands every finding to the report
//! builder:
//!
//! - Policy documents: existence, required metadata, required headings,
//!   review staleness
//! - Plan lifecycle: bucket/status consistency, per-bucket required fields,
//!   unique plan ids, pending transitions
//! - Conformance artifact: manifest schema, capability ids, evidence paths
//!
//! Gates never abort on a document defect. Only configuration errors and
//! unreadable files stop the run, before any report exists.

use crate::core::assets;
use crate::core::config::GovernanceConfig;
use crate::core::conformance::{self, ConformanceContext};
use crate::core::corpus::{self, PLAN_KIND};
use crate::core::error::DocgateError;
use crate::core::finding::{Finding, FindingCode, Producer};
use crate::core::lifecycle::{self, Bucket, LifecycleConfig, LifecycleMachine};
use crate::core::metadata::{self, MetadataSection};
use crate::core::report::{GovernanceReport, ReportBuilder};
use crate::core::schema::{self, SchemaSet};
use crate::core::time;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const TRACE_ENV: &str = "DOCGATE_TRACE";
pub const REVIEW_DATE_FIELD: &str = "Last-Reviewed";

/// Per-run inputs resolved before any document is read.
#[derive(Clone, Debug)]
pub struct VerifyOptions {
    /// Schema file that takes precedence over the configured one.
    pub schema_override: Option<PathBuf>,
    pub stale_after_days: u32,
    pub today: NaiveDate,
    pub generated_at_utc: String,
}

fn trace_gate(name: &str) {
    if std::env::var(TRACE_ENV).ok().as_deref() == Some("1") {
        eprintln!("validate: trace {}", name);
    }
}

/// Schema override, else the configured schema file, else the built-in set.
pub fn load_schemas(
    root: &Path,
    config: &GovernanceConfig,
    schema_override: Option<&Path>,
) -> Result<SchemaSet, DocgateError> {
    if let Some(path) = schema_override {
        return SchemaSet::load(path);
    }
    match &config.schema_path {
        Some(rel) => SchemaSet::load(&root.join(rel)),
        None => assets::default_schema(),
    }
}

pub fn lifecycle_machine(schemas: &SchemaSet) -> LifecycleMachine {
    let config = match schemas.get(PLAN_KIND) {
        Some(plan_schema) => LifecycleConfig::default().with_plan_schema(plan_schema),
        None => LifecycleConfig::default(),
    };
    LifecycleMachine::new(config)
}

/// `STALE_DOCUMENT` when `Last-Reviewed` is older than the threshold or is
/// not a `YYYY-MM-DD` date. Documents without the field are not judged.
pub fn check_review_date(
    file: &str,
    md: &MetadataSection,
    today: NaiveDate,
    stale_after_days: u32,
) -> Option<Finding> {
    let raw = md.value(REVIEW_DATE_FIELD)?;
    let Some(reviewed) = time::parse_date(raw) else {
        return Some(Finding::at(
            FindingCode::StaleDocument,
            file,
            format!("`{REVIEW_DATE_FIELD}` is not a YYYY-MM-DD date: `{raw}`"),
        ));
    };
    let age = time::age_in_days(reviewed, today);
    (age > i64::from(stale_after_days)).then(|| {
        Finding::at(
            FindingCode::StaleDocument,
            file,
            format!("last reviewed {age} days ago (threshold {stale_after_days} days)"),
        )
    })
}

fn validate_policy_documents(
    root: &Path,
    config: &GovernanceConfig,
    schemas: &SchemaSet,
    options: &VerifyOptions,
    builder: &mut ReportBuilder,
) -> Result<(), DocgateError> {
    for (doc_ref, doc) in corpus::read_documents(root, &config.documents)? {
        builder.subject(Producer::Documents, &doc_ref.path);
        let Some(doc) = doc else {
            builder.record(
                Producer::Documents,
                [Finding::at(
                    FindingCode::MissingFile,
                    &doc_ref.path,
                    format!("required `{}` document is missing", doc_ref.kind),
                )],
            );
            continue;
        };
        builder.counts_mut().documents_analyzed += 1;
        let md = metadata::extract_metadata(&doc.content);
        let mut findings = schema::check_document(&doc, &md, schemas);
        findings.extend(check_review_date(
            &doc.path,
            &md,
            options.today,
            options.stale_after_days,
        ));
        builder.record(Producer::Documents, findings);
    }
    Ok(())
}

fn validate_plan_lifecycle(
    root: &Path,
    config: &GovernanceConfig,
    schemas: &SchemaSet,
    builder: &mut ReportBuilder,
) -> Result<(), DocgateError> {
    let discovered = corpus::discover_plans(root, &config.plans_root)?;
    let files = corpus::read_plans(root, &discovered)?;

    if schemas.get(PLAN_KIND).is_none() {
        builder.record(
            Producer::Plans,
            files
                .iter()
                .map(|f| schema::missing_schema(&f.document.path, PLAN_KIND)),
        );
    }

    let outcome = lifecycle::track_plans(&files, &lifecycle_machine(schemas));
    for plan in &outcome.plans {
        builder.subject(Producer::Plans, &plan.path);
    }
    let counts = builder.counts_mut();
    counts.plans_analyzed = outcome.plans.len();
    for bucket in Bucket::ALL {
        counts.plans_by_bucket.insert(bucket, outcome.count_in(bucket));
    }
    builder.record(Producer::Plans, outcome.findings);
    Ok(())
}

fn validate_conformance_artifact(
    root: &Path,
    config: &GovernanceConfig,
    options: &VerifyOptions,
    builder: &mut ReportBuilder,
) -> Result<(), DocgateError> {
    let rel = config.conformance_artifact.as_str();
    builder.subject(Producer::Conformance, rel);
    let Some(raw) = corpus::read_if_exists(&root.join(rel))? else {
        builder.record(
            Producer::Conformance,
            [Finding::at(
                FindingCode::MissingFile,
                rel,
                "conformance artifact is missing",
            )],
        );
        return Ok(());
    };

    let ctx = ConformanceContext {
        repo_root: root,
        today: options.today,
        stale_after_days: options.stale_after_days,
    };
    let outcome = conformance::check_conformance(rel, &raw, &ctx);
    let counts = builder.counts_mut();
    counts.capabilities_analyzed = outcome.capabilities_checked;
    counts.evidence_files_checked = outcome.evidence_checked;
    builder.evidence(outcome.evidence);
    builder.record_for(Producer::Conformance, rel, outcome.findings);
    Ok(())
}

pub fn run_verification(
    root: &Path,
    config: &GovernanceConfig,
    options: &VerifyOptions,
) -> Result<GovernanceReport, DocgateError> {
    if !root.is_dir() {
        return Err(DocgateError::PathError(format!(
            "repository root {} is not a directory",
            root.display()
        )));
    }
    let schemas = load_schemas(root, config, options.schema_override.as_deref())?;
    let mut builder = ReportBuilder::new();

    trace_gate("validate_policy_documents");
    validate_policy_documents(root, config, &schemas, options, &mut builder)?;
    trace_gate("validate_plan_lifecycle");
    validate_plan_lifecycle(root, config, &schemas, &mut builder)?;
    trace_gate("validate_conformance_artifact");
    validate_conformance_artifact(root, config, options, &mut builder)?;

    Ok(builder.build(options.generated_at_utc.clone()))
}
