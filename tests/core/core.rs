#[path = "../common/mod.rs"]
mod common;

use chrono::NaiveDate;
use common::{ARTIFACT, POLICY_DOCS, valid_repo, write};
use docgate::core::config::GovernanceConfig;
use docgate::core::error::DocgateError;
use docgate::core::finding::FindingCode;
use docgate::core::lifecycle::Bucket;
use docgate::core::report::GovernanceReport;
use docgate::core::validate::{self, VerifyOptions};
use std::fs;
use std::path::Path;

fn options(stale_after_days: u32) -> VerifyOptions {
    VerifyOptions {
        schema_override: None,
        stale_after_days,
        today: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        generated_at_utc: "2026-10-16T12:00:00Z".to_string(),
    }
}

fn verify(root: &Path) -> GovernanceReport {
    validate::run_verification(root, &GovernanceConfig::default(), &options(90))
        .expect("verification should run")
}

fn codes(report: &GovernanceReport) -> Vec<FindingCode> {
    report.errors.iter().map(|f| f.code).collect()
}

#[test]
fn valid_repository_passes_with_zero_errors() {
    let repo = valid_repo();
    let report = verify(repo.path());
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(report.pass);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.counts.documents_analyzed, 5);
    assert_eq!(report.counts.plans_analyzed, 1);
    assert_eq!(report.counts.plans_by_bucket[&Bucket::Active], 1);
    assert_eq!(report.counts.plans_by_bucket[&Bucket::Future], 0);
    assert_eq!(report.counts.capabilities_analyzed, 3);
    assert_eq!(report.counts.evidence_files_checked, 3);
    assert_eq!(
        report.evidence,
        vec!["evidence/auth.json", "evidence/filter.json", "evidence/sandbox.md"]
    );
    assert_eq!(report.summary.total, 7);
    assert_eq!(report.summary.pass_rate, 1.0);
    assert!(report.suites.iter().all(|s| s.status == "passed"));
}

#[test]
fn two_runs_produce_identical_findings_and_digest() {
    let repo = valid_repo();
    let root = repo.path();
    write(root, POLICY_DOCS[1], "# Tool permissions\n\n## Purpose\n");
    write(
        root,
        "docs/plans/completed/auth-hardening.md",
        &common::plan_doc("Auth hardening", "in-progress", ""),
    );
    fs::remove_file(root.join("evidence/auth.json")).unwrap();

    let first = verify(root);
    let second = verify(root);
    assert!(!first.pass);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.digest, second.digest);
    assert_eq!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());
}

#[test]
fn defects_in_every_gate_are_reported_together() {
    let repo = valid_repo();
    let root = repo.path();
    fs::remove_file(root.join(POLICY_DOCS[0])).unwrap();
    write(root, POLICY_DOCS[2], "# Prompt injection\n\n## Metadata\n- Owner: sec\n");
    write(
        root,
        "docs/plans/completed/auth-hardening.md",
        &common::plan_doc("Auth hardening", "in-progress", ""),
    );
    write(
        root,
        ARTIFACT,
        &common::artifact("2026-10-01T09:00:00Z").replace("prompt_filter", "auth_check"),
    );

    let report = verify(root);
    let codes = codes(&report);
    assert!(codes.contains(&FindingCode::MissingFile));
    assert!(codes.contains(&FindingCode::MissingMetadata));
    assert!(codes.contains(&FindingCode::MissingHeading));
    assert!(codes.contains(&FindingCode::InvalidStatusForBucket));
    assert!(codes.contains(&FindingCode::DuplicatePlanId));
    assert!(codes.contains(&FindingCode::DuplicateCapabilityId));
    assert_eq!(report.exit_code(), 1);

    // Findings are grouped by gate: documents, then plans, then conformance.
    let first_plan = codes
        .iter()
        .position(|c| *c == FindingCode::InvalidStatusForBucket)
        .unwrap();
    let first_conformance = codes
        .iter()
        .position(|c| *c == FindingCode::DuplicateCapabilityId)
        .unwrap();
    assert!(codes[..first_plan].contains(&FindingCode::MissingFile));
    assert!(first_plan < first_conformance);
}

#[test]
fn staleness_and_pending_transitions_only_warn() {
    let repo = valid_repo();
    let root = repo.path();
    write(
        root,
        POLICY_DOCS[3],
        &common::policy_doc("Incident response", "2025-01-10"),
    );
    write(
        root,
        "docs/plans/future/sandbox.md",
        &common::plan_doc("Sandbox", "ready-for-promotion", ""),
    );
    write(root, ARTIFACT, &common::artifact("2025-12-01T00:00:00Z"));

    let report = verify(root);
    assert!(report.pass, "{:?}", report.errors);
    let warnings: Vec<FindingCode> = report.warnings.iter().map(|f| f.code).collect();
    assert_eq!(
        warnings,
        vec![
            FindingCode::StaleDocument,
            FindingCode::TransitionPending,
            FindingCode::StaleArtifact,
        ]
    );
    assert_eq!(report.regressions.high_open, 3);
    assert_eq!(report.regressions.critical_open, 0);
}

#[test]
fn threshold_comes_from_options() {
    let repo = valid_repo();
    // Documents were reviewed 45 days ago; the artifact is 15 days old.
    let report =
        validate::run_verification(repo.path(), &GovernanceConfig::default(), &options(30))
            .unwrap();
    assert!(report.pass);
    assert_eq!(report.warnings.len(), 5);
    assert!(
        report
            .warnings
            .iter()
            .all(|f| f.code == FindingCode::StaleDocument)
    );
}

#[test]
fn malformed_artifact_is_a_finding_not_an_abort() {
    let repo = valid_repo();
    write(repo.path(), ARTIFACT, "{\"generatedAtUtc\": ");
    let report = verify(repo.path());
    assert_eq!(codes(&report), vec![FindingCode::InvalidJson]);
    assert_eq!(report.counts.capabilities_analyzed, 0);
    assert_eq!(report.counts.documents_analyzed, 5);
}

#[test]
fn malformed_evidence_json_fails_the_conformance_suite() {
    let repo = valid_repo();
    write(repo.path(), "evidence/auth.json", "{broken");
    let report = verify(repo.path());
    assert_eq!(codes(&report), vec![FindingCode::InvalidJson]);
    assert_eq!(report.errors[0].file.as_deref(), Some("evidence/auth.json"));
    assert!(!report.pass);

    let conformance = &report.suites[2];
    assert_eq!(conformance.id, "conformance_artifact");
    assert_eq!(conformance.status, "failed");
    assert_eq!(
        (conformance.total, conformance.passed, conformance.failed),
        (1, 0, 1)
    );
    assert_eq!(report.summary.total, 7);
    assert_eq!(report.summary.passed, 6);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.pass_rate, 0.8571);
}

#[test]
fn evidence_escaping_the_root_is_rejected() {
    let repo = valid_repo();
    write(
        repo.path(),
        ARTIFACT,
        &common::artifact("2026-10-01T09:00:00Z").replace("evidence/sandbox.md", "../../etc/passwd"),
    );
    let report = verify(repo.path());
    assert_eq!(codes(&report), vec![FindingCode::EvidenceOutsideRepo]);
}

#[test]
fn configured_layout_and_schema_override() {
    let repo = valid_repo();
    let root = repo.path();
    write(root, "governance/runbook.md", "# Runbook\n\n## Metadata\n- Owner: ops\n");
    write(
        root,
        "governance/schema.json",
        r#"{
            "runbook": { "requiredFields": ["Owner", "Pager"], "requiredHeadings": ["Escalation"] },
            "plan": { "requiredFields": ["Status"], "requiredHeadings": [] }
        }"#,
    );
    write(
        root,
        ".docgate/config.toml",
        r#"
schema = "governance/schema.json"
stale_after_days = 400

[[documents]]
path = "governance/runbook.md"
kind = "runbook"

[[documents]]
path = "governance/unknown.md"
kind = "mystery"
"#,
    );
    write(root, "governance/unknown.md", "# ?\n");

    let config = GovernanceConfig::load(root, None).unwrap();
    assert_eq!(config.stale_after_days, 400);
    let report = validate::run_verification(root, &config, &options(400)).unwrap();
    let codes = codes(&report);
    assert_eq!(
        codes,
        vec![
            FindingCode::MissingMetadata,
            FindingCode::MissingHeading,
            FindingCode::MissingSchema,
        ]
    );
    assert_eq!(report.counts.documents_analyzed, 2);
}

#[test]
fn malformed_schema_file_is_fatal() {
    let repo = valid_repo();
    write(repo.path(), "bad-schema.json", "{ not json");
    let mut opts = options(90);
    opts.schema_override = Some(repo.path().join("bad-schema.json"));
    let err = validate::run_verification(repo.path(), &GovernanceConfig::default(), &opts)
        .unwrap_err();
    assert!(matches!(err, DocgateError::SchemaError(_)), "{err}");
}

#[test]
fn report_artifact_is_written_as_json() {
    let repo = valid_repo();
    let report = verify(repo.path());
    let path = repo.path().join("artifacts/governance-report.json");
    report.write_artifact(&path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["pass"], true);
    assert_eq!(json["generatedAtUtc"], "2026-10-16T12:00:00Z");
    assert_eq!(json["counts"]["plansByBucket"]["active"], 1);
    assert_eq!(json["suites"].as_array().unwrap().len(), 3);
}
