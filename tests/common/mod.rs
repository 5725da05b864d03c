#![allow(dead_code)]

use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const TODAY: &str = "2026-10-16";

pub const POLICY_DOCS: &[&str] = &[
    "docs/agent-hardening/threat-model.md",
    "docs/agent-hardening/tool-permissions.md",
    "docs/agent-hardening/prompt-injection.md",
    "docs/agent-hardening/incident-response.md",
    "docs/agent-hardening/evaluation.md",
];

pub const ARTIFACT: &str = "docs/conformance/capabilities.json";

pub fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, body).expect("write fixture");
}

pub fn policy_doc(title: &str, last_reviewed: &str) -> String {
    format!(
        "# {title}\n\n\
         ## Metadata\n\n\
         - Owner: security-team\n\
         - Status: approved\n\
         - Version: 1.0\n\
         - Last-Reviewed: {last_reviewed}\n\n\
         ## Purpose\n\nWhy this exists.\n\n\
         ## Scope\n\nAgent runtime.\n\n\
         ## Controls\n\n- Deny by default.\n\n\
         ## Verification\n\nReviewed quarterly.\n"
    )
}

pub fn plan_doc(title: &str, status: &str, extra: &str) -> String {
    format!(
        "# {title}\n\n\
         ## Metadata\n\n\
         - Status: {status}\n\
         - Priority: high\n\
         - Owner: platform\n\
         - Acceptance-Criteria: gate passes\n\
         - Dependencies: none\n\
         - Spec-Targets: docs/agent-hardening/threat-model.md\n\
         - Done-Evidence: evidence/auth.json\n\
         {extra}\n\
         ## Notes\n\nDetails.\n"
    )
}

pub fn artifact(generated_at: &str) -> String {
    json!({
        "generatedAtUtc": generated_at,
        "source": "agent-hardening review",
        "repositoryProfile": "agent_runtime",
        "purpose": "Declare hardened capabilities",
        "outOfScope": ["model_training"],
        "coreCapabilities": [
            {"id": "auth_check", "status": "implemented", "evidence": ["evidence/auth.json"]},
            {"id": "tool_sandbox", "status": "implemented", "evidence": ["evidence/sandbox.md"]},
            {"id": "prompt_filter", "status": "partial", "evidence": ["evidence/filter.json"]},
        ],
    })
    .to_string()
}

/// Five valid policy documents, one active plan and a three-capability
/// artifact with all evidence present.
pub fn valid_repo() -> TempDir {
    let tmp = TempDir::new().expect("tmpdir");
    let root = tmp.path();
    for rel in POLICY_DOCS {
        write(root, rel, &policy_doc("Policy", "2026-09-01"));
    }
    write(
        root,
        "docs/plans/active/auth-hardening.md",
        &plan_doc("Auth hardening", "in-progress", ""),
    );
    write(root, "docs/plans/README.md", "# Plans\n");
    write(root, ARTIFACT, &artifact("2026-10-01T09:00:00Z"));
    write(root, "evidence/auth.json", "{\"ok\": true}\n");
    write(root, "evidence/sandbox.md", "# Sandbox run\n");
    write(root, "evidence/filter.json", "[]\n");
    tmp
}
