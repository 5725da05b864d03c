//! Console transcript rendering for verification runs.
//!
//! Keeps lines bounded and readable: warnings first, then errors, then one
//! verdict line that CI logs can grep for.

use crate::core::finding::{Finding, Severity};
use crate::core::report::GovernanceReport;
use colored::Colorize;

const MAX_MESSAGE_CHARS: usize = 160;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// `WARN [CODE] file: message` without color, for logs and tests.
pub fn finding_line(finding: &Finding) -> String {
    let tag = match finding.severity {
        Severity::Warning => "WARN",
        Severity::Error => "ERROR",
    };
    let message = compact_line(&finding.message, MAX_MESSAGE_CHARS);
    match &finding.file {
        Some(file) => format!("{tag} [{}] {file}: {message}", finding.code),
        None => format!("{tag} [{}] {message}", finding.code),
    }
}

pub fn verdict_line(report: &GovernanceReport) -> String {
    format!(
        "docgate: {} errors={} warnings={} documents={} plans={} capabilities={}",
        if report.pass { "PASS" } else { "FAIL" },
        report.errors.len(),
        report.warnings.len(),
        report.counts.documents_analyzed,
        report.counts.plans_analyzed,
        report.counts.capabilities_analyzed,
    )
}

/// Plain transcript, one finding per line, verdict last.
pub fn render_transcript(report: &GovernanceReport) -> Vec<String> {
    report
        .warnings
        .iter()
        .chain(report.errors.iter())
        .map(finding_line)
        .chain(std::iter::once(verdict_line(report)))
        .collect()
}

pub fn print_transcript(report: &GovernanceReport) {
    for finding in report.warnings.iter().chain(report.errors.iter()) {
        let line = finding_line(finding);
        match finding.severity {
            Severity::Warning => println!("{}", line.bright_yellow()),
            Severity::Error => println!("{}", line.bright_red()),
        }
    }
    let verdict = verdict_line(report);
    if report.pass {
        println!("{}", verdict.bright_green().bold());
    } else {
        println!("{}", verdict.bright_red().bold());
    }
}
