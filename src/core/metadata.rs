//! `## Metadata` section extraction and authoring.
//!
//! A metadata section starts at the first level-2 heading reading `Metadata`
//! and runs over field lines (`- Key: value` or unindented `Key: value`).
//! It ends at the next level-2 heading or at the first non-blank line that is
//! not a field line. Everything past that point is body text.
//!
//! Boundary detection lives in [`locate_metadata_section`] so the read side
//! ([`extract_metadata`]) and the write side ([`upsert_metadata`]) agree on
//! exactly which lines belong to the section.

use crate::core::markdown;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::LazyLock;

pub const METADATA_HEADING: &str = "Metadata";

/// Field order used when writing a metadata section.
pub const CANONICAL_FIELD_ORDER: &[&str] = &[
    "Plan-ID",
    "Status",
    "Priority",
    "Owner",
    "Acceptance-Criteria",
    "Dependencies",
    "Autonomy-Allowed",
    "Risk-Tier",
    "Spec-Targets",
    "Done-Evidence",
];

static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[ \t]*[-*][ \t]+)?([A-Za-z][A-Za-z0-9 \-]*):(.*)$").unwrap()
});

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    /// Trimmed, lowercased key used for lookup and de-duplication.
    pub key: String,
    pub original_key: String,
    pub value: String,
}

/// Ordered metadata fields. Each normalized key appears once; the first
/// textual occurrence wins.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct MetadataSection {
    entries: Vec<MetadataEntry>,
}

impl MetadataSection {
    /// Inserts a field unless its normalized key is already present.
    /// Returns whether the field was kept.
    pub fn insert(&mut self, key: &str, value: &str) -> bool {
        let normalized = normalize_key(key);
        if self.entries.iter().any(|e| e.key == normalized) {
            return false;
        }
        self.entries.push(MetadataEntry {
            key: normalized,
            original_key: key.trim().to_string(),
            value: value.trim().to_string(),
        });
        true
    }

    pub fn get(&self, key: &str) -> Option<&MetadataEntry> {
        let normalized = normalize_key(key);
        self.entries.iter().find(|e| e.key == normalized)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|e| e.value.as_str())
    }

    /// Present means an entry exists, even with an empty value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    /// Current fields with `updates` applied: matching keys are overwritten in
    /// place, new keys are appended. Original key spelling is kept for
    /// existing fields.
    pub fn merged_with(&self, updates: &[(String, String)]) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|e| (e.original_key.clone(), e.value.clone()))
            .collect();
        for (key, value) in updates {
            let normalized = normalize_key(key);
            match out.iter_mut().find(|(k, _)| normalize_key(k) == normalized) {
                Some(existing) => existing.1 = value.trim().to_string(),
                None => out.push((key.trim().to_string(), value.trim().to_string())),
            }
        }
        out
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Line indices of a metadata section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionSpan {
    /// The `## Metadata` line.
    pub heading: usize,
    pub body_start: usize,
    /// Exclusive end: one past the last field line. Trailing blanks are not
    /// part of the section.
    pub end: usize,
}

/// Splits a field line into `(key, value)`, both trimmed.
pub fn parse_field_line(line: &str) -> Option<(&str, &str)> {
    let caps = FIELD_LINE.captures(line)?;
    let key = caps.get(1)?.as_str().trim();
    let value = caps.get(2).map(|m| m.as_str()).unwrap_or("").trim();
    Some((key, value))
}

pub fn locate_metadata_section(text: &str) -> Option<SectionSpan> {
    let lines: Vec<&str> = text.lines().collect();
    let heading = lines
        .iter()
        .position(|line| markdown::level2_text(line) == Some(METADATA_HEADING))?;
    let body_start = heading + 1;
    let mut end = body_start;
    for (idx, line) in lines.iter().enumerate().skip(body_start) {
        if line.trim().is_empty() {
            continue;
        }
        if markdown::is_level2(line) || parse_field_line(line).is_none() {
            break;
        }
        end = idx + 1;
    }
    Some(SectionSpan {
        heading,
        body_start,
        end,
    })
}

pub fn extract_metadata(text: &str) -> MetadataSection {
    let mut section = MetadataSection::default();
    let Some(span) = locate_metadata_section(text) else {
        return section;
    };
    for line in text
        .lines()
        .skip(span.body_start)
        .take(span.end - span.body_start)
    {
        if let Some((key, value)) = parse_field_line(line) {
            section.insert(key, value);
        }
    }
    section
}

fn canonical_rank(key: &str) -> usize {
    CANONICAL_FIELD_ORDER
        .iter()
        .position(|known| known.eq_ignore_ascii_case(key.trim()))
        .unwrap_or(CANONICAL_FIELD_ORDER.len())
}

/// Known fields in canonical order, then unknown fields alphabetically.
/// Later duplicates of a normalized key are dropped.
pub fn canonical_order(fields: &[(String, String)]) -> Vec<(String, String)> {
    let mut seen = FxHashSet::default();
    let mut out: Vec<(String, String)> = fields
        .iter()
        .filter(|(k, _)| seen.insert(normalize_key(k)))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    out.sort_by_cached_key(|(k, _)| (canonical_rank(k), k.to_lowercase()));
    out
}

pub fn render_metadata_section(fields: &[(String, String)]) -> String {
    let mut out = format!("## {METADATA_HEADING}\n\n");
    for (key, value) in canonical_order(fields) {
        let line = format!("- {key}: {value}");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Replaces the metadata section in place, or inserts one after the first
/// level-1 heading (at the top when there is none). Trailing blank lines are
/// dropped and the output ends with exactly one line terminator, CRLF when the
/// input uses CRLF. Other lines keep their trailing whitespace.
pub fn upsert_metadata(text: &str, fields: &[(String, String)]) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let rendered = render_metadata_section(fields);
    let block: Vec<&str> = rendered.lines().collect();

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + block.len() + 2);
    if let Some(span) = locate_metadata_section(text) {
        out.extend_from_slice(&lines[..span.heading]);
        out.extend_from_slice(&block);
        out.extend_from_slice(&lines[span.end..]);
    } else {
        let (head, rest) = match markdown::first_level1(text) {
            Some((idx, _)) => (&lines[..=idx], &lines[idx + 1..]),
            None => (&lines[..0], &lines[..]),
        };
        let rest_start = rest
            .iter()
            .position(|l| !l.trim().is_empty())
            .unwrap_or(rest.len());
        out.extend_from_slice(head);
        if !head.is_empty() {
            out.push("");
        }
        out.extend_from_slice(&block);
        if rest_start < rest.len() {
            out.push("");
            out.extend_from_slice(&rest[rest_start..]);
        }
    }

    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let mut joined = out.join(eol);
    joined.push_str(eol);
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn absent_heading_yields_empty_section() {
        let doc = "# Title\n\nOwner: nobody\n";
        assert!(locate_metadata_section(doc).is_none());
        assert!(extract_metadata(doc).is_empty());
    }

    #[test]
    fn both_field_forms_are_accepted() {
        let doc = "# T\n\n## Metadata\n\n- Owner: sec-team\n  - Status: draft\nPriority: High\n";
        let md = extract_metadata(doc);
        assert_eq!(md.value("owner"), Some("sec-team"));
        assert_eq!(md.value("STATUS"), Some("draft"));
        assert_eq!(md.value("Priority"), Some("High"));
        assert_eq!(md.get("priority").unwrap().original_key, "Priority");
    }

    #[test]
    fn first_duplicate_wins() {
        let doc = "## Metadata\n- Status: draft\n- Owner: a\n- Status: queued\n";
        let md = extract_metadata(doc);
        assert_eq!(md.value("Status"), Some("draft"));
        assert_eq!(md.len(), 2);
    }

    #[test]
    fn paragraph_terminates_section() {
        let doc = "## Metadata\n- Owner: a\nThis plan covers: everything\n- Status: draft\n";
        // "This plan covers" is a valid key shape, so it is still a field.
        assert_eq!(extract_metadata(doc).len(), 3);

        let doc = "## Metadata\n- Owner: a\n\nA paragraph without a colon.\n- Status: draft\n";
        let md = extract_metadata(doc);
        assert_eq!(md.len(), 1);
        assert!(!md.contains("Status"));
    }

    #[test]
    fn next_level2_heading_terminates_section() {
        let doc = "## Metadata\n- Owner: a\n\n## Scope\n- Status: draft\n";
        let span = locate_metadata_section(doc).unwrap();
        assert_eq!(
            span,
            SectionSpan {
                heading: 0,
                body_start: 1,
                end: 2
            }
        );
        assert!(!extract_metadata(doc).contains("Status"));
    }

    #[test]
    fn blank_lines_inside_section_are_skipped() {
        let doc = "## Metadata\n\n- Owner: a\n\n\n- Status: draft\n\n\nBody text.\n";
        let span = locate_metadata_section(doc).unwrap();
        assert_eq!(span.end, 6);
        assert_eq!(extract_metadata(doc).len(), 2);
    }

    #[test]
    fn internal_key_spacing_is_significant() {
        let doc = "## Metadata\n- Risk Tier: high\n- Risk  Tier: low\n-  risk tier : medium\n";
        let md = extract_metadata(doc);
        assert_eq!(md.len(), 2);
        assert_eq!(md.value("risk tier"), Some("high"));
        assert_eq!(md.value("Risk  Tier"), Some("low"));
    }

    #[test]
    fn indented_unbulleted_line_is_body_text() {
        let doc = "## Metadata\n- Owner: a\n    Status: draft\n";
        assert_eq!(extract_metadata(doc).len(), 1);
    }

    #[test]
    fn extraction_is_idempotent() {
        let doc = "# P\n## Metadata\n- Plan-ID: p-1\n- Status: draft\n## Body\n";
        assert_eq!(extract_metadata(doc), extract_metadata(doc));
    }

    #[test]
    fn canonical_order_puts_unknown_fields_last_alphabetically() {
        let ordered = canonical_order(&fields(&[
            ("zeta", "1"),
            ("Owner", "o"),
            ("alpha", "2"),
            ("plan-id", "p"),
            ("Done-Evidence", "e"),
            ("Owner", "ignored"),
        ]));
        let keys: Vec<&str> = ordered.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["plan-id", "Owner", "Done-Evidence", "alpha", "zeta"]);
        assert_eq!(ordered[1].1, "o");
    }

    #[test]
    fn upsert_inserts_after_first_title() {
        let doc = "# Plan A\nIntro paragraph.\n\n## Scope\nStuff\n";
        let out = upsert_metadata(doc, &fields(&[("Status", "draft"), ("Plan-ID", "a")]));
        assert_eq!(
            out,
            "# Plan A\n\n## Metadata\n\n- Plan-ID: a\n- Status: draft\n\nIntro paragraph.\n\n## Scope\nStuff\n"
        );
        assert_eq!(extract_metadata(&out).value("Plan-ID"), Some("a"));
    }

    #[test]
    fn upsert_replaces_in_place_and_is_idempotent() {
        let doc = "# P\n\n## Metadata\n\n- Status: draft\n- Owner: a\n\n## Scope\nBody\n\n\n";
        let f = fields(&[("Owner", "b"), ("Status", "queued"), ("Risk-Tier", "")]);
        let once = upsert_metadata(doc, &f);
        assert_eq!(
            once,
            "# P\n\n## Metadata\n\n- Status: queued\n- Owner: b\n- Risk-Tier:\n\n## Scope\nBody\n"
        );
        assert_eq!(upsert_metadata(&once, &f), once);
        assert_eq!(extract_metadata(&once).value("Risk-Tier"), Some(""));
    }

    #[test]
    fn upsert_without_title_inserts_at_top() {
        let out = upsert_metadata("\n\nBody only", &fields(&[("Owner", "x")]));
        assert_eq!(out, "## Metadata\n\n- Owner: x\n\nBody only\n");
    }

    #[test]
    fn upsert_keeps_crlf_line_endings() {
        let doc = "# P\r\n\r\n## Metadata\r\n\r\n- Status: draft\r\n\r\n## Scope\r\nBody\r\n";
        let out = upsert_metadata(doc, &fields(&[("Status", "queued")]));
        assert_eq!(
            out,
            "# P\r\n\r\n## Metadata\r\n\r\n- Status: queued\r\n\r\n## Scope\r\nBody\r\n"
        );
        assert!(!out.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn upsert_keeps_trailing_hard_break() {
        let doc = "# P\n\n## Metadata\n\n- Status: draft\n\n## Notes\nLine with hard break  \n\n";
        let out = upsert_metadata(doc, &fields(&[("Status", "queued")]));
        assert!(out.ends_with("## Notes\nLine with hard break  \n"), "{out:?}");
    }

    #[test]
    fn merged_with_overwrites_and_appends() {
        let md = extract_metadata("## Metadata\n- status: draft\n- Owner: a\n");
        let merged = md.merged_with(&fields(&[("Status", "queued"), ("Priority", "p1")]));
        assert_eq!(
            merged,
            fields(&[("status", "queued"), ("Owner", "a"), ("Priority", "p1")])
        );
    }
}
