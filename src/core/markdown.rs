//! Line-level markdown helpers.
//!
//! This is not a markdown parser. It recognizes ATX headings by their leading
//! `#` run, which is all the governance checks need.

/// Returns `(level, text)` when `line` is an ATX heading.
pub fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    let rest = &trimmed[level..];
    if rest.is_empty() {
        return Some((level, ""));
    }
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level, rest.trim()))
}

pub fn level2_text(line: &str) -> Option<&str> {
    match heading(line) {
        Some((2, text)) => Some(text),
        _ => None,
    }
}

pub fn is_level2(line: &str) -> bool {
    level2_text(line).is_some()
}

/// True when some line is a level-2 heading reading exactly `text`.
pub fn has_level2(content: &str, text: &str) -> bool {
    let wanted = text.trim();
    content
        .lines()
        .filter_map(level2_text)
        .any(|found| found == wanted)
}

/// Index and text of the first level-1 heading.
pub fn first_level1(content: &str) -> Option<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .find_map(|(idx, line)| match heading(line) {
            Some((1, text)) => Some((idx, text)),
            _ => None,
        })
}

/// Lowercase, collapse non-alphanumeric runs to one hyphen, strip edge hyphens.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}
