//! Candidate document discovery and read-only loading.
//!
//! Reads fan out across the rayon pool, one file per task. Results are
//! collected back in input order so downstream validation sees a stable
//! sequence regardless of scheduling.

use crate::core::error::DocgateError;
use crate::core::lifecycle::{Bucket, PlanFile};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

pub const PLAN_KIND: &str = "plan";

/// A document read for the duration of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Repository-relative, forward slashes.
    pub path: String,
    pub kind: String,
    pub content: String,
}

/// A document the configuration requires to exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub path: String,
    pub kind: String,
}

/// Repository-relative display form of `path`.
pub fn rel_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn read_if_exists(path: &Path) -> Result<Option<String>, DocgateError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DocgateError::io_at(path, e)),
    }
}

/// Reads every referenced document. `None` marks a file that does not exist;
/// any other I/O failure aborts the run.
pub fn read_documents(
    root: &Path,
    refs: &[DocumentRef],
) -> Result<Vec<(DocumentRef, Option<Document>)>, DocgateError> {
    refs.par_iter()
        .map(|r| {
            let content = read_if_exists(&root.join(&r.path))?;
            let doc = content.map(|content| Document {
                path: r.path.clone(),
                kind: r.kind.clone(),
                content,
            });
            Ok((r.clone(), doc))
        })
        .collect()
}

fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DocgateError> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir).map_err(|e| DocgateError::io_at(dir, e))? {
        let entry = entry.map_err(|e| DocgateError::io_at(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "md") && !is_readme(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_readme(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case("README.md"))
}

/// Plan files under `<plans_root>/{future,active,completed}/`, sorted by
/// bucket then path. Bucket index files (`README.md`) are not plans.
pub fn discover_plans(
    root: &Path,
    plans_root: &str,
) -> Result<Vec<(Bucket, String)>, DocgateError> {
    let mut found = Vec::new();
    for bucket in Bucket::ALL {
        let mut paths = Vec::new();
        collect_markdown(&root.join(plans_root).join(bucket.dir_name()), &mut paths)?;
        let mut rels: Vec<String> = paths.iter().map(|p| rel_path(root, p)).collect();
        rels.sort();
        found.extend(rels.into_iter().map(|rel| (bucket, rel)));
    }
    Ok(found)
}

pub fn read_plans(
    root: &Path,
    discovered: &[(Bucket, String)],
) -> Result<Vec<PlanFile>, DocgateError> {
    discovered
        .par_iter()
        .map(|(bucket, rel)| {
            let path = root.join(rel);
            let content =
                fs::read_to_string(&path).map_err(|e| DocgateError::io_at(&path, e))?;
            Ok(PlanFile {
                bucket: *bucket,
                document: Document {
                    path: rel.clone(),
                    kind: PLAN_KIND.to_string(),
                    content,
                },
            })
        })
        .collect()
}
