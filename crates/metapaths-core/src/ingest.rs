//! JSON-Lines graph records and the two-pass edge source.
//!
//! Node and edge files are consumed as full passes: one node pass to build
//! the type catalog, then two edge passes for matrix construction (register
//! nodes, then fill matrices at frozen dimensions). The edge file is simply
//! re-opened per pass. Unreadable streams are fatal; unknown JSON fields
//! are ignored.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalog::TypeCatalog;
use crate::hierarchy::TypeHierarchy;

const PROGRESS_EVERY: u64 = 1_000_000;

/// One node record: identifier plus its category labels.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub category: Vec<String>,
}

/// One edge record: subject, predicate, object.
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRecord {
    pub subject: String,
    #[serde(default)]
    pub predicate: String,
    pub object: String,
}

fn jsonl_records<T>(path: &Path, what: &'static str) -> Result<impl Iterator<Item = Result<T>>>
where
    T: for<'de> Deserialize<'de>,
{
    let file = File::open(path).with_context(|| format!("opening {what} file {}", path.display()))?;
    let path = path.to_path_buf();
    let lines = BufReader::new(file).lines();

    Ok(lines.enumerate().map(move |(n, line)| {
        let line = line.with_context(|| format!("reading {what} file {}", path.display()))?;
        let record: T = serde_json::from_str(&line)
            .with_context(|| format!("parsing {what} record at {}:{}", path.display(), n + 1))?;
        Ok(record)
    }))
}

/// Build the node-to-type assignment from a nodes file.
pub fn load_type_catalog<H>(path: &Path, hierarchy: &H) -> Result<TypeCatalog>
where
    H: TypeHierarchy + ?Sized,
{
    info!(file = %path.display(), "loading node types");

    let mut catalog = TypeCatalog::default();
    let mut seen = 0u64;
    for record in jsonl_records::<NodeRecord>(path, "nodes")? {
        let record = record?;
        catalog.assign(hierarchy, &record);
        seen += 1;
        if seen % PROGRESS_EVERY == 0 {
            info!(nodes = seen, "node pass progress");
        }
    }

    info!(
        resolved = catalog.len(),
        unresolved = catalog.unresolved(),
        "node types loaded"
    );
    Ok(catalog)
}

/// A re-openable edge stream: the matrix builder takes two full passes.
#[derive(Debug, Clone)]
pub struct EdgeFile {
    path: PathBuf,
}

impl EdgeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open one pass over the edges.
    pub fn pass(&self) -> Result<impl Iterator<Item = Result<EdgeRecord>>> {
        jsonl_records::<EdgeRecord>(&self.path, "edges")
    }
}
