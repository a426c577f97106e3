//! Type-hierarchy oracle: which of a node's category labels is primary.
//!
//! The graph's node records carry several category labels per node; matrix
//! construction wants exactly one type per node. The oracle answers "how
//! many ancestors does this label have in the is-a hierarchy" and the most
//! specific label (most ancestors, deepest in the tree) wins. The hierarchy
//! itself is external data, so the oracle is a trait seam: production loads
//! an ancestor table from JSON, tests hand in a closure-sized fake.

use ahash::AHashMap;
use anyhow::{Context, Result};
use std::path::Path;

/// Ancestor counts over a fixed is-a hierarchy.
///
/// `None` means the label is unknown to the hierarchy; unknown labels never
/// participate in resolution.
pub trait TypeHierarchy {
    fn ancestor_count(&self, label: &str) -> Option<usize>;
}

/// Pick the most specific label: most ancestors wins, ties break to the
/// lexicographically greatest label. Returns `None` when no label is known
/// to the hierarchy; the caller drops the node from matrix construction.
pub fn resolve_primary_type<'a, H>(hierarchy: &H, categories: &'a [String]) -> Option<&'a str>
where
    H: TypeHierarchy + ?Sized,
{
    categories
        .iter()
        .filter_map(|label| {
            hierarchy
                .ancestor_count(label)
                .map(|depth| (depth, label.as_str()))
        })
        .max()
        .map(|(_, label)| label)
}

/// Ancestor table loaded from a JSON object: `label -> [ancestor, ...]`.
#[derive(Debug, Default)]
pub struct AncestorTable {
    counts: AHashMap<String, usize>,
}

impl AncestorTable {
    pub fn from_ancestor_lists<I, S, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<A>)>,
        S: Into<String>,
        A: AsRef<str>,
    {
        let counts = entries
            .into_iter()
            .map(|(label, ancestors)| (label.into(), ancestors.len()))
            .collect();
        Self { counts }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading hierarchy file {}", path.display()))?;
        let lists: AHashMap<String, Vec<String>> = serde_json::from_str(&text)
            .with_context(|| format!("parsing hierarchy file {}", path.display()))?;
        Ok(Self::from_ancestor_lists(lists))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl TypeHierarchy for AncestorTable {
    fn ancestor_count(&self, label: &str) -> Option<usize> {
        self.counts.get(label).copied()
    }
}
