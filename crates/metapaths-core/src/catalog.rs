//! Catalogs: node-to-type assignment and the typed relation matrix registry.
//!
//! `TypeCatalog` is the per-run registry mapping node identifiers to their
//! resolved type label. `TypeIndex` gives each node a dense integer inside
//! its type, so matrices stay small and bitmap-friendly. `RelationCatalog`
//! owns every `TypedRelationKey -> RelationMatrix` binding for the run,
//! grouped by source type for the nested chain join, plus the per-type-pair
//! ANY aggregates.

use crate::hierarchy::{resolve_primary_type, TypeHierarchy};
use crate::ingest::NodeRecord;
use crate::intern::{PredId, TypeId, Vocabulary};
use crate::matrix::RelationMatrix;
use ahash::AHashMap;
use std::sync::Arc;

/// Orientation of a relation matrix relative to its stored edge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn flip(self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// Single-letter form used in metapath strings.
    pub fn letter(self) -> &'static str {
        match self {
            Direction::Forward => "F",
            Direction::Reverse => "R",
        }
    }
}

/// Identifies one relation matrix in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypedRelationKey {
    pub source_type: TypeId,
    pub predicate: PredId,
    pub target_type: TypeId,
    pub direction: Direction,
}

impl TypedRelationKey {
    pub fn forward(source_type: TypeId, predicate: PredId, target_type: TypeId) -> Self {
        Self {
            source_type,
            predicate,
            target_type,
            direction: Direction::Forward,
        }
    }

    /// The key naming this relation walked the other way.
    pub fn flipped(self) -> Self {
        Self {
            source_type: self.target_type,
            predicate: self.predicate,
            target_type: self.source_type,
            direction: self.direction.flip(),
        }
    }
}

/// Per-type bijection from node identifier to a dense index.
///
/// Grows monotonically as nodes of the type are observed during edge
/// ingestion; never shrinks and is never reused across runs.
#[derive(Debug, Default)]
pub struct TypeIndex {
    index: AHashMap<String, u32>,
}

impl TypeIndex {
    /// Register a node, returning its dense index (existing or new).
    pub fn observe(&mut self, node: &str) -> u32 {
        if let Some(&idx) = self.index.get(node) {
            return idx;
        }
        let idx = self.index.len() as u32;
        self.index.insert(node.to_string(), idx);
        idx
    }

    pub fn get(&self, node: &str) -> Option<u32> {
        self.index.get(node).copied()
    }

    pub fn len(&self) -> u32 {
        self.index.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Node identifier -> resolved type label, built from one node-record pass.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    assignments: AHashMap<String, String>,
    unresolved: u64,
}

impl TypeCatalog {
    /// Resolve every node record through the hierarchy oracle. Nodes whose
    /// categories are all unknown are dropped and counted, never fatal.
    pub fn from_records<H, I>(hierarchy: &H, records: I) -> Self
    where
        H: TypeHierarchy + ?Sized,
        I: IntoIterator<Item = NodeRecord>,
    {
        let mut catalog = Self::default();
        for record in records {
            catalog.assign(hierarchy, &record);
        }
        catalog
    }

    pub fn assign<H>(&mut self, hierarchy: &H, record: &NodeRecord)
    where
        H: TypeHierarchy + ?Sized,
    {
        match resolve_primary_type(hierarchy, &record.category) {
            Some(label) => {
                self.assignments.insert(record.id.clone(), label.to_string());
            }
            None => self.unresolved += 1,
        }
    }

    pub fn type_of(&self, node: &str) -> Option<&str> {
        self.assignments.get(node).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Nodes dropped because no category label resolved.
    pub fn unresolved(&self) -> u64 {
        self.unresolved
    }
}

/// Every relation matrix of one analysis run, read-only after build.
#[derive(Debug, Default)]
pub struct RelationCatalog {
    vocab: Vocabulary,
    entries: AHashMap<TypedRelationKey, Arc<RelationMatrix>>,
    keys: Vec<TypedRelationKey>,
    by_source_type: AHashMap<TypeId, Vec<TypedRelationKey>>,
    aggregates: AHashMap<(TypeId, TypeId), Arc<RelationMatrix>>,
    type_sizes: AHashMap<TypeId, u32>,
}

impl RelationCatalog {
    pub(crate) fn new(vocab: Vocabulary, type_sizes: AHashMap<TypeId, u32>) -> Self {
        Self {
            vocab,
            type_sizes,
            ..Self::default()
        }
    }

    pub(crate) fn insert(&mut self, key: TypedRelationKey, matrix: Arc<RelationMatrix>) {
        debug_assert!(!self.entries.contains_key(&key));
        self.keys.push(key);
        self.by_source_type
            .entry(key.source_type)
            .or_default()
            .push(key);
        self.entries.insert(key, matrix);
    }

    pub(crate) fn insert_aggregate(
        &mut self,
        pair: (TypeId, TypeId),
        matrix: Arc<RelationMatrix>,
    ) {
        self.aggregates.insert(pair, matrix);
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Every key, forward and reverse, in insertion order.
    pub fn keys(&self) -> &[TypedRelationKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matrix(&self, key: &TypedRelationKey) -> Option<&Arc<RelationMatrix>> {
        self.entries.get(key)
    }

    /// Keys whose source type is `ty`, the join fan-out for chain hops.
    pub fn keys_from(&self, ty: TypeId) -> &[TypedRelationKey] {
        self.by_source_type
            .get(&ty)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keys connecting exactly `source` to `target`, any predicate or
    /// direction.
    pub fn keys_between(
        &self,
        source: TypeId,
        target: TypeId,
    ) -> impl Iterator<Item = TypedRelationKey> + '_ {
        self.keys_from(source)
            .iter()
            .copied()
            .filter(move |k| k.target_type == target)
    }

    /// Union of all relations connecting `source` to `target`: "does some
    /// direct edge exist regardless of type".
    pub fn aggregate(&self, source: TypeId, target: TypeId) -> Option<&Arc<RelationMatrix>> {
        self.aggregates.get(&(source, target))
    }

    /// Number of nodes indexed for a type (matrix dimensions derive from
    /// this, frozen at build time).
    pub fn type_size(&self, ty: TypeId) -> u32 {
        self.type_sizes.get(&ty).copied().unwrap_or(0)
    }

    /// The matrix of `key` walked the other way.
    ///
    /// Reverse keys were materialized once at build time, so this is a
    /// catalog lookup, not an allocation. Symmetric predicates have no
    /// stored partner: their transpose is definitionally the matrix itself
    /// when square; the rare non-square symmetric triple falls back to a
    /// computed transpose.
    pub fn transposed_matrix(&self, key: &TypedRelationKey) -> Option<Arc<RelationMatrix>> {
        if let Some(m) = self.entries.get(&key.flipped()) {
            return Some(Arc::clone(m));
        }
        let own = self.entries.get(key)?;
        if own.nrows() == own.ncols() {
            Some(Arc::clone(own))
        } else {
            Some(Arc::new(own.transpose()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_index_assigns_dense_stable_indices() {
        let mut idx = TypeIndex::default();
        let a = idx.observe("n:a");
        let b = idx.observe("n:b");
        let a_again = idx.observe("n:a");

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(a, a_again);
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.get("n:b"), Some(1));
        assert_eq!(idx.get("n:c"), None);
    }

    #[test]
    fn flipped_key_swaps_types_and_direction() {
        let vocab = Vocabulary::new();
        let key = TypedRelationKey::forward(
            vocab.type_id("A"),
            vocab.pred_id("p"),
            vocab.type_id("B"),
        );
        let rev = key.flipped();

        assert_eq!(rev.source_type, key.target_type);
        assert_eq!(rev.target_type, key.source_type);
        assert_eq!(rev.direction, Direction::Reverse);
        assert_eq!(rev.flipped(), key);
    }
}
