//! Label interning: type labels and predicates stored once, referenced by id.
//!
//! Metapath analysis touches the same handful of type/predicate labels
//! billions of times while joining relation keys, so keys carry 4-byte ids
//! and the strings live here. Types and predicates get separate id spaces:
//! a `TypeId` can never be confused with a `PredId` at a join seam.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Interned type label (e.g. `Gene`, `SmallMolecule`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Interned predicate label (e.g. `affects`, `regulates`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PredId(u32);

impl PredId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// One id space: string -> u32 with reverse lookup.
#[derive(Debug, Default)]
struct Interner {
    str_to_id: DashMap<String, u32>,
    id_to_str: DashMap<u32, String>,
    next_id: AtomicU32,
}

impl Interner {
    fn intern(&self, s: &str) -> u32 {
        if let Some(id) = self.str_to_id.get(s) {
            return *id;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.str_to_id.insert(s.to_string(), id);
        self.id_to_str.insert(id, s.to_string());
        id
    }

    fn id_of(&self, s: &str) -> Option<u32> {
        self.str_to_id.get(s).map(|id| *id)
    }

    fn lookup(&self, id: u32) -> Option<String> {
        self.id_to_str.get(&id).map(|s| s.clone())
    }

    fn len(&self) -> usize {
        self.next_id.load(Ordering::SeqCst) as usize
    }
}

/// The two label vocabularies of one analysis run.
#[derive(Debug, Default)]
pub struct Vocabulary {
    types: Interner,
    preds: Interner,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type label, returning its id.
    pub fn type_id(&self, label: &str) -> TypeId {
        TypeId(self.types.intern(label))
    }

    /// Intern a predicate label, returning its id.
    pub fn pred_id(&self, label: &str) -> PredId {
        PredId(self.preds.intern(label))
    }

    /// Look up an existing type id without inserting.
    pub fn find_type(&self, label: &str) -> Option<TypeId> {
        self.types.id_of(label).map(TypeId)
    }

    /// Look up an existing predicate id without inserting.
    pub fn find_pred(&self, label: &str) -> Option<PredId> {
        self.preds.id_of(label).map(PredId)
    }

    pub fn type_label(&self, id: TypeId) -> Option<String> {
        self.types.lookup(id.0)
    }

    pub fn pred_label(&self, id: PredId) -> Option<String> {
        self.preds.lookup(id.0)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn pred_count(&self) -> usize {
        self.preds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable_and_reversible() {
        let vocab = Vocabulary::new();

        let gene = vocab.type_id("Gene");
        let disease = vocab.type_id("Disease");
        let gene_again = vocab.type_id("Gene");

        assert_eq!(gene, gene_again);
        assert_ne!(gene, disease);
        assert_eq!(vocab.type_label(gene), Some("Gene".to_string()));
        assert_eq!(vocab.type_label(disease), Some("Disease".to_string()));
    }

    #[test]
    fn type_and_predicate_spaces_are_disjoint() {
        let vocab = Vocabulary::new();

        // Same string in both spaces gets independent ids.
        let t = vocab.type_id("affects");
        let p = vocab.pred_id("affects");
        assert_eq!(t.raw(), 0);
        assert_eq!(p.raw(), 0);
        assert_eq!(vocab.type_count(), 1);
        assert_eq!(vocab.pred_count(), 1);
    }

    #[test]
    fn find_does_not_insert() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.find_pred("treats"), None);
        let id = vocab.pred_id("treats");
        assert_eq!(vocab.find_pred("treats"), Some(id));
    }
}
