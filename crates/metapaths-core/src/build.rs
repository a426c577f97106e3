//! Two-pass relation matrix construction.
//!
//! Pass one walks the edges to register every observed node in its type's
//! `TypeIndex` and to discover the distinct
//! `(source type, predicate, target type)` triples. Pass two walks the
//! edges again and fills one boolean matrix per triple at the now-frozen
//! dimensions, so every matrix's shape equals its types' index sizes and is
//! never resized afterward.
//!
//! The taxonomic is-a predicate is excluded up front; subclass edges are
//! not part of the metapath universe. Symmetric predicates emit only the
//! Forward key; every other triple also gets a Reverse key bound to the one
//! materialized transpose, shared behind `Arc`.

use crate::catalog::{RelationCatalog, TypeCatalog, TypeIndex, TypedRelationKey};
use crate::ingest::{EdgeFile, EdgeRecord};
use crate::intern::{PredId, TypeId, Vocabulary};
use crate::matrix::RelationMatrix;
use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Predicates whose forward and reverse edge sets are definitionally
/// identical, so only the forward matrix is stored.
///
/// The set is data, not structure: the default carries the stock list, and
/// deployments with differently named relations load their own.
#[derive(Debug, Clone)]
pub struct SymmetricPredicates {
    labels: AHashSet<String>,
}

impl SymmetricPredicates {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            labels: AHashSet::new(),
        }
    }

    /// Load from a JSON array of predicate labels.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let labels: Vec<String> = serde_json::from_str(&text)?;
        Ok(Self::from_labels(labels))
    }

    pub fn contains(&self, predicate: &str) -> bool {
        self.labels.contains(predicate)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for SymmetricPredicates {
    fn default() -> Self {
        Self::from_labels([
            "interacts_with",
            "coexists_with",
            "correlated_with",
            "associated_with",
            "related_to",
            "similar_to",
            "homologous_to",
            "orthologous_to",
            "paralogous_to",
            "xenologous_to",
        ])
    }
}

#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Taxonomic predicate excluded from the metapath universe.
    pub is_a_predicate: String,
    pub symmetric: SymmetricPredicates,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            is_a_predicate: "subclass_of".to_string(),
            symmetric: SymmetricPredicates::default(),
        }
    }
}

/// Counters from one build; dropped records are counted, never fatal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub edges_processed: u64,
    pub edges_skipped_is_a: u64,
    pub edges_dropped_unresolved: u64,
    pub relation_triples: usize,
    pub matrices: usize,
}

pub struct RelationMatrixBuilder {
    config: BuilderConfig,
}

impl RelationMatrixBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Build the relation catalog from two passes over an edge source.
    ///
    /// `open_pass` is invoked once per pass and must yield the same edges
    /// each time; only which node pairs are connected needs to be stable,
    /// not the order.
    pub fn build<E, I>(
        &self,
        types: &TypeCatalog,
        mut open_pass: E,
    ) -> Result<(RelationCatalog, BuildStats)>
    where
        E: FnMut() -> Result<I>,
        I: Iterator<Item = Result<EdgeRecord>>,
    {
        let vocab = Vocabulary::new();
        let mut stats = BuildStats::default();
        let mut type_indices: AHashMap<TypeId, TypeIndex> = AHashMap::new();
        let mut triples: Vec<(TypeId, PredId, TypeId)> = Vec::new();
        let mut triple_set: AHashSet<(TypeId, PredId, TypeId)> = AHashSet::new();
        let mut symmetric_preds: AHashSet<PredId> = AHashSet::new();

        // Pass one: register nodes per type, discover triples.
        info!("matrix build pass 1: indexing nodes");
        for record in open_pass()? {
            let record = record?;
            let Some((src_ty, pred, tgt_ty)) = self.resolve(&vocab, types, &record, &mut stats)
            else {
                continue;
            };

            if self.config.symmetric.contains(&record.predicate) {
                symmetric_preds.insert(pred);
            }

            type_indices
                .entry(src_ty)
                .or_default()
                .observe(&record.subject);
            type_indices
                .entry(tgt_ty)
                .or_default()
                .observe(&record.object);

            let triple = (src_ty, pred, tgt_ty);
            if triple_set.insert(triple) {
                triples.push(triple);
            }
            stats.edges_processed += 1;
        }

        stats.relation_triples = triples.len();
        info!(
            edges = stats.edges_processed,
            skipped_is_a = stats.edges_skipped_is_a,
            dropped = stats.edges_dropped_unresolved,
            triples = triples.len(),
            "pass 1 complete"
        );

        // Dimensions are frozen from here on.
        let mut matrices: AHashMap<(TypeId, PredId, TypeId), RelationMatrix> = triples
            .iter()
            .map(|&(src_ty, pred, tgt_ty)| {
                let nrows = type_indices[&src_ty].len();
                let ncols = type_indices[&tgt_ty].len();
                ((src_ty, pred, tgt_ty), RelationMatrix::empty(nrows, ncols))
            })
            .collect();

        // Pass two: fill matrices.
        info!("matrix build pass 2: filling matrices");
        let mut pass2_stats = BuildStats::default();
        for record in open_pass()? {
            let record = record?;
            let Some((src_ty, pred, tgt_ty)) =
                self.resolve(&vocab, types, &record, &mut pass2_stats)
            else {
                continue;
            };

            let row = type_indices
                .get(&src_ty)
                .and_then(|idx| idx.get(&record.subject));
            let col = type_indices
                .get(&tgt_ty)
                .and_then(|idx| idx.get(&record.object));
            let matrix = matrices.get_mut(&(src_ty, pred, tgt_ty));
            let (Some(row), Some(col), Some(matrix)) = (row, col, matrix) else {
                anyhow::bail!("edge source changed between passes");
            };
            matrix.set(row, col)?;
        }

        // Assemble the catalog: forward keys in discovery order, reverse
        // keys for non-symmetric predicates sharing the one transpose.
        let type_sizes: AHashMap<TypeId, u32> = type_indices
            .iter()
            .map(|(&ty, index)| (ty, index.len()))
            .collect();
        let mut catalog = RelationCatalog::new(vocab, type_sizes);

        for &(src_ty, pred, tgt_ty) in &triples {
            let Some(matrix) = matrices.remove(&(src_ty, pred, tgt_ty)) else {
                continue;
            };
            let matrix = Arc::new(matrix);
            let key = TypedRelationKey::forward(src_ty, pred, tgt_ty);
            catalog.insert(key, Arc::clone(&matrix));

            if !symmetric_preds.contains(&pred) {
                let transposed = Arc::new(matrix.transpose());
                catalog.insert(key.flipped(), transposed);
            }
        }
        stats.matrices = catalog.len();

        self.build_aggregates(&mut catalog);

        info!(matrices = stats.matrices, "relation catalog built");
        Ok((catalog, stats))
    }

    /// Build from an edges file, opening it once per pass.
    pub fn build_from_file(
        &self,
        types: &TypeCatalog,
        edges: &EdgeFile,
    ) -> Result<(RelationCatalog, BuildStats)> {
        self.build(types, || edges.pass())
    }

    /// Build from in-memory records; both passes replay the slice.
    pub fn build_from_records(
        &self,
        types: &TypeCatalog,
        records: &[EdgeRecord],
    ) -> Result<(RelationCatalog, BuildStats)> {
        self.build(types, || Ok(records.iter().cloned().map(Ok)))
    }

    /// Classify one edge: `None` drops it (is-a or unresolved endpoint).
    fn resolve(
        &self,
        vocab: &Vocabulary,
        types: &TypeCatalog,
        record: &EdgeRecord,
        stats: &mut BuildStats,
    ) -> Option<(TypeId, PredId, TypeId)> {
        if record.predicate == self.config.is_a_predicate {
            stats.edges_skipped_is_a += 1;
            return None;
        }

        let (Some(src), Some(tgt)) = (types.type_of(&record.subject), types.type_of(&record.object))
        else {
            stats.edges_dropped_unresolved += 1;
            return None;
        };

        Some((
            vocab.type_id(src),
            vocab.pred_id(&record.predicate),
            vocab.type_id(tgt),
        ))
    }

    /// Union all predicates and directions per (source, target) type pair.
    fn build_aggregates(&self, catalog: &mut RelationCatalog) {
        let mut unions: AHashMap<(TypeId, TypeId), RelationMatrix> = AHashMap::new();
        let mut pair_order: Vec<(TypeId, TypeId)> = Vec::new();

        for key in catalog.keys().to_vec() {
            let matrix = catalog.matrix(&key).expect("key has a matrix");
            let pair = (key.source_type, key.target_type);
            match unions.get_mut(&pair) {
                Some(acc) => acc
                    .union_with(matrix)
                    .expect("same type pair implies same shape"),
                None => {
                    unions.insert(pair, RelationMatrix::clone(matrix));
                    pair_order.push(pair);
                }
            }
        }

        for pair in pair_order {
            let matrix = unions.remove(&pair).expect("pair recorded above");
            catalog.insert_aggregate(pair, Arc::new(matrix));
        }
    }
}

impl Default for RelationMatrixBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}
