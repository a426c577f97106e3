//! Metapaths core: typed relation matrices and 3-hop composition analysis.
//!
//! The engine answers one question about a typed, directed, multi-relational
//! graph: how well do 3-hop relation compositions ("metapaths") predict the
//! existence of direct 1-hop relations between the same node types?
//!
//! Pipeline:
//!
//! 1. **Type resolution**: every node is assigned one type label through a
//!    hierarchy oracle (`hierarchy`), most-specific label wins.
//! 2. **Matrix construction**: edges are grouped by
//!    `(source type, predicate, target type)` and materialized as boolean
//!    sparse matrices over type-local dense node indices (`build`).
//! 3. **Composition**: 3-hop reachability via existential boolean matrix
//!    products, enumerated as a type-keyed nested join (`compose`).
//! 4. **Scoring**: composed reachability intersected against observed 1-hop
//!    relations, specific and aggregated (`overlap`), with confusion-matrix
//!    statistics derived per row (`metrics`).
//!
//! Matrices use one Roaring bitmap per row; the existential product is the
//! AND-combine / OR-reduce boolean multiply (path existence, never counts).

pub mod build;
pub mod catalog;
pub mod compose;
pub mod hierarchy;
pub mod ingest;
pub mod intern;
pub mod matrix;
pub mod memory;
pub mod metapath;
pub mod metrics;
pub mod overlap;

pub use build::{BuildStats, BuilderConfig, RelationMatrixBuilder, SymmetricPredicates};
pub use catalog::{Direction, RelationCatalog, TypeCatalog, TypeIndex, TypedRelationKey};
pub use compose::{Composer, CompositionResult, PairContext};
pub use hierarchy::{resolve_primary_type, AncestorTable, TypeHierarchy};
pub use ingest::{EdgeFile, EdgeRecord, NodeRecord};
pub use intern::{PredId, TypeId, Vocabulary};
pub use matrix::{MatrixError, RelationMatrix};
pub use memory::{default_probe, MemoryProbe, NoopProbe};
pub use metrics::{derive_classification_table, ClassificationStats, ConfusionMetrics};
pub use overlap::{OverlapEvaluator, OverlapRow, OverlapRunStats, OVERLAP_HEADER};
