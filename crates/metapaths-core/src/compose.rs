//! Metapath composition: typed 2-hop and 3-hop chaining over the catalog.
//!
//! Chains are enumerated as a type-keyed nested join, never a cross
//! product: every relation e1, every e2 whose source type is e1's target
//! type, every e3 whose source type is e2's target type. Dimension
//! mismatches inside a chain mean "no such composition" and are skipped;
//! empty intermediate or final products short-circuit the rest of the
//! chain, since an empty matrix yields no reportable rows downstream.

use crate::catalog::{RelationCatalog, TypedRelationKey};
use crate::matrix::{MatrixError, RelationMatrix};
use std::ops::ControlFlow;

/// One composed 3-hop chain and its reachability matrix.
///
/// Transient: produced and consumed within a single analysis pass.
#[derive(Debug)]
pub struct CompositionResult {
    pub chain: [TypedRelationKey; 3],
    pub matrix: RelationMatrix,
}

impl CompositionResult {
    pub fn nnz(&self) -> u64 {
        self.matrix.nnz()
    }

    pub fn shape(&self) -> (u32, u32) {
        (self.matrix.nrows(), self.matrix.ncols())
    }

    /// Boundary source type of the chain (rows of the result).
    pub fn source_type(&self) -> crate::intern::TypeId {
        self.chain[0].source_type
    }

    /// Boundary target type of the chain (columns of the result).
    pub fn target_type(&self) -> crate::intern::TypeId {
        self.chain[2].target_type
    }

    /// Universe of node pairs between the boundary types.
    pub fn total_possible(&self) -> u64 {
        self.matrix.total_cells()
    }
}

/// A valid (e1, e2) prefix with its computed product, handed to chain
/// visitors together with the type-compatible e3 candidates.
pub struct PairContext<'a> {
    pub first: TypedRelationKey,
    pub second: TypedRelationKey,
    pub product: &'a RelationMatrix,
    pub third_candidates: &'a [TypedRelationKey],
}

pub struct Composer<'a> {
    catalog: &'a RelationCatalog,
}

impl<'a> Composer<'a> {
    pub fn new(catalog: &'a RelationCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a RelationCatalog {
        self.catalog
    }

    /// The single reusable hop primitive: existential boolean product.
    pub fn compose_two(
        &self,
        first: &RelationMatrix,
        second: &RelationMatrix,
    ) -> Result<RelationMatrix, MatrixError> {
        first.existential_product(second)
    }

    /// Full 3-hop product, or `None` when the chain dies: incompatible
    /// dimensions or an empty intermediate/final product.
    pub fn compose_three(
        &self,
        first: &RelationMatrix,
        second: &RelationMatrix,
        third: &RelationMatrix,
    ) -> Option<RelationMatrix> {
        if first.ncols() != second.nrows() {
            return None;
        }
        let pair = first.existential_product(second).ok()?;
        if pair.is_empty() || pair.ncols() != third.nrows() {
            return None;
        }
        let full = pair.existential_product(third).ok()?;
        if full.is_empty() {
            return None;
        }
        Some(full)
    }

    /// Visit every valid (e1, e2) prefix once, with its product computed.
    ///
    /// Pairs with incompatible dimensions or an empty product are skipped
    /// before the visitor sees them. Return `ControlFlow::Break(())` to
    /// stop early.
    pub fn for_each_pair<F>(&self, mut visit: F)
    where
        F: FnMut(PairContext<'_>) -> ControlFlow<()>,
    {
        for &first in self.catalog.keys() {
            let Some(m1) = self.catalog.matrix(&first) else {
                continue;
            };
            for &second in self.catalog.keys_from(first.target_type) {
                let Some(m2) = self.catalog.matrix(&second) else {
                    continue;
                };
                if m1.ncols() != m2.nrows() {
                    continue;
                }
                let Ok(product) = m1.existential_product(m2) else {
                    continue;
                };
                if product.is_empty() {
                    continue;
                }

                let context = PairContext {
                    first,
                    second,
                    product: &product,
                    third_candidates: self.catalog.keys_from(second.target_type),
                };
                if visit(context).is_break() {
                    return;
                }
            }
        }
    }

    /// Visit every type-compatible, dimension-valid (e1, e2, e3) key triple
    /// without computing any product. Used where the visitor does its own
    /// (timed) evaluation.
    pub fn for_each_chain<F>(&self, mut visit: F)
    where
        F: FnMut(TypedRelationKey, TypedRelationKey, TypedRelationKey) -> ControlFlow<()>,
    {
        for &first in self.catalog.keys() {
            let Some(m1) = self.catalog.matrix(&first) else {
                continue;
            };
            for &second in self.catalog.keys_from(first.target_type) {
                let Some(m2) = self.catalog.matrix(&second) else {
                    continue;
                };
                if m1.ncols() != m2.nrows() {
                    continue;
                }
                for &third in self.catalog.keys_from(second.target_type) {
                    let Some(m3) = self.catalog.matrix(&third) else {
                        continue;
                    };
                    if m2.ncols() != m3.nrows() {
                        continue;
                    }
                    if visit(first, second, third).is_break() {
                        return;
                    }
                }
            }
        }
    }

    /// Extend a visited prefix by one candidate e3. `None` when the chain
    /// dies (dimension mismatch or empty final product).
    pub fn extend_pair(
        &self,
        context: &PairContext<'_>,
        third: TypedRelationKey,
    ) -> Option<CompositionResult> {
        let m3 = self.catalog.matrix(&third)?;
        if context.product.ncols() != m3.nrows() {
            return None;
        }
        let full = context.product.existential_product(m3).ok()?;
        if full.is_empty() {
            return None;
        }
        Some(CompositionResult {
            chain: [context.first, context.second, third],
            matrix: full,
        })
    }

    /// Number of (e1, e2, e3) triples the enumeration would evaluate:
    /// nonzero (e1, e2) products extended by every dimension-valid e3.
    pub fn count_valid_triples(&self) -> u64 {
        let mut count = 0u64;
        self.for_each_pair(|context| {
            for third in context.third_candidates {
                if let Some(m3) = self.catalog.matrix(third) {
                    if context.product.ncols() == m3.nrows() {
                        count += 1;
                    }
                }
            }
            ControlFlow::Continue(())
        });
        count
    }
}
