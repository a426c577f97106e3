//! Boolean sparse matrices over type-local node indices.
//!
//! A `RelationMatrix` stores only true entries: one Roaring bitmap per row,
//! column indices as set bits. Rows are indexed by the source type's dense
//! node index, columns by the target type's. Matrices are immutable after
//! construction; the catalog shares them behind `Arc`.
//!
//! `existential_product` is the one multiply used for every hop: AND as the
//! combine operator, OR as the reduce operator. Path existence, not path
//! count, multiplicities never appear.

use roaring::RoaringBitmap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("shape mismatch: left is {left_rows}x{left_cols}, right is {right_rows}x{right_cols}")]
    ShapeMismatch {
        left_rows: u32,
        left_cols: u32,
        right_rows: u32,
        right_cols: u32,
    },

    #[error("entry ({row}, {col}) out of bounds for {nrows}x{ncols} matrix")]
    OutOfBounds {
        row: u32,
        col: u32,
        nrows: u32,
        ncols: u32,
    },
}

/// Boolean sparse adjacency matrix for one typed relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMatrix {
    nrows: u32,
    ncols: u32,
    rows: Vec<RoaringBitmap>,
    nnz: u64,
}

impl RelationMatrix {
    /// All-false matrix of the given shape.
    pub fn empty(nrows: u32, ncols: u32) -> Self {
        Self {
            nrows,
            ncols,
            rows: vec![RoaringBitmap::new(); nrows as usize],
            nnz: 0,
        }
    }

    /// Build from (row, col) coordinate pairs. Duplicates collapse to one
    /// true entry; out-of-bounds coordinates are an error.
    pub fn from_pairs<I>(nrows: u32, ncols: u32, pairs: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut m = Self::empty(nrows, ncols);
        for (row, col) in pairs {
            m.set(row, col)?;
        }
        Ok(m)
    }

    pub(crate) fn set(&mut self, row: u32, col: u32) -> Result<(), MatrixError> {
        if row >= self.nrows || col >= self.ncols {
            return Err(MatrixError::OutOfBounds {
                row,
                col,
                nrows: self.nrows,
                ncols: self.ncols,
            });
        }
        if self.rows[row as usize].insert(col) {
            self.nnz += 1;
        }
        Ok(())
    }

    pub fn nrows(&self) -> u32 {
        self.nrows
    }

    pub fn ncols(&self) -> u32 {
        self.ncols
    }

    /// Number of true entries.
    pub fn nnz(&self) -> u64 {
        self.nnz
    }

    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }

    /// Row-count x column-count, the universe of node pairs for this shape.
    pub fn total_cells(&self) -> u64 {
        self.nrows as u64 * self.ncols as u64
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.rows
            .get(row as usize)
            .map(|r| r.contains(col))
            .unwrap_or(false)
    }

    pub fn row(&self, row: u32) -> Option<&RoaringBitmap> {
        self.rows.get(row as usize)
    }

    /// Iterate true entries as (row, col), row-major.
    pub fn iter_entries(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |j| (i as u32, j)))
    }

    /// Materialize the transpose. Done once per relation at catalog build
    /// time; every Reverse key shares that one allocation.
    pub fn transpose(&self) -> RelationMatrix {
        let mut t = RelationMatrix::empty(self.ncols, self.nrows);
        for (i, row) in self.rows.iter().enumerate() {
            for j in row.iter() {
                t.rows[j as usize].insert(i as u32);
            }
        }
        t.nnz = self.nnz;
        t
    }

    /// Existential boolean product: entry (i, j) of the result is true iff
    /// there is some k with `self[i, k]` and `other[k, j]`.
    pub fn existential_product(&self, other: &RelationMatrix) -> Result<RelationMatrix, MatrixError> {
        if self.ncols != other.nrows {
            return Err(MatrixError::ShapeMismatch {
                left_rows: self.nrows,
                left_cols: self.ncols,
                right_rows: other.nrows,
                right_cols: other.ncols,
            });
        }

        let mut rows = vec![RoaringBitmap::new(); self.nrows as usize];
        let mut nnz = 0u64;
        for (i, row) in self.rows.iter().enumerate() {
            let out = &mut rows[i];
            for k in row.iter() {
                let reachable = &other.rows[k as usize];
                if !reachable.is_empty() {
                    *out |= reachable;
                }
            }
            nnz += out.len();
        }

        Ok(RelationMatrix {
            nrows: self.nrows,
            ncols: other.ncols,
            rows,
            nnz,
        })
    }

    /// Entrywise AND. Shapes must match.
    pub fn intersect(&self, other: &RelationMatrix) -> Result<RelationMatrix, MatrixError> {
        self.check_same_shape(other)?;
        let mut rows = Vec::with_capacity(self.nrows as usize);
        let mut nnz = 0u64;
        for (a, b) in self.rows.iter().zip(&other.rows) {
            let row = a & b;
            nnz += row.len();
            rows.push(row);
        }
        Ok(RelationMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            rows,
            nnz,
        })
    }

    /// Number of entries true in both matrices, without materializing the
    /// intersection. Shapes must match.
    pub fn intersection_count(&self, other: &RelationMatrix) -> Result<u64, MatrixError> {
        self.check_same_shape(other)?;
        let mut count = 0u64;
        for (a, b) in self.rows.iter().zip(&other.rows) {
            count += a.intersection_len(b);
        }
        Ok(count)
    }

    /// Entrywise OR into `self`'s accumulator form, used for the ANY
    /// aggregates. Shapes must match.
    pub fn union_with(&mut self, other: &RelationMatrix) -> Result<(), MatrixError> {
        self.check_same_shape(other)?;
        let mut nnz = 0u64;
        for (a, b) in self.rows.iter_mut().zip(&other.rows) {
            *a |= b;
            nnz += a.len();
        }
        self.nnz = nnz;
        Ok(())
    }

    fn check_same_shape(&self, other: &RelationMatrix) -> Result<(), MatrixError> {
        if self.nrows != other.nrows || self.ncols != other.ncols {
            return Err(MatrixError::ShapeMismatch {
                left_rows: self.nrows,
                left_cols: self.ncols,
                right_rows: other.nrows,
                right_cols: other.ncols,
            });
        }
        Ok(())
    }
}
