//! Forward vs reverse evaluation order.
//!
//! For a chain A -> B -> C -> D, forward evaluation is (AB x BC) x CD and
//! reverse is (DCᵗ x CBᵗ) x BAᵗ. The intermediate connects A to C in one
//! order and D to B in the other, and their sizes can differ by orders of
//! magnitude, which is the whole scheduling question. The profiler times
//! both orders per sampled chain, estimates intermediate memory at a fixed
//! per-entry cost, and reports how many sampled chains would fit under
//! candidate per-worker memory budgets.
//!
//! A direction whose first-stage intermediate is empty is skipped
//! entirely; chains where only one direction survives are counted but not
//! compared.

use anyhow::Result;
use metapaths_core::catalog::{RelationCatalog, TypedRelationKey};
use metapaths_core::compose::Composer;
use metapaths_core::matrix::RelationMatrix;
use metapaths_core::metapath::format_three_hop;
use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::info;

/// Conservative sparse-entry cost: row index + column index + value plus
/// structure overhead.
pub const MEMORY_BYTES_PER_ENTRY: u64 = 17;

pub const DIRECTION_HEADER: &str = "forward_metapath\tforward_ab_time\tforward_abc_time\t\
    forward_intermediate_edges\tforward_memory_mb\treverse_metapath\treverse_ab_time\t\
    reverse_abc_time\treverse_intermediate_edges\treverse_memory_mb\tbetter_direction\t\
    memory_ratio";

#[derive(Debug, Clone)]
pub struct DirectionConfig {
    /// Cap on fully profiled chains.
    pub max_samples: usize,
    /// Candidate per-worker budgets for the headroom report, in MB.
    pub memory_budgets_mb: Vec<u64>,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            max_samples: 1_000,
            memory_budgets_mb: vec![100, 500, 1_000, 2_000, 4_000],
        }
    }
}

/// One evaluated direction of one chain.
#[derive(Debug, Clone, Copy)]
pub struct StageCost {
    pub intermediate_nnz: u64,
    pub first_stage: Duration,
    pub second_stage: Duration,
}

impl StageCost {
    pub fn total(&self) -> Duration {
        self.first_stage + self.second_stage
    }

    pub fn memory_bytes(&self) -> u64 {
        self.intermediate_nnz * MEMORY_BYTES_PER_ENTRY
    }

    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes() as f64 / (1024.0 * 1024.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetterDirection {
    Forward,
    Reverse,
    Equal,
}

impl BetterDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            BetterDirection::Forward => "forward",
            BetterDirection::Reverse => "reverse",
            BetterDirection::Equal => "equal",
        }
    }
}

/// Distribution summary over per-chain intermediate memory, in MB.
#[derive(Debug, Clone, Copy)]
pub struct MemoryStats {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub mean: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct HeadroomRow {
    pub budget_mb: u64,
    pub forward_fits: u64,
    pub reverse_fits: u64,
}

/// How many sampled chains' peak intermediate fits per worker budget.
#[derive(Debug, Clone)]
pub struct HeadroomReport {
    pub rows: Vec<HeadroomRow>,
    pub forward: Option<MemoryStats>,
    pub reverse: Option<MemoryStats>,
}

#[derive(Debug, Clone)]
pub struct DirectionSummary {
    /// Chains with both directions evaluated and compared.
    pub compared: u64,
    /// Chains where exactly one direction's first stage was empty.
    pub forward_skipped: u64,
    pub reverse_skipped: u64,
    /// Chains dead in both directions.
    pub both_skipped: u64,
    pub forward_faster: u64,
    pub reverse_faster: u64,
    pub equal: u64,
    pub headroom: HeadroomReport,
}

pub struct DirectionCostProfiler<'a> {
    catalog: &'a RelationCatalog,
    config: DirectionConfig,
}

impl<'a> DirectionCostProfiler<'a> {
    pub fn new(catalog: &'a RelationCatalog, config: DirectionConfig) -> Self {
        Self { catalog, config }
    }

    /// Profile up to `max_samples` chains, streaming compared rows to
    /// `out` and returning the summary.
    pub fn run<W: Write>(&self, out: W) -> Result<DirectionSummary> {
        let composer = Composer::new(self.catalog);
        let vocab = self.catalog.vocab();
        let mut writer = BufWriter::new(out);
        writeln!(writer, "{DIRECTION_HEADER}")?;

        let mut compared = 0u64;
        let mut forward_skipped = 0u64;
        let mut reverse_skipped = 0u64;
        let mut both_skipped = 0u64;
        let mut forward_faster = 0u64;
        let mut reverse_faster = 0u64;
        let mut equal = 0u64;
        let mut forward_memory: Vec<f64> = Vec::new();
        let mut reverse_memory: Vec<f64> = Vec::new();
        let mut failure: Option<anyhow::Error> = None;

        composer.for_each_chain(|first, second, third| {
            if compared as usize >= self.config.max_samples {
                return ControlFlow::Break(());
            }

            let forward = self.evaluate_forward(first, second, third);
            let reverse = self.evaluate_reverse(first, second, third);

            let (forward, reverse) = match (forward, reverse) {
                (Some(f), Some(r)) => (f, r),
                (Some(_), None) => {
                    reverse_skipped += 1;
                    return ControlFlow::Continue(());
                }
                (None, Some(_)) => {
                    forward_skipped += 1;
                    return ControlFlow::Continue(());
                }
                (None, None) => {
                    both_skipped += 1;
                    return ControlFlow::Continue(());
                }
            };

            let better = if forward.total() < reverse.total() {
                forward_faster += 1;
                BetterDirection::Forward
            } else if reverse.total() < forward.total() {
                reverse_faster += 1;
                BetterDirection::Reverse
            } else {
                equal += 1;
                BetterDirection::Equal
            };

            let forward_mb = forward.memory_mb();
            let reverse_mb = reverse.memory_mb();
            forward_memory.push(forward_mb);
            reverse_memory.push(reverse_mb);

            let memory_ratio = if reverse_mb > 0.0 {
                forward_mb / reverse_mb
            } else if forward_mb > 0.0 {
                f64::INFINITY
            } else {
                1.0
            };

            let forward_path = format_three_hop(vocab, &[first, second, third]);
            let reverse_path = format_three_hop(
                vocab,
                &[third.flipped(), second.flipped(), first.flipped()],
            );

            let row = format!(
                "{}\t{:.6}\t{:.6}\t{}\t{:.3}\t{}\t{:.6}\t{:.6}\t{}\t{:.3}\t{}\t{:.3}",
                forward_path,
                forward.first_stage.as_secs_f64(),
                forward.second_stage.as_secs_f64(),
                forward.intermediate_nnz,
                forward_mb,
                reverse_path,
                reverse.first_stage.as_secs_f64(),
                reverse.second_stage.as_secs_f64(),
                reverse.intermediate_nnz,
                reverse_mb,
                better.as_str(),
                memory_ratio,
            );
            if let Err(e) = writeln!(writer, "{row}") {
                failure = Some(e.into());
                return ControlFlow::Break(());
            }

            compared += 1;
            if compared % 100 == 0 {
                info!(
                    compared,
                    forward_faster, reverse_faster, equal, "direction profiling progress"
                );
            }
            ControlFlow::Continue(())
        });

        if let Some(e) = failure {
            return Err(e);
        }
        writer.flush()?;

        let headroom = self.headroom(&mut forward_memory, &mut reverse_memory);
        Ok(DirectionSummary {
            compared,
            forward_skipped,
            reverse_skipped,
            both_skipped,
            forward_faster,
            reverse_faster,
            equal,
            headroom,
        })
    }

    /// (M1 x M2) then x M3. `None` when the first stage is empty.
    fn evaluate_forward(
        &self,
        first: TypedRelationKey,
        second: TypedRelationKey,
        third: TypedRelationKey,
    ) -> Option<StageCost> {
        let m1 = self.catalog.matrix(&first)?;
        let m2 = self.catalog.matrix(&second)?;
        let m3 = self.catalog.matrix(&third)?;
        self.evaluate(m1, m2, m3)
    }

    /// (M3ᵗ x M2ᵗ) then x M1ᵗ, transposes resolved through the catalog.
    fn evaluate_reverse(
        &self,
        first: TypedRelationKey,
        second: TypedRelationKey,
        third: TypedRelationKey,
    ) -> Option<StageCost> {
        let m3t = self.catalog.transposed_matrix(&third)?;
        let m2t = self.catalog.transposed_matrix(&second)?;
        let m1t = self.catalog.transposed_matrix(&first)?;
        self.evaluate(&m3t, &m2t, &m1t)
    }

    fn evaluate(
        &self,
        first: &RelationMatrix,
        second: &RelationMatrix,
        third: &RelationMatrix,
    ) -> Option<StageCost> {
        if first.ncols() != second.nrows() {
            return None;
        }

        let first_start = Instant::now();
        let intermediate = first.existential_product(second).ok()?;
        let first_stage = first_start.elapsed();
        if intermediate.is_empty() || intermediate.ncols() != third.nrows() {
            return None;
        }

        let second_start = Instant::now();
        let _full = intermediate.existential_product(third).ok()?;
        let second_stage = second_start.elapsed();

        Some(StageCost {
            intermediate_nnz: intermediate.nnz(),
            first_stage,
            second_stage,
        })
    }

    fn headroom(&self, forward: &mut Vec<f64>, reverse: &mut Vec<f64>) -> HeadroomReport {
        forward.sort_by(f64::total_cmp);
        reverse.sort_by(f64::total_cmp);

        let rows = self
            .config
            .memory_budgets_mb
            .iter()
            .map(|&budget_mb| HeadroomRow {
                budget_mb,
                forward_fits: count_fits(forward, budget_mb as f64),
                reverse_fits: count_fits(reverse, budget_mb as f64),
            })
            .collect();

        HeadroomReport {
            rows,
            forward: memory_stats(forward),
            reverse: memory_stats(reverse),
        }
    }
}

fn count_fits(sorted_mb: &[f64], budget_mb: f64) -> u64 {
    sorted_mb.iter().filter(|&&mb| mb <= budget_mb).count() as u64
}

/// Percentile with linear interpolation over sorted data.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let k = (sorted.len() - 1) as f64 * (p / 100.0);
    let lower = k.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    if lower == upper {
        return sorted[lower];
    }
    sorted[lower] * (upper as f64 - k) + sorted[upper] * (k - lower as f64)
}

fn memory_stats(sorted: &[f64]) -> Option<MemoryStats> {
    if sorted.is_empty() {
        return None;
    }
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
    Some(MemoryStats {
        min: sorted[0],
        p25: percentile(sorted, 25.0),
        median: percentile(sorted, 50.0),
        mean,
        p75: percentile(sorted, 75.0),
        p90: percentile(sorted, 90.0),
        p95: percentile(sorted, 95.0),
        p99: percentile(sorted, 99.0),
        max: sorted[sorted.len() - 1],
    })
}
