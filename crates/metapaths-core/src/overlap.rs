//! Overlap scoring: composed 3-hop reachability against observed 1-hop
//! relations.
//!
//! For every nonzero 3-hop composition with boundary types (T0, T3), one
//! row is emitted per stored relation connecting T0 to T3 (entrywise AND of
//! the two matrices) plus one row against the ANY aggregate (entrywise OR
//! union of everything connecting T0 to T3). `total_possible` is the full
//! node-pair universe |T0| x |T3| in both cases.
//!
//! Rows stream to a tab-separated writer, append-only, flushed every
//! `FLUSH_EVERY` rows by the single writer.

use crate::compose::Composer;
use crate::catalog::RelationCatalog;
use crate::memory::MemoryProbe;
use crate::metapath::{format_any_hop, format_one_hop, format_three_hop};
use anyhow::Result;
use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use std::time::Instant;
use tracing::info;

pub const OVERLAP_HEADER: &str =
    "3hop_metapath\t3hop_count\t1hop_metapath\t1hop_count\toverlap\ttotal_possible";

const FLUSH_EVERY: u64 = 10_000;
const PROGRESS_EVERY_CHAINS: u64 = 1_000;

/// One (3-hop, 1-hop) comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapRow {
    pub three_hop: String,
    pub three_hop_count: u64,
    pub one_hop: String,
    pub one_hop_count: u64,
    pub overlap: u64,
    pub total_possible: u64,
}

impl OverlapRow {
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.three_hop,
            self.three_hop_count,
            self.one_hop,
            self.one_hop_count,
            self.overlap,
            self.total_possible
        )
    }

    /// Parse one data line; `None` when the row is malformed.
    pub fn parse_tsv(line: &str) -> Option<Self> {
        let mut parts = line.split('\t');
        let three_hop = parts.next()?.to_string();
        let three_hop_count = parts.next()?.parse().ok()?;
        let one_hop = parts.next()?.to_string();
        let one_hop_count = parts.next()?.parse().ok()?;
        let overlap = parts.next()?.parse().ok()?;
        let total_possible = parts.next()?.parse().ok()?;
        Some(Self {
            three_hop,
            three_hop_count,
            one_hop,
            one_hop_count,
            overlap,
            total_possible,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OverlapRunStats {
    /// Chains whose full 3-hop product was nonzero.
    pub chains_composed: u64,
    /// Chains visited (dimension-valid thirds of nonzero prefixes).
    pub chains_visited: u64,
    pub rows_written: u64,
    pub comparisons: u64,
}

pub struct OverlapEvaluator<'a> {
    catalog: &'a RelationCatalog,
    probe: &'a dyn MemoryProbe,
}

impl<'a> OverlapEvaluator<'a> {
    pub fn new(catalog: &'a RelationCatalog, probe: &'a dyn MemoryProbe) -> Self {
        Self { catalog, probe }
    }

    /// Enumerate every chain and stream overlap rows to `out`.
    pub fn run<W: Write>(&self, out: W) -> Result<OverlapRunStats> {
        let composer = Composer::new(self.catalog);
        let vocab = self.catalog.vocab();
        let mut writer = BufWriter::new(out);
        writeln!(writer, "{OVERLAP_HEADER}")?;

        let started = Instant::now();
        let mut stats = OverlapRunStats::default();
        let mut failure: Option<anyhow::Error> = None;

        composer.for_each_pair(|context| {
            for &third in context.third_candidates {
                stats.chains_visited += 1;
                let Some(result) = composer.extend_pair(&context, third) else {
                    continue;
                };
                stats.chains_composed += 1;

                let three_hop = format_three_hop(vocab, &result.chain);
                let three_hop_count = result.nnz();
                let total_possible = result.total_possible();
                let (source, target) = (result.source_type(), result.target_type());

                // Specific 1-hop comparisons.
                for one_hop_key in self.catalog.keys_between(source, target) {
                    let one_hop = self
                        .catalog
                        .matrix(&one_hop_key)
                        .expect("catalog key has a matrix");
                    let Ok(overlap) = result.matrix.intersection_count(one_hop) else {
                        continue;
                    };
                    let row = OverlapRow {
                        three_hop: three_hop.clone(),
                        three_hop_count,
                        one_hop: format_one_hop(vocab, &one_hop_key),
                        one_hop_count: one_hop.nnz(),
                        overlap,
                        total_possible,
                    };
                    stats.comparisons += 1;
                    if let Err(e) = write_row(&mut writer, &row, &mut stats) {
                        failure = Some(e);
                        return ControlFlow::Break(());
                    }
                }

                // Aggregated comparison: does *some* direct edge exist.
                if let Some(aggregate) = self.catalog.aggregate(source, target) {
                    if let Ok(overlap) = result.matrix.intersection_count(aggregate) {
                        let row = OverlapRow {
                            three_hop: three_hop.clone(),
                            three_hop_count,
                            one_hop: format_any_hop(vocab, source, target),
                            one_hop_count: aggregate.nnz(),
                            overlap,
                            total_possible,
                        };
                        stats.comparisons += 1;
                        if let Err(e) = write_row(&mut writer, &row, &mut stats) {
                            failure = Some(e);
                            return ControlFlow::Break(());
                        }
                    }
                }

                if stats.chains_visited % PROGRESS_EVERY_CHAINS == 0 {
                    info!(
                        chains = stats.chains_visited,
                        composed = stats.chains_composed,
                        rows = stats.rows_written,
                        elapsed_secs = started.elapsed().as_secs(),
                        resident_mb = self.probe.resident_mb(),
                        "overlap progress"
                    );
                }
            }
            ControlFlow::Continue(())
        });

        if let Some(e) = failure {
            return Err(e);
        }
        writer.flush()?;

        info!(
            chains = stats.chains_visited,
            composed = stats.chains_composed,
            rows = stats.rows_written,
            elapsed_secs = started.elapsed().as_secs(),
            "overlap run complete"
        );
        Ok(stats)
    }
}

fn write_row<W: Write>(
    writer: &mut BufWriter<W>,
    row: &OverlapRow,
    stats: &mut OverlapRunStats,
) -> Result<()> {
    writeln!(writer, "{}", row.to_tsv())?;
    stats.rows_written += 1;
    if stats.rows_written % FLUSH_EVERY == 0 {
        writer.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_round_trips_through_tsv() {
        let row = OverlapRow {
            three_hop: "A|p|F|B|q|R|C|p|F|A".to_string(),
            three_hop_count: 12,
            one_hop: "A|r|F|A".to_string(),
            one_hop_count: 5,
            overlap: 3,
            total_possible: 100,
        };
        assert_eq!(OverlapRow::parse_tsv(&row.to_tsv()), Some(row));
    }

    #[test]
    fn malformed_rows_parse_to_none() {
        assert_eq!(OverlapRow::parse_tsv(""), None);
        assert_eq!(OverlapRow::parse_tsv("a\tb\tc"), None);
        assert_eq!(
            OverlapRow::parse_tsv("path\tnot_a_number\tother\t1\t2\t3"),
            None
        );
    }
}
