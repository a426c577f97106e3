//! Runtime estimation for exhaustive 3-hop enumeration.
//!
//! Two tracks, deliberately asymmetric in cost:
//!
//! - **Population survey**: every valid (e1, e2) product is computed once
//!   and bucketed by nonzero count; the number of dimension-valid e3
//!   choices joins that bucket's population. Cheap, no e3 work.
//! - **Measured samples**: stratified sample chains run the complete
//!   pipeline (composition plus all overlap comparisons) under a wall
//!   clock, producing the benchmark-results table.
//!
//! Projection multiplies each bucket's mean measured time by its
//! population and sums. A bucket with population but no samples reports
//! `unknown`, never interpolated from neighboring buckets.

use crate::bucket::SizeBucket;
use crate::pipeline::run_measured_pipeline;
use crate::samples::SampleSpec;
use anyhow::Result;
use metapaths_core::catalog::RelationCatalog;
use metapaths_core::compose::Composer;
use metapaths_core::metapath::format_three_hop;
use std::io::{BufRead, BufWriter, Write};
use std::ops::ControlFlow;
use tracing::{info, warn};

pub const BENCHMARK_HEADER: &str = "bucket\tmetapath\tab_edges\tabc_edges\tnum_comparisons\t\
    ab_time\tabc_time\tcomparison_time\ttotal_time";

pub const ESTIMATE_HEADER: &str = "bucket\titerations\tpercent\tavg_time\testimated_total";

/// e3-iteration counts per intermediate-size bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BucketPopulation {
    counts: [u64; 7],
}

impl BucketPopulation {
    pub fn add(&mut self, bucket: SizeBucket, count: u64) {
        self.counts[bucket.index()] += count;
    }

    pub fn get(&self, bucket: SizeBucket) -> u64 {
        self.counts[bucket.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Compute every valid (e1, e2) product and count the e3 choices that
/// would consume it, per bucket.
pub fn survey_population(catalog: &RelationCatalog) -> BucketPopulation {
    let composer = Composer::new(catalog);
    let mut population = BucketPopulation::default();

    composer.for_each_pair(|context| {
        let bucket = SizeBucket::classify(context.product.nnz());
        let valid_thirds = context
            .third_candidates
            .iter()
            .filter(|third| {
                catalog
                    .matrix(third)
                    .is_some_and(|m3| context.product.ncols() == m3.nrows())
            })
            .count() as u64;
        population.add(bucket, valid_thirds);
        ControlFlow::Continue(())
    });

    info!(
        total = population.total(),
        "population survey complete"
    );
    population
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BenchmarkRunStats {
    pub rows_written: u64,
    pub samples_skipped: u64,
}

/// Execute sampled chains under measurement, writing the benchmark-results
/// table. Samples whose chain dies are skipped with a warning.
pub fn run_benchmarks<W: Write>(
    catalog: &RelationCatalog,
    samples: &[SampleSpec],
    out: W,
) -> Result<BenchmarkRunStats> {
    let vocab = catalog.vocab();
    let mut writer = BufWriter::new(out);
    writeln!(writer, "{BENCHMARK_HEADER}")?;

    let mut stats = BenchmarkRunStats::default();
    for (index, sample) in samples.iter().enumerate() {
        if index % 10 == 0 {
            info!(sample = index, of = samples.len(), "benchmark progress");
        }

        let Some(timing) = run_measured_pipeline(catalog, &sample.chain) else {
            warn!(sample = index, "sampled chain produced no work, skipping");
            stats.samples_skipped += 1;
            continue;
        };

        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
            sample.bucket.name(),
            format_three_hop(vocab, &sample.chain),
            timing.ab_nnz,
            timing.abc_nnz,
            timing.comparisons,
            timing.ab_time.as_secs_f64(),
            timing.abc_time.as_secs_f64(),
            timing.comparison_time.as_secs_f64(),
            timing.total().as_secs_f64(),
        )?;
        stats.rows_written += 1;

        if (index + 1) % 100 == 0 {
            writer.flush()?;
        }
    }
    writer.flush()?;

    info!(
        rows = stats.rows_written,
        skipped = stats.samples_skipped,
        "benchmark run complete"
    );
    Ok(stats)
}

/// Per-bucket measured total times.
#[derive(Debug, Default, Clone, Copy)]
pub struct BucketTimings {
    sums: [f64; 7],
    counts: [u64; 7],
}

impl BucketTimings {
    pub fn record(&mut self, bucket: SizeBucket, total_secs: f64) {
        self.sums[bucket.index()] += total_secs;
        self.counts[bucket.index()] += 1;
    }

    pub fn samples(&self, bucket: SizeBucket) -> u64 {
        self.counts[bucket.index()]
    }

    pub fn average(&self, bucket: SizeBucket) -> Option<f64> {
        let count = self.counts[bucket.index()];
        (count > 0).then(|| self.sums[bucket.index()] / count as f64)
    }
}

/// Load measured timings from a benchmark-results TSV. Malformed rows are
/// skipped with a warning rather than aborting the run.
pub fn load_bucket_timings<R: BufRead>(input: R) -> Result<BucketTimings> {
    let mut timings = BucketTimings::default();
    let mut skipped = 0u64;

    for (line_number, line) in input.lines().enumerate() {
        let line = line?;
        if line_number == 0 || line.is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        let parsed = (columns.len() >= 9)
            .then_some(())
            .and_then(|_| {
                let bucket = SizeBucket::parse(columns[0])?;
                let total: f64 = columns[8].parse().ok()?;
                Some((bucket, total))
            });

        match parsed {
            Some((bucket, total)) => timings.record(bucket, total),
            None => {
                warn!(line = line_number + 1, "skipping malformed benchmark row");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "benchmark rows ignored");
    }
    Ok(timings)
}

/// One bucket of the runtime-estimate table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionRow {
    pub bucket: SizeBucket,
    pub population: u64,
    pub share: f64,
    pub samples: u64,
    /// Mean measured seconds per iteration; `None` means no samples landed
    /// in a populated bucket and its contribution is unknown.
    pub average_secs: Option<f64>,
    pub projected_secs: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RuntimeProjection {
    pub rows: Vec<ProjectionRow>,
    pub total_triples: u64,
    /// Sum over buckets with measurements.
    pub known_total_secs: f64,
    pub unknown_buckets: Vec<SizeBucket>,
}

/// Combine the population survey with measured timings.
pub fn project_runtime(
    population: &BucketPopulation,
    timings: &BucketTimings,
) -> RuntimeProjection {
    let total_triples = population.total();
    let mut rows = Vec::new();
    let mut known_total_secs = 0.0;
    let mut unknown_buckets = Vec::new();

    for bucket in SizeBucket::ALL {
        let count = population.get(bucket);
        if count == 0 {
            continue;
        }

        let average_secs = timings.average(bucket);
        let projected_secs = average_secs.map(|avg| avg * count as f64);
        match projected_secs {
            Some(secs) => known_total_secs += secs,
            None => unknown_buckets.push(bucket),
        }

        rows.push(ProjectionRow {
            bucket,
            population: count,
            share: if total_triples > 0 {
                100.0 * count as f64 / total_triples as f64
            } else {
                0.0
            },
            samples: timings.samples(bucket),
            average_secs,
            projected_secs,
        });
    }

    RuntimeProjection {
        rows,
        total_triples,
        known_total_secs,
        unknown_buckets,
    }
}

/// Write the runtime-estimate table; unmeasured buckets print `unknown`.
pub fn write_estimate_tsv<W: Write>(projection: &RuntimeProjection, out: W) -> Result<()> {
    let mut writer = BufWriter::new(out);
    writeln!(writer, "{ESTIMATE_HEADER}")?;

    for row in &projection.rows {
        let average = row
            .average_secs
            .map(|v| format!("{v:.6}"))
            .unwrap_or_else(|| "unknown".to_string());
        let projected = row
            .projected_secs
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| "unknown".to_string());
        writeln!(
            writer,
            "{}\t{}\t{:.2}\t{}\t{}",
            row.bucket.name(),
            row.population,
            row.share,
            average,
            projected,
        )?;
    }
    writer.flush()?;
    Ok(())
}
