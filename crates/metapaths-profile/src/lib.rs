//! Cost analysis for exhaustive metapath enumeration.
//!
//! Full 3-hop enumeration over a large catalog is combinatorially
//! expensive, so execution is deliberately separated from cost analysis:
//! this crate measures and projects, a future scheduler decides. Three
//! consumers share the same chain walkers from `metapaths-core`:
//!
//! - `direction`: forward vs reverse evaluation order, wall time and
//!   memory headroom per sampled chain.
//! - `samples`: stratified chain samples over intermediate-size buckets.
//! - `runtime`: bucket population survey plus measured samples, projected
//!   to a total wall-clock estimate.
//!
//! Nothing here executes in parallel; each (e1, e2, e3) evaluation is
//! independent and side-effect-free, which is exactly what makes the
//! produced estimates usable for partitioning later.

pub mod bucket;
pub mod direction;
pub mod pipeline;
pub mod runtime;
pub mod samples;

pub use bucket::SizeBucket;
pub use direction::{
    BetterDirection, DirectionConfig, DirectionCostProfiler, DirectionSummary, HeadroomReport,
    MemoryStats, DIRECTION_HEADER, MEMORY_BYTES_PER_ENTRY,
};
pub use pipeline::{run_measured_pipeline, PipelineTiming};
pub use runtime::{
    load_bucket_timings, project_runtime, run_benchmarks, survey_population, write_estimate_tsv,
    BenchmarkRunStats, BucketPopulation, BucketTimings, ProjectionRow, RuntimeProjection,
    BENCHMARK_HEADER, ESTIMATE_HEADER,
};
pub use samples::{
    generate_samples, read_samples_tsv, write_samples_tsv, SamplePlan, SampleSpec, SAMPLES_HEADER,
};
