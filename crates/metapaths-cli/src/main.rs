//! Metapaths CLI
//!
//! Command-line surface for the metapath analysis engine:
//! - `overlap`: enumerate 3-hop chains and score them against 1-hop edges
//! - `metrics`: derive the classification table from an overlap TSV
//! - `bench direction`: forward vs reverse cost profiling
//! - `bench samples` / `bench run`: stratified benchmark samples
//! - `estimate`: project total enumeration runtime from measured samples

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use metapaths_core::build::{BuilderConfig, RelationMatrixBuilder, SymmetricPredicates};
use metapaths_core::catalog::RelationCatalog;
use metapaths_core::hierarchy::AncestorTable;
use metapaths_core::ingest::{load_type_catalog, EdgeFile};
use metapaths_core::memory::default_probe;
use metapaths_core::metrics::derive_classification_table;
use metapaths_core::overlap::OverlapEvaluator;
use metapaths_profile::direction::{DirectionConfig, DirectionCostProfiler, DirectionSummary};
use metapaths_profile::runtime::{
    load_bucket_timings, project_runtime, run_benchmarks, survey_population, write_estimate_tsv,
    RuntimeProjection,
};
use metapaths_profile::samples::{
    generate_samples, read_samples_tsv, write_samples_tsv, SamplePlan,
};

#[derive(Parser)]
#[command(name = "metapaths")]
#[command(
    author,
    version,
    about = "3-hop metapath composition and performance analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate 3-hop metapaths and write the overlap table.
    Overlap {
        #[command(flatten)]
        graph: GraphArgs,
        /// Output TSV path.
        #[arg(long)]
        output: PathBuf,
    },

    /// Derive classification metrics from an overlap table.
    Metrics {
        /// Overlap TSV produced by `overlap`.
        #[arg(long)]
        overlap: PathBuf,
        /// Output TSV path.
        #[arg(long)]
        output: PathBuf,
    },

    /// Cost benchmarks (direction profiling, stratified samples).
    Bench {
        #[command(subcommand)]
        command: BenchCommands,
    },

    /// Project total enumeration runtime from measured samples.
    Estimate {
        #[command(flatten)]
        graph: GraphArgs,
        /// Benchmark-results TSV from `bench run`; omit to only survey.
        #[arg(long)]
        benchmark: Option<PathBuf>,
        /// Optional output TSV for the estimate table.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BenchCommands {
    /// Compare forward vs reverse evaluation order on sampled chains.
    Direction {
        #[command(flatten)]
        graph: GraphArgs,
        /// Maximum chains to profile.
        #[arg(long, default_value_t = 1_000)]
        max_samples: usize,
        /// Output TSV path.
        #[arg(long)]
        output: PathBuf,
    },

    /// Generate a stratified sample list for benchmarking.
    Samples {
        #[command(flatten)]
        graph: GraphArgs,
        /// Total samples across all buckets.
        #[arg(long, default_value_t = 1_000)]
        total_samples: usize,
        /// Sampling seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Output TSV path.
        #[arg(long)]
        output: PathBuf,
    },

    /// Execute a sample list under measurement.
    Run {
        #[command(flatten)]
        graph: GraphArgs,
        /// Sample TSV from `bench samples`.
        #[arg(long)]
        samples: PathBuf,
        /// Output TSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Args, Clone)]
struct GraphArgs {
    /// Node records, JSON-Lines.
    #[arg(long)]
    nodes: PathBuf,

    /// Edge records, JSON-Lines.
    #[arg(long)]
    edges: PathBuf,

    /// Type hierarchy JSON: label -> [ancestors].
    #[arg(long)]
    hierarchy: PathBuf,

    /// JSON array of symmetric predicate labels; defaults to the stock
    /// list when omitted.
    #[arg(long)]
    symmetric_predicates: Option<PathBuf>,

    /// Taxonomic predicate excluded from the metapath universe.
    #[arg(long, default_value = "subclass_of")]
    is_a_predicate: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Overlap { graph, output } => cmd_overlap(&graph, &output),
        Commands::Metrics { overlap, output } => cmd_metrics(&overlap, &output),
        Commands::Bench { command } => match command {
            BenchCommands::Direction {
                graph,
                max_samples,
                output,
            } => cmd_direction(&graph, max_samples, &output),
            BenchCommands::Samples {
                graph,
                total_samples,
                seed,
                output,
            } => cmd_samples(&graph, total_samples, seed, &output),
            BenchCommands::Run {
                graph,
                samples,
                output,
            } => cmd_run(&graph, &samples, &output),
        },
        Commands::Estimate {
            graph,
            benchmark,
            output,
        } => cmd_estimate(&graph, benchmark.as_deref(), output.as_deref()),
    }
}

/// Load the hierarchy, resolve node types, and build the relation catalog.
fn load_catalog(args: &GraphArgs) -> Result<RelationCatalog> {
    let hierarchy = AncestorTable::load(&args.hierarchy)?;
    let types = load_type_catalog(&args.nodes, &hierarchy)?;

    let symmetric = match &args.symmetric_predicates {
        Some(path) => SymmetricPredicates::load(path)
            .with_context(|| format!("loading symmetric predicates {}", path.display()))?,
        None => SymmetricPredicates::default(),
    };
    let builder = RelationMatrixBuilder::new(BuilderConfig {
        is_a_predicate: args.is_a_predicate.clone(),
        symmetric,
    });

    let edges = EdgeFile::new(&args.edges);
    let (catalog, stats) = builder.build_from_file(&types, &edges)?;

    println!(
        "{} {} matrices from {} edges ({} is-a skipped, {} dropped, {} nodes unresolved)",
        "built".green().bold(),
        catalog.len(),
        stats.edges_processed,
        stats.edges_skipped_is_a,
        stats.edges_dropped_unresolved,
        types.unresolved(),
    );
    Ok(catalog)
}

fn cmd_overlap(graph: &GraphArgs, output: &std::path::Path) -> Result<()> {
    let catalog = load_catalog(graph)?;
    let probe = default_probe();

    let out = File::create(output)
        .with_context(|| format!("creating output file {}", output.display()))?;
    let stats = OverlapEvaluator::new(&catalog, probe.as_ref()).run(out)?;

    println!(
        "{} {} overlap rows from {} composed chains -> {}",
        "wrote".green().bold(),
        stats.rows_written,
        stats.chains_composed,
        output.display(),
    );
    Ok(())
}

fn cmd_metrics(overlap: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let input = File::open(overlap)
        .with_context(|| format!("opening overlap table {}", overlap.display()))?;
    let out = File::create(output)
        .with_context(|| format!("creating output file {}", output.display()))?;

    let stats = derive_classification_table(BufReader::new(input), out)?;
    println!(
        "{} {} metric rows ({} malformed rows skipped) -> {}",
        "wrote".green().bold(),
        stats.rows_written,
        stats.rows_skipped,
        output.display(),
    );
    Ok(())
}

fn cmd_direction(graph: &GraphArgs, max_samples: usize, output: &std::path::Path) -> Result<()> {
    let catalog = load_catalog(graph)?;
    let profiler = DirectionCostProfiler::new(
        &catalog,
        DirectionConfig {
            max_samples,
            ..DirectionConfig::default()
        },
    );

    let out = File::create(output)
        .with_context(|| format!("creating output file {}", output.display()))?;
    let summary = profiler.run(out)?;
    print_direction_summary(&summary);
    println!(
        "{} per-sample rows -> {}",
        "wrote".green().bold(),
        output.display()
    );
    Ok(())
}

fn print_direction_summary(summary: &DirectionSummary) {
    println!("\n{}", "direction comparison".bold());
    println!(
        "  compared: {}  forward faster: {}  reverse faster: {}  equal: {}",
        summary.compared, summary.forward_faster, summary.reverse_faster, summary.equal,
    );
    println!(
        "  skipped: {} forward-dead, {} reverse-dead, {} both",
        summary.forward_skipped, summary.reverse_skipped, summary.both_skipped,
    );

    println!("\n{}", "parallelization headroom".bold());
    println!("  {:<12} {:>14} {:>14}", "budget (MB)", "forward fits", "reverse fits");
    for row in &summary.headroom.rows {
        println!(
            "  {:<12} {:>14} {:>14}",
            row.budget_mb, row.forward_fits, row.reverse_fits
        );
    }

    for (label, stats) in [
        ("forward", &summary.headroom.forward),
        ("reverse", &summary.headroom.reverse),
    ] {
        if let Some(s) = stats {
            println!(
                "  {label}: min {:.2}  median {:.2}  mean {:.2}  p95 {:.2}  max {:.2} MB",
                s.min, s.median, s.mean, s.p95, s.max
            );
        }
    }
}

fn cmd_samples(
    graph: &GraphArgs,
    total_samples: usize,
    seed: u64,
    output: &std::path::Path,
) -> Result<()> {
    let catalog = load_catalog(graph)?;
    let samples = generate_samples(
        &catalog,
        &SamplePlan {
            total: total_samples,
            seed,
        },
    );

    let out = File::create(output)
        .with_context(|| format!("creating output file {}", output.display()))?;
    write_samples_tsv(&catalog, &samples, out)?;

    println!(
        "{} {} stratified samples -> {}",
        "wrote".green().bold(),
        samples.len(),
        output.display(),
    );
    Ok(())
}

fn cmd_run(graph: &GraphArgs, samples: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let catalog = load_catalog(graph)?;

    let input = File::open(samples)
        .with_context(|| format!("opening sample list {}", samples.display()))?;
    let sample_list = read_samples_tsv(&catalog, BufReader::new(input))?;
    println!("loaded {} samples", sample_list.len());

    let out = File::create(output)
        .with_context(|| format!("creating output file {}", output.display()))?;
    let stats = run_benchmarks(&catalog, &sample_list, out)?;

    println!(
        "{} {} benchmark rows ({} dead chains skipped) -> {}",
        "wrote".green().bold(),
        stats.rows_written,
        stats.samples_skipped,
        output.display(),
    );
    Ok(())
}

fn cmd_estimate(
    graph: &GraphArgs,
    benchmark: Option<&std::path::Path>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let catalog = load_catalog(graph)?;
    let population = survey_population(&catalog);

    let Some(benchmark) = benchmark else {
        println!(
            "\n{} {} total iterations across buckets",
            "surveyed".green().bold(),
            population.total()
        );
        println!("no benchmark data provided; to estimate runtime:");
        println!("  1. metapaths bench samples ... --output samples.tsv");
        println!("  2. metapaths bench run ... --samples samples.tsv --output results.tsv");
        println!("  3. metapaths estimate ... --benchmark results.tsv");
        return Ok(());
    };

    let input = File::open(benchmark)
        .with_context(|| format!("opening benchmark results {}", benchmark.display()))?;
    let timings = load_bucket_timings(BufReader::new(input))?;
    let projection = project_runtime(&population, &timings);

    print_projection(&projection);

    if let Some(output) = output {
        let out = File::create(output)
            .with_context(|| format!("creating output file {}", output.display()))?;
        write_estimate_tsv(&projection, out)?;
        println!("{} estimate table -> {}", "wrote".green().bold(), output.display());
    }
    Ok(())
}

fn print_projection(projection: &RuntimeProjection) {
    println!("\n{}", "projected enumeration cost".bold());
    println!(
        "  {:<10} {:>14} {:>9} {:>12} {:>16}",
        "bucket", "iterations", "percent", "avg time", "estimated total"
    );
    for row in &projection.rows {
        let average = row
            .average_secs
            .map(|v| format!("{v:.4}s"))
            .unwrap_or_else(|| "unknown".to_string());
        let projected = row
            .projected_secs
            .map(|v| format!("{v:.0}s"))
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {:<10} {:>14} {:>8.2}% {:>12} {:>16}",
            row.bucket.name(),
            row.population,
            row.share,
            average,
            projected,
        );
    }

    let total = projection.known_total_secs;
    println!(
        "\n  {} {:.0} seconds = {:.0} minutes = {:.1} hours = {:.1} days",
        "total (measured buckets):".bold(),
        total,
        total / 60.0,
        total / 3600.0,
        total / 86400.0,
    );
    if !projection.unknown_buckets.is_empty() {
        let names: Vec<&str> = projection
            .unknown_buckets
            .iter()
            .map(|b| b.name())
            .collect();
        println!(
            "  {} {}",
            "unmeasured buckets (excluded):".yellow(),
            names.join(", ")
        );
    }
    let _ = std::io::stdout().flush();
}
