//! Stratified chain samples for benchmarking.
//!
//! Exhaustive enumeration is too large to time wholesale, so chains are
//! sampled per intermediate-size bucket: every bucket gets its guaranteed
//! minimum where population allows, then the remaining budget fills in
//! proportion to bucket population. Each bucket's candidates are shuffled
//! once with a seeded generator, so a plan is reproducible and never picks
//! the same chain twice.

use crate::bucket::SizeBucket;
use anyhow::Result;
use metapaths_core::catalog::{Direction, RelationCatalog, TypedRelationKey};
use metapaths_core::compose::Composer;
use metapaths_core::intern::Vocabulary;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::{BufRead, BufWriter, Write};
use std::ops::ControlFlow;
use tracing::{info, warn};

pub const SAMPLES_HEADER: &str = "bucket\tsrc_type1\tpred1\ttgt_type1\tdir1\t\
    src_type2\tpred2\ttgt_type2\tdir2\tsrc_type3\tpred3\ttgt_type3\tdir3\tab_edges";

/// One sampled chain with the intermediate size that bucketed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    pub bucket: SizeBucket,
    pub chain: [TypedRelationKey; 3],
    pub ab_edges: u64,
}

#[derive(Debug, Clone)]
pub struct SamplePlan {
    /// Total sample budget across all buckets.
    pub total: usize,
    pub seed: u64,
}

impl Default for SamplePlan {
    fn default() -> Self {
        Self {
            total: 1_000,
            seed: 42,
        }
    }
}

/// Draw a stratified sample of valid chains from the catalog.
pub fn generate_samples(catalog: &RelationCatalog, plan: &SamplePlan) -> Vec<SampleSpec> {
    let composer = Composer::new(catalog);

    // Collect the candidate population per bucket.
    let mut candidates: [Vec<SampleSpec>; 7] = Default::default();
    composer.for_each_pair(|context| {
        let ab_edges = context.product.nnz();
        let bucket = SizeBucket::classify(ab_edges);
        for &third in context.third_candidates {
            let Some(m3) = catalog.matrix(&third) else {
                continue;
            };
            if context.product.ncols() != m3.nrows() {
                continue;
            }
            candidates[bucket.index()].push(SampleSpec {
                bucket,
                chain: [context.first, context.second, third],
                ab_edges,
            });
        }
        ControlFlow::Continue(())
    });

    let population: u64 = candidates.iter().map(|c| c.len() as u64).sum();
    info!(population, budget = plan.total, "stratified sampling");

    let mut rng = StdRng::seed_from_u64(plan.seed);
    for bucket_candidates in candidates.iter_mut() {
        bucket_candidates.shuffle(&mut rng);
    }

    // First pass: guaranteed minimums, ladder order.
    let mut taken = [0usize; 7];
    let mut remaining = plan.total;
    for bucket in SizeBucket::ALL {
        let available = candidates[bucket.index()].len();
        let allocated = bucket
            .default_min_samples()
            .min(available)
            .min(remaining);
        taken[bucket.index()] = allocated;
        remaining -= allocated;
    }

    // Second pass: the rest of the budget, proportional to population.
    if remaining > 0 && population > 0 {
        for bucket in SizeBucket::ALL {
            let available = candidates[bucket.index()].len();
            let extra = (remaining as u64 * available as u64 / population) as usize;
            let already = taken[bucket.index()];
            taken[bucket.index()] = available.min(already + extra);
        }
    }

    let mut samples = Vec::new();
    for bucket in SizeBucket::ALL {
        let count = taken[bucket.index()];
        samples.extend(candidates[bucket.index()].iter().take(count).copied());
        if count > 0 {
            info!(bucket = bucket.name(), samples = count, "bucket sampled");
        }
    }
    samples
}

fn key_columns(vocab: &Vocabulary, key: &TypedRelationKey) -> [String; 4] {
    [
        vocab
            .type_label(key.source_type)
            .unwrap_or_else(|| "?".to_string()),
        vocab
            .pred_label(key.predicate)
            .unwrap_or_else(|| "?".to_string()),
        vocab
            .type_label(key.target_type)
            .unwrap_or_else(|| "?".to_string()),
        key.direction.letter().to_string(),
    ]
}

pub fn write_samples_tsv<W: Write>(
    catalog: &RelationCatalog,
    samples: &[SampleSpec],
    out: W,
) -> Result<()> {
    let vocab = catalog.vocab();
    let mut writer = BufWriter::new(out);
    writeln!(writer, "{SAMPLES_HEADER}")?;

    for sample in samples {
        let mut columns = vec![sample.bucket.name().to_string()];
        for key in &sample.chain {
            let [src, pred, tgt, dir] = key_columns(vocab, key);
            columns.extend([src, pred, tgt, dir]);
        }
        columns.push(sample.ab_edges.to_string());
        writeln!(writer, "{}", columns.join("\t"))?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_direction(token: &str) -> Option<Direction> {
    match token {
        "F" => Some(Direction::Forward),
        "R" => Some(Direction::Reverse),
        _ => None,
    }
}

fn parse_key(catalog: &RelationCatalog, columns: &[&str]) -> Option<TypedRelationKey> {
    let vocab = catalog.vocab();
    let key = TypedRelationKey {
        source_type: vocab.find_type(columns[0])?,
        predicate: vocab.find_pred(columns[1])?,
        target_type: vocab.find_type(columns[2])?,
        direction: parse_direction(columns[3])?,
    };
    catalog.matrix(&key)?;
    Some(key)
}

/// Read a sample list back against a catalog. Rows naming unknown
/// relations or otherwise malformed are skipped with a warning; the
/// catalog may have been rebuilt from different data.
pub fn read_samples_tsv<R: BufRead>(
    catalog: &RelationCatalog,
    input: R,
) -> Result<Vec<SampleSpec>> {
    let mut samples = Vec::new();
    for (line_number, line) in input.lines().enumerate() {
        let line = line?;
        if line_number == 0 || line.is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        let parsed = (columns.len() == 14).then_some(()).and_then(|_| {
            Some(SampleSpec {
                bucket: SizeBucket::parse(columns[0])?,
                chain: [
                    parse_key(catalog, &columns[1..5])?,
                    parse_key(catalog, &columns[5..9])?,
                    parse_key(catalog, &columns[9..13])?,
                ],
                ab_edges: columns[13].parse().ok()?,
            })
        });

        match parsed {
            Some(sample) => samples.push(sample),
            None => warn!(line = line_number + 1, "skipping malformed sample row"),
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metapaths_core::build::{BuilderConfig, RelationMatrixBuilder, SymmetricPredicates};
    use metapaths_core::catalog::TypeCatalog;
    use metapaths_core::hierarchy::AncestorTable;
    use metapaths_core::ingest::{EdgeRecord, NodeRecord};

    fn catalog() -> RelationCatalog {
        let hierarchy = AncestorTable::from_ancestor_lists([
            ("A", vec!["Root"]),
            ("B", vec!["Root"]),
            ("C", vec!["Root"]),
        ]);
        let nodes = [
            ("a0", "A"),
            ("b0", "B"),
            ("b1", "B"),
            ("c0", "C"),
        ]
        .map(|(id, ty)| NodeRecord {
            id: id.to_string(),
            category: vec![ty.to_string()],
        });
        let types = TypeCatalog::from_records(&hierarchy, nodes);

        let edges = [
            ("a0", "p", "b0"),
            ("a0", "p", "b1"),
            ("b0", "q", "c0"),
            ("b1", "q", "c0"),
        ]
        .map(|(s, p, o)| EdgeRecord {
            subject: s.to_string(),
            predicate: p.to_string(),
            object: o.to_string(),
        });

        RelationMatrixBuilder::new(BuilderConfig {
            symmetric: SymmetricPredicates::empty(),
            ..BuilderConfig::default()
        })
        .build_from_records(&types, &edges)
        .unwrap()
        .0
    }

    #[test]
    fn sampling_is_deterministic_per_seed() {
        let catalog = catalog();
        let plan = SamplePlan {
            total: 10,
            seed: 7,
        };
        let first = generate_samples(&catalog, &plan);
        let second = generate_samples(&catalog, &plan);
        assert_eq!(first, second);
        assert!(!first.is_empty());
        assert!(first.len() <= 10);
    }

    #[test]
    fn budget_caps_below_minimums() {
        let catalog = catalog();
        let plan = SamplePlan { total: 2, seed: 1 };
        let samples = generate_samples(&catalog, &plan);
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn minimums_are_honored_where_population_allows() {
        let catalog = catalog();
        let plan = SamplePlan {
            total: 10_000,
            seed: 1,
        };
        let samples = generate_samples(&catalog, &plan);

        // The tiny graph's whole population sits in the tiny bucket and is
        // below the tiny minimum, so everything gets sampled exactly once.
        let composer = Composer::new(&catalog);
        assert_eq!(samples.len() as u64, composer.count_valid_triples());
        assert!(samples.iter().all(|s| s.bucket == SizeBucket::Tiny));

        let mut seen = samples.clone();
        seen.sort_by_key(|s| {
            (
                s.chain[0].source_type,
                s.chain[0].predicate,
                s.chain[1].predicate,
                s.chain[2].predicate,
                s.chain[0].direction as u8,
                s.chain[1].direction as u8,
                s.chain[2].direction as u8,
                s.chain[1].source_type,
                s.chain[2].source_type,
                s.chain[2].target_type,
            )
        });
        seen.dedup();
        assert_eq!(seen.len(), samples.len());
    }

    #[test]
    fn samples_round_trip_through_tsv() {
        let catalog = catalog();
        let samples = generate_samples(
            &catalog,
            &SamplePlan {
                total: 5,
                seed: 3,
            },
        );

        let mut buffer = Vec::new();
        write_samples_tsv(&catalog, &samples, &mut buffer).unwrap();

        let restored =
            read_samples_tsv(&catalog, std::io::Cursor::new(buffer)).unwrap();
        assert_eq!(restored, samples);
    }

    #[test]
    fn unknown_relations_in_sample_file_are_skipped() {
        let catalog = catalog();
        let input = format!(
            "{}\ntiny\tZ\tnope\tZ\tF\tZ\tnope\tZ\tF\tZ\tnope\tZ\tF\t3\nshort\trow\n",
            SAMPLES_HEADER
        );
        let restored =
            read_samples_tsv(&catalog, std::io::Cursor::new(input)).unwrap();
        assert!(restored.is_empty());
    }
}
