//! Properties tying the estimator's population survey to the composer's
//! enumeration, over random synthetic graphs.

use metapaths_core::build::{BuilderConfig, RelationMatrixBuilder, SymmetricPredicates};
use metapaths_core::catalog::{RelationCatalog, TypeCatalog};
use metapaths_core::compose::Composer;
use metapaths_core::hierarchy::AncestorTable;
use metapaths_core::ingest::{EdgeRecord, NodeRecord};
use metapaths_profile::{generate_samples, survey_population, SamplePlan};
use proptest::prelude::*;

const TYPES: [&str; 3] = ["A", "B", "C"];
const NODES_PER_TYPE: u32 = 4;
const PREDICATES: [&str; 2] = ["p", "q"];

#[derive(Debug, Clone)]
struct SyntheticGraph {
    edges: Vec<EdgeRecord>,
}

fn synthetic_graph() -> impl Strategy<Value = SyntheticGraph> {
    let edge = (0..3usize, 0..NODES_PER_TYPE, 0..2usize, 0..3usize, 0..NODES_PER_TYPE).prop_map(
        |(src_ty, src_n, pred, tgt_ty, tgt_n)| EdgeRecord {
            subject: format!("{}{}", TYPES[src_ty].to_lowercase(), src_n),
            predicate: PREDICATES[pred].to_string(),
            object: format!("{}{}", TYPES[tgt_ty].to_lowercase(), tgt_n),
        },
    );
    prop::collection::vec(edge, 0..40).prop_map(|edges| SyntheticGraph { edges })
}

fn build_catalog(graph: &SyntheticGraph) -> RelationCatalog {
    let hierarchy = AncestorTable::from_ancestor_lists(
        TYPES.iter().map(|&t| (t.to_string(), vec!["Root".to_string()])),
    );
    let nodes = TYPES.iter().flat_map(|&ty| {
        (0..NODES_PER_TYPE).map(move |n| NodeRecord {
            id: format!("{}{}", ty.to_lowercase(), n),
            category: vec![ty.to_string()],
        })
    });
    let types = TypeCatalog::from_records(&hierarchy, nodes);

    let builder = RelationMatrixBuilder::new(BuilderConfig {
        symmetric: SymmetricPredicates::empty(),
        ..BuilderConfig::default()
    });
    builder.build_from_records(&types, &graph.edges).unwrap().0
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn population_counts_sum_to_enumerated_triples(graph in synthetic_graph()) {
        let catalog = build_catalog(&graph);
        let population = survey_population(&catalog);
        let composer = Composer::new(&catalog);
        prop_assert_eq!(population.total(), composer.count_valid_triples());
    }

    #[test]
    fn sample_budget_is_never_exceeded(graph in synthetic_graph(), budget in 0usize..50) {
        let catalog = build_catalog(&graph);
        let samples = generate_samples(&catalog, &SamplePlan { total: budget, seed: 9 });
        prop_assert!(samples.len() <= budget);

        // Every sampled chain is one the composer would enumerate.
        let composer = Composer::new(&catalog);
        prop_assert!(samples.len() as u64 <= composer.count_valid_triples());
        for sample in &samples {
            prop_assert!(catalog.matrix(&sample.chain[0]).is_some());
            prop_assert!(catalog.matrix(&sample.chain[1]).is_some());
            prop_assert!(catalog.matrix(&sample.chain[2]).is_some());
            prop_assert_eq!(sample.chain[1].source_type, sample.chain[0].target_type);
            prop_assert_eq!(sample.chain[2].source_type, sample.chain[1].target_type);
        }
    }
}
