//! Properties of the existential boolean product.

use metapaths_core::matrix::RelationMatrix;
use proptest::prelude::*;

const MAX_DIM: u32 = 8;

fn matrix_strategy(nrows: u32, ncols: u32) -> impl Strategy<Value = RelationMatrix> {
    let max_entries = (nrows * ncols) as usize;
    prop::collection::vec((0..nrows, 0..ncols), 0..=max_entries).prop_map(move |pairs| {
        RelationMatrix::from_pairs(nrows, ncols, pairs).expect("coordinates in bounds")
    })
}

/// A dimension-compatible (A, B) pair.
fn composable_pair() -> impl Strategy<Value = (RelationMatrix, RelationMatrix)> {
    (1..=MAX_DIM, 1..=MAX_DIM, 1..=MAX_DIM).prop_flat_map(|(a, b, c)| {
        (matrix_strategy(a, b), matrix_strategy(b, c))
    })
}

/// A dimension-compatible (A, B, C) chain, as over a synthetic 3-type graph.
fn composable_chain() -> impl Strategy<Value = (RelationMatrix, RelationMatrix, RelationMatrix)> {
    (1..=MAX_DIM, 1..=MAX_DIM, 1..=MAX_DIM, 1..=MAX_DIM).prop_flat_map(|(a, b, c, d)| {
        (
            matrix_strategy(a, b),
            matrix_strategy(b, c),
            matrix_strategy(c, d),
        )
    })
}

fn naive_product(a: &RelationMatrix, b: &RelationMatrix) -> Vec<(u32, u32)> {
    let mut entries = Vec::new();
    for i in 0..a.nrows() {
        for j in 0..b.ncols() {
            let reachable = (0..a.ncols()).any(|k| a.contains(i, k) && b.contains(k, j));
            if reachable {
                entries.push((i, j));
            }
        }
    }
    entries
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn product_matches_existential_semantics((a, b) in composable_pair()) {
        let product = a.existential_product(&b).unwrap();
        let expected = naive_product(&a, &b);

        prop_assert_eq!(product.iter_entries().collect::<Vec<_>>(), expected);
        prop_assert_eq!(product.nrows(), a.nrows());
        prop_assert_eq!(product.ncols(), b.ncols());
    }

    #[test]
    fn product_nnz_is_bounded((a, b) in composable_pair()) {
        let product = a.existential_product(&b).unwrap();
        let bound = (a.nnz() * b.ncols() as u64).min(a.nrows() as u64 * b.nnz());
        prop_assert!(product.nnz() <= bound);
    }

    #[test]
    fn nonzero_pattern_is_associative((a, b, c) in composable_chain()) {
        let left = a
            .existential_product(&b)
            .unwrap()
            .existential_product(&c)
            .unwrap();
        let right = a
            .existential_product(&b.existential_product(&c).unwrap())
            .unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn forward_and_reverse_chains_have_equal_nnz((a, b, c) in composable_chain()) {
        let forward = a
            .existential_product(&b)
            .unwrap()
            .existential_product(&c)
            .unwrap();
        let reverse = c
            .transpose()
            .existential_product(&b.transpose())
            .unwrap()
            .existential_product(&a.transpose())
            .unwrap();

        prop_assert_eq!(forward.nnz(), reverse.nnz());
        prop_assert_eq!(forward.nrows(), reverse.ncols());
        prop_assert_eq!(forward.ncols(), reverse.nrows());
    }

    #[test]
    fn transpose_is_an_involution(m in (1..=MAX_DIM, 1..=MAX_DIM).prop_flat_map(|(r, c)| matrix_strategy(r, c))) {
        prop_assert_eq!(m.transpose().transpose(), m);
    }
}
