//! Metapath string rendering.
//!
//! A metapath is alternating type labels and `predicate|direction` tokens,
//! pipe-joined, direction `F` or `R`:
//! `TypeA|predicateX|F|TypeB|predicateY|R|TypeC`. The per-type-pair
//! aggregate uses the pseudo-predicate `ANY` with direction `A`.

use crate::catalog::TypedRelationKey;
use crate::intern::{TypeId, Vocabulary};

pub const SEPARATOR: &str = "|";
pub const ANY_PREDICATE: &str = "ANY";
pub const ANY_DIRECTION: &str = "A";

fn type_label(vocab: &Vocabulary, id: TypeId) -> String {
    vocab.type_label(id).unwrap_or_else(|| "?".to_string())
}

/// Render one hop: `SourceType|predicate|direction|TargetType`.
pub fn format_one_hop(vocab: &Vocabulary, key: &TypedRelationKey) -> String {
    [
        type_label(vocab, key.source_type),
        vocab.pred_label(key.predicate).unwrap_or_else(|| "?".to_string()),
        key.direction.letter().to_string(),
        type_label(vocab, key.target_type),
    ]
    .join(SEPARATOR)
}

/// Render a 3-hop chain across its four boundary types.
pub fn format_three_hop(vocab: &Vocabulary, chain: &[TypedRelationKey; 3]) -> String {
    let mut parts = Vec::with_capacity(10);
    for key in chain {
        parts.push(type_label(vocab, key.source_type));
        parts.push(
            vocab
                .pred_label(key.predicate)
                .unwrap_or_else(|| "?".to_string()),
        );
        parts.push(key.direction.letter().to_string());
    }
    parts.push(type_label(vocab, chain[2].target_type));
    parts.join(SEPARATOR)
}

/// Render the aggregate pseudo-hop: `SourceType|ANY|A|TargetType`.
pub fn format_any_hop(vocab: &Vocabulary, source: TypeId, target: TypeId) -> String {
    [
        type_label(vocab, source),
        ANY_PREDICATE.to_string(),
        ANY_DIRECTION.to_string(),
        type_label(vocab, target),
    ]
    .join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Direction;

    #[test]
    fn renders_hops_in_pipe_separated_form() {
        let vocab = Vocabulary::new();
        let a = vocab.type_id("TypeA");
        let b = vocab.type_id("TypeB");
        let c = vocab.type_id("TypeC");
        let p = vocab.pred_id("predicateX");
        let q = vocab.pred_id("predicateY");

        let first = TypedRelationKey::forward(a, p, b);
        let second = TypedRelationKey {
            source_type: b,
            predicate: q,
            target_type: c,
            direction: Direction::Reverse,
        };
        let third = TypedRelationKey::forward(c, p, a);

        assert_eq!(format_one_hop(&vocab, &first), "TypeA|predicateX|F|TypeB");
        assert_eq!(
            format_three_hop(&vocab, &[first, second, third]),
            "TypeA|predicateX|F|TypeB|predicateY|R|TypeC|predicateX|F|TypeA"
        );
        assert_eq!(format_any_hop(&vocab, a, c), "TypeA|ANY|A|TypeC");
    }
}
