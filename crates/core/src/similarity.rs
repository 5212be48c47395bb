//! Pairwise similarity between a query aspect and a candidate field.

use crate::taxonomy::Taxonomy;
use crate::text::{normalize, tokenize};
use std::collections::HashMap;
use std::sync::Arc;

pub trait Similarity: Send + Sync {
    fn similarity(&self, aspect: &str, field: &str) -> f64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyntacticSimilarity;

impl Similarity for SyntacticSimilarity {
    fn similarity(&self, aspect: &str, field: &str) -> f64 {
        let aspect = normalize(aspect);
        let field = normalize(field);
        if aspect.is_empty() || field.is_empty() {
            return 0.0;
        }

        let a = term_counts(&aspect);
        let b = term_counts(&field);
        let dot: f64 = a
            .iter()
            .filter_map(|(term, ca)| b.get(term).map(|cb| ca * cb))
            .sum();
        let na: f64 = a.values().map(|c| c * c).sum();
        let nb: f64 = b.values().map(|c| c * c).sum();
        if na == 0.0 || nb == 0.0 {
            return 0.0;
        }
        (dot / (na * nb).sqrt()).clamp(0.0, 1.0)
    }
}

fn term_counts(normalized: &str) -> HashMap<&str, f64> {
    let mut counts = HashMap::new();
    for token in tokenize(normalized) {
        *counts.entry(token).or_insert(0.0) += 1.0;
    }
    counts
}

#[derive(Debug, Clone)]
pub struct SemanticSimilarity {
    taxonomy: Arc<Taxonomy>,
}

impl SemanticSimilarity {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }
}

impl Similarity for SemanticSimilarity {
    fn similarity(&self, aspect: &str, field: &str) -> f64 {
        let aspect = normalize(aspect);
        let field = normalize(field);
        if aspect.is_empty() || field.is_empty() {
            return 0.0;
        }
        if field.contains(&aspect) {
            return 1.0;
        }

        let aspect_senses = self.taxonomy.senses(&aspect);
        let field_senses = self.taxonomy.senses(&field);
        if aspect_senses.is_empty() || field_senses.is_empty() {
            return 0.0;
        }

        let mut best = 0.0f64;
        for &a in &aspect_senses {
            for &b in &field_senses {
                let sim = self.taxonomy.wup_similarity(a, b).unwrap_or(0.0);
                if sim > best {
                    best = sim;
                }
            }
        }
        best.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semantic() -> SemanticSimilarity {
        SemanticSimilarity::new(Arc::new(Taxonomy::builtin().unwrap()))
    }

    #[test]
    fn syntactic_self_similarity_is_one() {
        let sim = SyntacticSimilarity;
        for text in ["process payment", "a", "Send  EMAIL notification email", "!!!"] {
            assert_eq!(sim.similarity(text, text), 1.0, "{text}");
        }
    }

    #[test]
    fn syntactic_counts_shared_terms() {
        let sim = SyntacticSimilarity;
        // (1,1,0) . (1,1,1) / (sqrt(2) * sqrt(3))
        let expected = 2.0 / 6.0f64.sqrt();
        let got = sim.similarity("process payment", "Process payment transactions");
        assert!((got - expected).abs() < 1e-12, "got {got}");
        assert_eq!(sim.similarity("user login", "weather forecast"), 0.0);
    }

    #[test]
    fn empty_inputs_score_zero() {
        let syn = SyntacticSimilarity;
        let sem = semantic();
        assert_eq!(syn.similarity("", "payment"), 0.0);
        assert_eq!(syn.similarity("payment", "   "), 0.0);
        assert_eq!(sem.similarity("", "payment"), 0.0);
        assert_eq!(sem.similarity("payment", "\t"), 0.0);
    }

    #[test]
    fn semantic_substring_short_circuits() {
        let sem = semantic();
        assert_eq!(
            sem.similarity("Process Payment", "handles process payment transactions"),
            1.0
        );
        assert_eq!(sem.similarity("zzqx", "prefix zzqx suffix"), 1.0);
    }

    #[test]
    fn semantic_uses_taxonomy_for_related_terms() {
        let sem = semantic();
        let related = sem.similarity("payment", "transfer");
        assert!(related > 0.5 && related < 1.0, "got {related}");
        let unrelated = sem.similarity("payment", "weather");
        assert!(unrelated < related);
        assert_eq!(sem.similarity("payment", "no such phrase here"), 0.0);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let syn = SyntacticSimilarity;
        let sem = semantic();
        let samples = [
            "payment",
            "refund",
            "user login",
            "login",
            "email",
            "send notification email",
            "",
            "customer",
            "!!",
        ];
        for a in samples {
            for b in samples {
                for s in [syn.similarity(a, b), sem.similarity(a, b)] {
                    assert!((0.0..=1.0).contains(&s), "{a:?} vs {b:?} = {s}");
                }
            }
        }
    }
}
