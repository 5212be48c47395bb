//! Reduction of evaluation records to comparison metrics.
//!
//! Every metric is a [`Metric`] over the full record list. Rank-sensitive metrics read
//! `expected_rank`; precision@1 compares the top-1 prediction's identity directly.

use crate::models::{EvaluationRecord, MetricsReport, ServiceDescriptor};
use std::collections::BTreeMap;

pub const DEFAULT_RECALL_K: usize = 5;

pub trait Metric: Send + Sync {
    fn name(&self) -> String;
    fn compute(&self, records: &[EvaluationRecord]) -> f64;
}

pub fn is_match(predicted: Option<&ServiceDescriptor>, expected: &ServiceDescriptor) -> bool {
    predicted.is_some_and(|p| p.same_service(expected))
}

fn fraction(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

pub fn precision_at_1(records: &[EvaluationRecord]) -> f64 {
    let correct = records
        .iter()
        .filter(|r| is_match(r.predicted.as_ref(), &r.expected))
        .count();
    fraction(correct, records.len())
}

pub fn mean_reciprocal_rank(records: &[EvaluationRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records
        .iter()
        .filter_map(|r| r.expected_rank)
        .map(|rank| 1.0 / rank as f64)
        .sum();
    sum / records.len() as f64
}

pub fn recall_at_k(records: &[EvaluationRecord], k: usize) -> f64 {
    let hits = records
        .iter()
        .filter(|r| r.expected_rank.is_some_and(|rank| rank <= k))
        .count();
    fraction(hits, records.len())
}

pub struct PrecisionAt1;

impl Metric for PrecisionAt1 {
    fn name(&self) -> String {
        "precision_at_1".to_string()
    }

    fn compute(&self, records: &[EvaluationRecord]) -> f64 {
        precision_at_1(records)
    }
}

pub struct MeanReciprocalRank;

impl Metric for MeanReciprocalRank {
    fn name(&self) -> String {
        "mrr".to_string()
    }

    fn compute(&self, records: &[EvaluationRecord]) -> f64 {
        mean_reciprocal_rank(records)
    }
}

pub struct RecallAtK(pub usize);

impl Metric for RecallAtK {
    fn name(&self) -> String {
        format!("recall_at_{}", self.0)
    }

    fn compute(&self, records: &[EvaluationRecord]) -> f64 {
        recall_at_k(records, self.0)
    }
}

pub struct TotalQueries;

impl Metric for TotalQueries {
    fn name(&self) -> String {
        "total_queries".to_string()
    }

    fn compute(&self, records: &[EvaluationRecord]) -> f64 {
        records.len() as f64
    }
}

pub struct MetricsCalculator {
    metrics: Vec<Box<dyn Metric>>,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::with_recall_k(DEFAULT_RECALL_K)
    }
}

impl MetricsCalculator {
    pub fn new() -> Self {
        Self {
            metrics: Vec::new(),
        }
    }

    pub fn with_recall_k(k: usize) -> Self {
        Self::new()
            .with_metric(Box::new(PrecisionAt1))
            .with_metric(Box::new(MeanReciprocalRank))
            .with_metric(Box::new(RecallAtK(k)))
            .with_metric(Box::new(TotalQueries))
    }

    pub fn with_metric(mut self, metric: Box<dyn Metric>) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn calculate_all(&self, records: &[EvaluationRecord]) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|m| (m.name(), m.compute(records)))
            .collect()
    }

    pub fn report(&self, strategy: &str, dataset: &str, records: &[EvaluationRecord]) -> MetricsReport {
        MetricsReport {
            strategy: strategy.to_string(),
            dataset: dataset.to_string(),
            metrics: self.calculate_all(records),
        }
    }
}
