use crate::dataset::Dataset;
use crate::metrics::MetricsCalculator;
use crate::models::{EvaluationRecord, MetricsReport};
use crate::strategy::{Strategy, StrategyRegistry};
use std::time::Instant;
use tracing::{debug, info};

pub async fn collect_records(strategy: &dyn Strategy, dataset: &Dataset) -> Vec<EvaluationRecord> {
    let mut records = Vec::with_capacity(dataset.len());
    for (idx, case) in dataset.cases.iter().enumerate() {
        let ranked = strategy.rank(&case.query).await;
        let expected_rank = ranked
            .iter()
            .position(|candidate| candidate.same_service(&case.expected_service))
            .map(|pos| pos + 1);
        let predicted = ranked.into_iter().next();
        debug!(
            "[{}] {}/{} {:?} -> {:?}",
            strategy.id(),
            idx + 1,
            dataset.len(),
            case.query,
            predicted.as_ref().map(|p| p.url.as_str())
        );
        records.push(EvaluationRecord {
            query: case.query.clone(),
            predicted,
            expected: case.expected_service.clone(),
            expected_rank,
        });
    }
    records
}

pub async fn evaluate(
    strategies: &StrategyRegistry,
    dataset: &Dataset,
    calculator: &MetricsCalculator,
) -> Vec<MetricsReport> {
    let mut reports = Vec::with_capacity(strategies.len());
    for strategy in strategies.iter() {
        info!(
            "Testing strategy {} on {} queries...",
            strategy.id(),
            dataset.len()
        );
        let started = Instant::now();
        let records = collect_records(strategy.as_ref(), dataset).await;
        let report = calculator.report(strategy.id(), &dataset.id, &records);
        info!(
            "Results for {} ({:.1?}): {:?}",
            strategy.id(),
            started.elapsed(),
            report.metrics
        );
        reports.push(report);
    }
    reports
}
