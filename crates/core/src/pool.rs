//! Fixed-size worker pool for per-entry scoring.
//!
//! Each entry travels to a worker as an owned [`ScoreTask`]; workers share nothing but
//! the read-only similarity function and send back a [`ScoreOutcome`]. All outcomes are
//! collected before ordering, so the result never depends on completion order.

use crate::matcher::{self, score_entry};
use crate::models::{Query, ScoredCandidate, ServiceDescriptor};
use crate::registry::Registry;
use crate::similarity::Similarity;
use crossbeam_channel::{bounded, unbounded};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ScoreTask {
    pub index: usize,
    pub service: ServiceDescriptor,
    pub query: Query,
    pub threshold: f64,
}

#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub index: usize,
    pub candidate: Option<ScoredCandidate>,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn with_available_parallelism() -> Self {
        Self::new(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        )
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run<S: Similarity + ?Sized>(
        &self,
        tasks: Vec<ScoreTask>,
        similarity: &S,
    ) -> Vec<ScoreOutcome> {
        let expected = tasks.len();
        let (task_tx, task_rx) = bounded::<ScoreTask>(self.workers * 2);
        let (result_tx, result_rx) = unbounded::<ScoreOutcome>();

        let mut outcomes: Vec<ScoreOutcome> = std::thread::scope(|scope| {
            for _ in 0..self.workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for task in task_rx {
                        if result_tx.send(score_task(task, similarity)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(task_rx);
            drop(result_tx);

            for task in tasks {
                if task_tx.send(task).is_err() {
                    break;
                }
            }
            drop(task_tx);

            result_rx.iter().collect()
        });

        debug!(
            "worker pool scored {}/{} tasks on {} workers",
            outcomes.len(),
            expected,
            self.workers
        );
        outcomes.sort_by_key(|o| o.index);
        outcomes
    }
}

fn score_task<S: Similarity + ?Sized>(task: ScoreTask, similarity: &S) -> ScoreOutcome {
    let ScoreTask {
        index,
        service,
        query,
        threshold,
    } = task;
    let candidate = score_entry(&service, &query, similarity, threshold).map(
        |(score, matched_aspects)| ScoredCandidate {
            service,
            score,
            matched_aspects,
        },
    );
    ScoreOutcome { index, candidate }
}

pub fn match_services_parallel<S: Similarity + ?Sized>(
    registry: &Registry,
    query: &Query,
    similarity: &S,
    threshold: f64,
    pool: &WorkerPool,
) -> Vec<ScoredCandidate> {
    let tasks = registry
        .services()
        .iter()
        .enumerate()
        .map(|(index, service)| ScoreTask {
            index,
            service: service.clone(),
            query: query.clone(),
            threshold,
        })
        .collect();
    let scored = pool
        .run(tasks, similarity)
        .into_iter()
        .filter_map(|o| o.candidate)
        .collect();
    matcher::rank(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::SyntacticSimilarity;

    fn registry(n: usize) -> Registry {
        Registry::new(
            (0..n)
                .map(|i| {
                    ServiceDescriptor::new(
                        format!("service {}", i % 7),
                        format!("handles payment request {}", i % 3),
                        format!("u{i}"),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn outcomes_come_back_in_task_order() {
        let reg = registry(50);
        let query = Query::uniform("payment request", &["name", "description"]);
        let tasks: Vec<_> = reg
            .services()
            .iter()
            .enumerate()
            .map(|(index, service)| ScoreTask {
                index,
                service: service.clone(),
                query: query.clone(),
                threshold: 0.3,
            })
            .collect();
        let outcomes = WorkerPool::new(4).run(tasks, &SyntacticSimilarity);
        let indices: Vec<_> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn parallel_matches_sequential_for_any_worker_count() {
        let reg = registry(64);
        let query = Query::uniform("service 3 payment", &["name", "description"]);
        let sequential = matcher::match_services(&reg, &query, &SyntacticSimilarity, 0.3);
        for workers in [1, 2, 3, 8, 100] {
            let parallel = match_services_parallel(
                &reg,
                &query,
                &SyntacticSimilarity,
                0.3,
                &WorkerPool::new(workers),
            );
            assert_eq!(parallel, sequential, "workers = {workers}");
        }
    }

    #[test]
    fn zero_workers_still_runs() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
        let out = match_services_parallel(
            &Registry::default(),
            &Query::uniform("x", &["name"]),
            &SyntacticSimilarity,
            0.3,
            &WorkerPool::new(0),
        );
        assert!(out.is_empty());
    }
}
