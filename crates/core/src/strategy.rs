//! Matching strategies behind one `Strategy` interface, and the registration map the
//! harness selects them from.

use crate::matcher::{self, DEFAULT_THRESHOLD};
use crate::models::{Query, ScoredCandidate, ServiceDescriptor};
use crate::pool::{self, WorkerPool};
use crate::registry::Registry;
use crate::similarity::{SemanticSimilarity, Similarity, SyntacticSimilarity};
use crate::taxonomy::Taxonomy;
use std::sync::Arc;
use tracing::warn;

pub const SYNTACTIC: &str = "syntactic";
pub const SEMANTIC: &str = "semantic";
pub const PARALLEL: &str = "parallel";
pub const GENERATIVE: &str = "generative";

/// Ranking over the registry for a free-text query. Implementations never fail: any
/// problem surfaces as an empty ranking.
#[async_trait::async_trait]
pub trait Strategy: Send + Sync {
    fn id(&self) -> &str;

    async fn rank(&self, query: &str) -> Vec<ServiceDescriptor>;

    async fn predict(&self, query: &str) -> Option<ServiceDescriptor> {
        self.rank(query).await.into_iter().next()
    }
}

#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub aspects: Vec<String>,
    pub threshold: f64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            aspects: vec!["name".to_string(), "description".to_string()],
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl MatchSettings {
    fn query(&self, text: &str) -> Option<Query> {
        let query = Query::uniform(text, &self.aspects);
        (!query.is_empty()).then_some(query)
    }
}

pub struct AspectStrategy<S> {
    id: String,
    registry: Arc<Registry>,
    similarity: S,
    settings: MatchSettings,
}

impl AspectStrategy<SyntacticSimilarity> {
    pub fn syntactic(registry: Arc<Registry>, settings: MatchSettings) -> Self {
        Self::new(SYNTACTIC, registry, SyntacticSimilarity, settings)
    }
}

impl AspectStrategy<SemanticSimilarity> {
    pub fn semantic(
        registry: Arc<Registry>,
        taxonomy: Arc<Taxonomy>,
        settings: MatchSettings,
    ) -> Self {
        Self::new(
            SEMANTIC,
            registry,
            SemanticSimilarity::new(taxonomy),
            settings,
        )
    }
}

impl<S: Similarity> AspectStrategy<S> {
    pub fn new(id: &str, registry: Arc<Registry>, similarity: S, settings: MatchSettings) -> Self {
        Self {
            id: id.to_string(),
            registry,
            similarity,
            settings,
        }
    }

    pub fn rank_scored(&self, text: &str) -> Vec<ScoredCandidate> {
        match self.settings.query(text) {
            Some(query) => matcher::match_services(
                &self.registry,
                &query,
                &self.similarity,
                self.settings.threshold,
            ),
            None => Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Similarity> Strategy for AspectStrategy<S> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn rank(&self, query: &str) -> Vec<ServiceDescriptor> {
        self.rank_scored(query)
            .into_iter()
            .map(|c| c.service)
            .collect()
    }
}

pub struct ParallelSemanticStrategy {
    registry: Arc<Registry>,
    similarity: Arc<SemanticSimilarity>,
    settings: MatchSettings,
    pool: WorkerPool,
}

impl ParallelSemanticStrategy {
    pub fn new(
        registry: Arc<Registry>,
        taxonomy: Arc<Taxonomy>,
        settings: MatchSettings,
        pool: WorkerPool,
    ) -> Self {
        Self {
            registry,
            similarity: Arc::new(SemanticSimilarity::new(taxonomy)),
            settings,
            pool,
        }
    }

    pub async fn rank_scored(&self, text: &str) -> Vec<ScoredCandidate> {
        let Some(query) = self.settings.query(text) else {
            return Vec::new();
        };
        if self.registry.is_empty() {
            return Vec::new();
        }
        let registry = Arc::clone(&self.registry);
        let similarity = Arc::clone(&self.similarity);
        let threshold = self.settings.threshold;
        let pool = self.pool;
        let joined = tokio::task::spawn_blocking(move || {
            pool::match_services_parallel(&registry, &query, similarity.as_ref(), threshold, &pool)
        })
        .await;
        match joined {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!("parallel scoring failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl Strategy for ParallelSemanticStrategy {
    fn id(&self) -> &str {
        PARALLEL
    }

    async fn rank(&self, query: &str) -> Vec<ServiceDescriptor> {
        self.rank_scored(query)
            .await
            .into_iter()
            .map(|c| c.service)
            .collect()
    }
}

#[derive(Default, Clone)]
pub struct StrategyRegistry {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        match self.strategies.iter_mut().find(|s| s.id() == strategy.id()) {
            Some(slot) => *slot = strategy,
            None => self.strategies.push(strategy),
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.iter().find(|s| s.id() == id).cloned()
    }

    pub fn select(&self, ids: &[String]) -> anyhow::Result<Self> {
        let mut selected = Self::new();
        for id in ids {
            let strategy = self
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("unknown strategy: {id} (known: {})", self.ids().join(", ")))?;
            selected = selected.with_strategy(strategy);
        }
        Ok(selected)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Strategy>> {
        self.strategies.iter()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Arc<Taxonomy> {
        Arc::new(Taxonomy::builtin().unwrap())
    }

    fn pay_registry() -> Arc<Registry> {
        Arc::new(Registry::new(vec![
            ServiceDescriptor::new("WeatherService", "daily weather forecast", "u0"),
            ServiceDescriptor::new("PayService", "process payment transactions", "u1"),
        ]))
    }

    #[tokio::test]
    async fn blank_query_predicts_nothing() {
        let strategy = AspectStrategy::syntactic(pay_registry(), MatchSettings::default());
        assert!(strategy.predict("   ").await.is_none());
        let parallel = ParallelSemanticStrategy::new(
            pay_registry(),
            taxonomy(),
            MatchSettings::default(),
            WorkerPool::new(2),
        );
        assert!(parallel.predict("").await.is_none());
    }

    #[tokio::test]
    async fn parallel_ranking_equals_sequential_semantic() {
        let registry = Arc::new(Registry::new(
            (0..40)
                .map(|i| {
                    let description = match i % 4 {
                        0 => "payment",
                        1 => "transfer",
                        2 => "refund",
                        _ => "weather",
                    };
                    ServiceDescriptor::new(format!("svc{i}"), description, format!("u{i}"))
                })
                .collect(),
        ));
        let tax = taxonomy();
        let sequential =
            AspectStrategy::semantic(Arc::clone(&registry), Arc::clone(&tax), MatchSettings::default());
        let parallel = ParallelSemanticStrategy::new(
            registry,
            tax,
            MatchSettings::default(),
            WorkerPool::new(4),
        );
        for query in ["payment", "refund", "transfer", "svc1"] {
            assert_eq!(
                parallel.rank_scored(query).await,
                sequential.rank_scored(query),
                "query {query}"
            );
        }
    }

    #[test]
    fn registry_selects_in_requested_order() {
        let registry = pay_registry();
        let strategies = StrategyRegistry::new()
            .with_strategy(Arc::new(AspectStrategy::syntactic(
                Arc::clone(&registry),
                MatchSettings::default(),
            )))
            .with_strategy(Arc::new(AspectStrategy::semantic(
                registry,
                taxonomy(),
                MatchSettings::default(),
            )));
        assert_eq!(strategies.ids(), vec![SYNTACTIC, SEMANTIC]);

        let picked = strategies
            .select(&[SEMANTIC.to_string(), SYNTACTIC.to_string()])
            .unwrap();
        assert_eq!(picked.ids(), vec![SEMANTIC, SYNTACTIC]);
        assert!(strategies.select(&["bogus".to_string()]).is_err());
    }
}
