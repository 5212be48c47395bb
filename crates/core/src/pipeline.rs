use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::generative::GenerativeStrategy;
use crate::harness;
use crate::metrics::MetricsCalculator;
use crate::models::MetricsReport;
use crate::pool::WorkerPool;
use crate::registry::Registry;
use crate::report;
use crate::strategy::{
    AspectStrategy, MatchSettings, ParallelSemanticStrategy, StrategyRegistry,
};
use crate::taxonomy::Taxonomy;
use anyhow::Context;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub fn build_providers(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_llm("noop", Arc::new(NoopProvider));

    let llm = &config.llm;
    if llm.provider != "noop" {
        match std::env::var(&llm.api_key_env) {
            Ok(key) if !key.is_empty() => {
                let built = OpenAiProvider::new(OpenAiConfig {
                    api_key: key,
                    base_url: llm.base_url.clone(),
                    chat_model: llm.model.clone(),
                    timeout: Duration::from_secs(llm.timeout_secs),
                    max_retries: llm.max_retries,
                    backoff: Duration::from_millis(llm.backoff_ms),
                });
                match built {
                    Ok(provider) => reg = reg.with_llm(&llm.provider, Arc::new(provider)),
                    Err(e) => warn!("Failed to initialize {} client: {}", llm.provider, e),
                }
            }
            _ => warn!(
                "{} not set; generative predictions will be empty.",
                llm.api_key_env
            ),
        }
    }

    if reg.has_llm(&llm.provider) {
        reg.set_preferred_llm(&llm.provider)
    } else {
        reg.set_preferred_llm("noop")
    }
}

pub fn load_taxonomy(config: &AppConfig) -> anyhow::Result<Arc<Taxonomy>> {
    let taxonomy = match &config.taxonomy.path {
        Some(path) => Taxonomy::load(Path::new(path))
            .with_context(|| format!("load taxonomy {path}"))?,
        None => Taxonomy::builtin().context("load bundled taxonomy")?,
    };
    info!("Taxonomy ready with {} senses.", taxonomy.len());
    Ok(Arc::new(taxonomy))
}

pub fn match_settings(config: &AppConfig) -> MatchSettings {
    MatchSettings {
        aspects: config.matching.aspects.clone(),
        threshold: config.matching.threshold,
    }
}

pub fn worker_pool(config: &AppConfig) -> WorkerPool {
    config
        .matching
        .workers
        .map(WorkerPool::new)
        .unwrap_or_else(WorkerPool::with_available_parallelism)
}

pub fn build_strategies(
    config: &AppConfig,
    registry: Arc<Registry>,
    taxonomy: Arc<Taxonomy>,
    providers: &ProviderRegistry,
) -> anyhow::Result<StrategyRegistry> {
    let settings = match_settings(config);
    let llm = providers.llm(None)?;
    Ok(StrategyRegistry::new()
        .with_strategy(Arc::new(AspectStrategy::syntactic(
            Arc::clone(&registry),
            settings.clone(),
        )))
        .with_strategy(Arc::new(AspectStrategy::semantic(
            Arc::clone(&registry),
            Arc::clone(&taxonomy),
            settings.clone(),
        )))
        .with_strategy(Arc::new(ParallelSemanticStrategy::new(
            Arc::clone(&registry),
            taxonomy,
            settings,
            worker_pool(config),
        )))
        .with_strategy(Arc::new(GenerativeStrategy::new(
            registry,
            llm,
            config.llm.candidate_limit,
        ))))
}

pub fn metrics_calculator(config: &AppConfig) -> MetricsCalculator {
    MetricsCalculator::with_recall_k(config.matching.recall_k)
}

pub fn load_dataset(config: &AppConfig, registry: &Registry) -> anyhow::Result<Dataset> {
    let dataset = match &config.dataset.path {
        Some(path) => Dataset::load(Path::new(path))?,
        None => Dataset::from_registry(&config.registry.path, registry),
    };
    info!("Generated {} evaluation queries.", dataset.len());
    Ok(dataset)
}

pub fn prepare(config: &AppConfig) -> anyhow::Result<(Arc<Registry>, StrategyRegistry)> {
    let registry = Arc::new(
        Registry::load(Path::new(&config.registry.path)).context("load registry")?,
    );
    let taxonomy = load_taxonomy(config)?;
    let providers = build_providers(config);
    let strategies = build_strategies(config, Arc::clone(&registry), taxonomy, &providers)?
        .select(&config.strategies.enabled)?;
    Ok((registry, strategies))
}

pub async fn run_evaluation(config: &AppConfig) -> anyhow::Result<Vec<MetricsReport>> {
    let (registry, strategies) = prepare(config)?;
    let dataset = load_dataset(config, &registry)?;

    info!("Initializing strategies: {}", strategies.ids().join(", "));
    let reports = harness::evaluate(&strategies, &dataset, &metrics_calculator(config)).await;

    report::save_csv(Path::new(&config.report.path), &reports)?;
    info!("Evaluation complete. Report saved to {}", config.report.path);
    Ok(reports)
}
