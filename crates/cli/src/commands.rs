use anyhow::Result;
use servio_core::config::AppConfig;
use servio_core::models::{MetricsReport, ServiceDescriptor};
use servio_core::{pipeline, report};

#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub registry: Option<String>,
    pub dataset: Option<String>,
    pub report: Option<String>,
    pub strategies: Vec<String>,
    pub workers: Option<usize>,
}

pub fn apply_overrides(cfg: &mut AppConfig, overrides: Overrides) {
    if let Some(path) = overrides.registry {
        cfg.registry.path = path;
    }
    if let Some(path) = overrides.dataset {
        cfg.dataset.path = Some(path);
    }
    if let Some(path) = overrides.report {
        cfg.report.path = path;
    }
    if !overrides.strategies.is_empty() {
        cfg.strategies.enabled = overrides.strategies;
    }
    if overrides.workers.is_some() {
        cfg.matching.workers = overrides.workers;
    }
}

pub async fn run_evaluate(cfg: &AppConfig) -> Result<Vec<MetricsReport>> {
    let reports = pipeline::run_evaluation(cfg).await?;
    println!("\nReport content:");
    print!("{}", report::render_table(&reports));
    Ok(reports)
}

pub async fn predict(
    cfg: &AppConfig,
    query: &str,
) -> Result<Vec<(String, Option<ServiceDescriptor>)>> {
    let (_, strategies) = pipeline::prepare(cfg)?;
    let mut out = Vec::with_capacity(strategies.len());
    for strategy in strategies.iter() {
        out.push((strategy.id().to_string(), strategy.predict(query).await));
    }
    Ok(out)
}

pub fn format_prediction(prediction: Option<&ServiceDescriptor>) -> Result<String> {
    Ok(match prediction {
        Some(service) => serde_json::to_string_pretty(service)?,
        None => "{}".to_string(),
    })
}

pub async fn run_predict(cfg: &AppConfig, query: &str) -> Result<()> {
    for (id, prediction) in predict(cfg, query).await? {
        println!("\n--- {id} ---");
        println!("Query: {query:?}");
        println!("{}", format_prediction(prediction.as_ref())?);
    }
    Ok(())
}
