use servio_core::config::AppConfig;
use servio_core::dataset::Dataset;
use servio_core::harness;
use servio_core::metrics::{precision_at_1, MetricsCalculator};
use servio_core::models::{EvaluationCase, EvaluationRecord, Query, ServiceDescriptor};
use servio_core::pipeline;
use servio_core::registry::Registry;
use servio_core::similarity::{SemanticSimilarity, Similarity, SyntacticSimilarity};
use servio_core::strategy::{AspectStrategy, MatchSettings, Strategy, StrategyRegistry};
use servio_core::taxonomy::Taxonomy;
use servio_core::matcher;
use std::sync::Arc;

fn noop_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.llm.provider = "noop".to_string();
    cfg.matching.workers = Some(2);
    cfg
}

fn all_strategies(registry: Registry) -> StrategyRegistry {
    let cfg = noop_config();
    let providers = pipeline::build_providers(&cfg);
    pipeline::build_strategies(
        &cfg,
        Arc::new(registry),
        Arc::new(Taxonomy::builtin().unwrap()),
        &providers,
    )
    .unwrap()
}

#[tokio::test]
async fn pay_service_is_top_one_for_syntactic_and_semantic() {
    let registry: Registry = Registry::from_reader(
        r#"{"name":"PayService","description":"process payment transactions","url":"u1"}"#.as_bytes(),
    )
    .unwrap();
    let query = Query::new()
        .with_aspect("name", "process payment")
        .with_aspect("description", "process payment");
    let taxonomy = Arc::new(Taxonomy::builtin().unwrap());

    let syntactic = matcher::match_services(&registry, &query, &SyntacticSimilarity, 0.3);
    let semantic =
        matcher::match_services(&registry, &query, &SemanticSimilarity::new(taxonomy), 0.3);
    assert_eq!(syntactic[0].service.name, "PayService");
    assert_eq!(semantic[0].service.name, "PayService");
    assert_eq!(semantic[0].score, 1.0);

    let strategies = all_strategies(registry);
    for id in ["syntactic", "semantic", "parallel"] {
        let predicted = strategies.get(id).unwrap().predict("process payment").await;
        assert_eq!(predicted.map(|p| p.url), Some("u1".to_string()), "{id}");
    }
}

#[tokio::test]
async fn empty_registry_predicts_nothing_and_scores_zero() {
    let strategies = all_strategies(Registry::default());
    assert_eq!(strategies.len(), 4);

    let mut records = Vec::new();
    for strategy in strategies.iter() {
        let predicted = strategy.predict("anything").await;
        assert!(predicted.is_none(), "{}", strategy.id());
        records.push(EvaluationRecord {
            query: "anything".to_string(),
            predicted,
            expected: ServiceDescriptor::new("x", "y", "u1"),
            expected_rank: None,
        });
    }
    assert_eq!(precision_at_1(&records), 0.0);
}

struct FixedByName;

impl Similarity for FixedByName {
    fn similarity(&self, _aspect: &str, field: &str) -> f64 {
        match field {
            "A" | "B" => 0.9,
            _ => 0.0,
        }
    }
}

#[tokio::test]
async fn tied_scores_keep_registry_order() {
    let registry = Arc::new(Registry::new(vec![
        ServiceDescriptor::new("A", "", "a"),
        ServiceDescriptor::new("B", "", "b"),
    ]));
    let strategy = AspectStrategy::new("fixed", registry, FixedByName, MatchSettings::default());
    let ranked: Vec<_> = strategy.rank("q").await.into_iter().map(|s| s.url).collect();
    assert_eq!(ranked, vec!["a", "b"]);
}

#[tokio::test]
async fn harness_records_empty_generative_predictions_as_misses() {
    let registry = Registry::new(vec![
        ServiceDescriptor::new("process_payment", "process payment transactions", "u1"),
        ServiceDescriptor::new("send_email", "send an email notification", "u2"),
        ServiceDescriptor::new("user_login", "authenticate a user login", "u3"),
    ]);
    let dataset = Dataset::from_registry("inline", &registry);
    assert_eq!(dataset.len(), 3);

    let reports = harness::evaluate(
        &all_strategies(registry),
        &dataset,
        &MetricsCalculator::default(),
    )
    .await;

    let ids: Vec<_> = reports.iter().map(|r| r.strategy.as_str()).collect();
    assert_eq!(ids, vec!["syntactic", "semantic", "parallel", "generative"]);
    for report in &reports {
        assert_eq!(report.dataset, "inline");
        assert_eq!(report.metrics["total_queries"], 3.0);
    }
    assert_eq!(reports[0].metrics["precision_at_1"], 1.0);
    assert_eq!(reports[1].metrics["precision_at_1"], reports[2].metrics["precision_at_1"]);
    assert_eq!(reports[3].metrics["precision_at_1"], 0.0);
    assert_eq!(reports[3].metrics["mrr"], 0.0);
}

#[tokio::test]
async fn expected_rank_reflects_position_in_ranking() {
    let registry = Arc::new(Registry::new(vec![
        ServiceDescriptor::new("payment", "payment gateway", "u1"),
        ServiceDescriptor::new("payment refund", "payment refund", "u2"),
    ]));
    let strategy = AspectStrategy::syntactic(registry, MatchSettings::default());
    let dataset = Dataset {
        id: "inline".to_string(),
        cases: vec![EvaluationCase {
            query: "payment refund".to_string(),
            expected_service: ServiceDescriptor::new("payment", "", "u1"),
        }],
    };
    let records = harness::collect_records(&strategy, &dataset).await;
    assert_eq!(records[0].predicted.as_ref().map(|p| p.url.as_str()), Some("u2"));
    assert_eq!(records[0].expected_rank, Some(2));
}
