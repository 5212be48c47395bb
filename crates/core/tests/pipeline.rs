use servio_core::config::AppConfig;
use servio_core::pipeline;
use servio_core::registry::{Registry, RegistryError};
use std::fs;
use tempfile::tempdir;

const REGISTRY: &str = r#"{"func_name": "process_payment", "docstring": "process payment transactions", "url": "https://example.com/pay"}
this line is not json
{"func_name": "send_email_notification", "docstring": "send an email notification to a user", "url": "https://example.com/mail"}

{"func_name": "create_user_account", "docstring": "register a new user account", "url": "https://example.com/account"}
"#;

#[test]
fn missing_registry_is_not_found() {
    let temp = tempdir().unwrap();
    let err = Registry::load(&temp.path().join("absent.jsonl")).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[test]
fn registry_without_valid_lines_is_empty() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("broken.jsonl");
    fs::write(&path, "nope\n{broken\n\n").unwrap();
    assert!(matches!(
        Registry::load(&path).unwrap_err(),
        RegistryError::Empty(_)
    ));
}

#[tokio::test]
async fn evaluation_writes_one_row_per_strategy() {
    let temp = tempdir().unwrap();
    let registry_path = temp.path().join("registry.jsonl");
    let report_path = temp.path().join("out").join("report.csv");
    fs::write(&registry_path, REGISTRY).unwrap();

    let mut cfg = AppConfig::default();
    cfg.registry.path = registry_path.to_string_lossy().into_owned();
    cfg.report.path = report_path.to_string_lossy().into_owned();
    cfg.llm.provider = "noop".to_string();
    cfg.matching.workers = Some(2);

    let reports = pipeline::run_evaluation(&cfg).await.unwrap();
    assert_eq!(reports.len(), 4);
    for report in &reports {
        assert_eq!(report.metrics["total_queries"], 3.0);
        assert_eq!(report.dataset, cfg.registry.path);
    }

    let csv = fs::read_to_string(&report_path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        "mrr,precision_at_1,recall_at_5,total_queries,strategy,dataset"
    );
    assert!(lines[1].contains(",syntactic,"));
    assert!(lines[4].contains(",generative,"));
}

#[tokio::test]
async fn dataset_file_overrides_registry_derived_cases() {
    let temp = tempdir().unwrap();
    let registry_path = temp.path().join("registry.jsonl");
    let dataset_path = temp.path().join("evaluation_dataset.json");
    fs::write(&registry_path, REGISTRY).unwrap();
    fs::write(
        &dataset_path,
        r#"[{"query": "process payment", "expected_service": {"func_name": "process_payment", "docstring": "process payment transactions", "url": "https://example.com/pay"}}]"#,
    )
    .unwrap();

    let mut cfg = AppConfig::default();
    cfg.registry.path = registry_path.to_string_lossy().into_owned();
    cfg.dataset.path = Some(dataset_path.to_string_lossy().into_owned());
    cfg.report.path = temp.path().join("report.csv").to_string_lossy().into_owned();
    cfg.llm.provider = "noop".to_string();
    cfg.strategies.enabled = vec!["semantic".to_string(), "syntactic".to_string()];

    let reports = pipeline::run_evaluation(&cfg).await.unwrap();
    let ids: Vec<_> = reports.iter().map(|r| r.strategy.as_str()).collect();
    assert_eq!(ids, vec!["semantic", "syntactic"]);
    for report in &reports {
        assert_eq!(report.metrics["total_queries"], 1.0);
        assert_eq!(report.metrics["precision_at_1"], 1.0);
        assert_eq!(report.dataset, cfg.dataset.path.clone().unwrap());
    }
}

#[test]
fn unknown_strategy_is_rejected() {
    let temp = tempdir().unwrap();
    let registry_path = temp.path().join("registry.jsonl");
    fs::write(&registry_path, REGISTRY).unwrap();

    let mut cfg = AppConfig::default();
    cfg.registry.path = registry_path.to_string_lossy().into_owned();
    cfg.llm.provider = "noop".to_string();
    cfg.strategies.enabled = vec!["quantum".to_string()];
    assert!(pipeline::prepare(&cfg).is_err());
}
