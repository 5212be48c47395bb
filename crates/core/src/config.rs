use crate::generative::DEFAULT_CANDIDATE_LIMIT;
use crate::matcher::DEFAULT_THRESHOLD;
use crate::strategy::{GENERATIVE, PARALLEL, SEMANTIC, SYNTACTIC};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub dataset: DatasetConfig,
    pub matching: MatchingConfig,
    pub taxonomy: TaxonomyConfig,
    pub llm: LlmConfig,
    pub report: ReportConfig,
    pub strategies: StrategiesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: "registry.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub aspects: Vec<String>,
    pub workers: Option<usize>,
    pub recall_k: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            aspects: vec!["name".to_string(), "description".to_string()],
            workers: None,
            recall_k: crate::metrics::DEFAULT_RECALL_K,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// JSON sense list or WordNet database directory; the bundled seed is used when unset.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub candidate_limit: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            backoff_ms: 500,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub path: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: "evaluation_report.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    pub enabled: Vec<String>,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            enabled: [SYNTACTIC, SEMANTIC, PARALLEL, GENERATIVE]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("SERVIO")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("matching.aspects")
            .with_list_parse_key("strategies.enabled")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
