//! Evaluation sets: loaded from the dataset builder's JSON output, or derived from the
//! registry itself.

use crate::models::{EvaluationCase, ServiceDescriptor};
use crate::registry::Registry;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

pub const MIN_DESCRIPTION_WORDS: usize = 5;

#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: String,
    pub cases: Vec<EvaluationCase>,
}

impl Dataset {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read dataset {}", path.display()))?;
        let cases: Vec<EvaluationCase> = serde_json::from_str(&raw)
            .with_context(|| format!("parse dataset {}", path.display()))?;
        Ok(Self {
            id: path.display().to_string(),
            cases,
        })
    }

    pub fn from_registry(id: &str, registry: &Registry) -> Self {
        let cases = registry
            .services()
            .iter()
            .filter_map(|service| {
                let query = query_from_name(service.field("func_name").unwrap_or_default());
                (!query.is_empty()).then(|| EvaluationCase {
                    query,
                    expected_service: service.clone(),
                })
            })
            .collect();
        Self {
            id: id.to_string(),
            cases,
        }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

fn query_from_name(name: &str) -> String {
    name.replace('_', " ").replace("create", "").trim().to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub html_url: Option<String>,
}

pub fn cases_from_repositories(repos: &[RepositoryRecord]) -> Vec<EvaluationCase> {
    repos
        .iter()
        .filter_map(|repo| {
            let description = repo.description.as_deref().unwrap_or_default();
            if description.split_whitespace().count() <= MIN_DESCRIPTION_WORDS {
                return None;
            }
            Some(EvaluationCase {
                query: description.to_string(),
                expected_service: ServiceDescriptor::new(
                    repo.name.clone().unwrap_or_default(),
                    description,
                    repo.html_url.clone().unwrap_or_default(),
                ),
            })
        })
        .collect()
}
