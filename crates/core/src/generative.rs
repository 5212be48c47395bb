//! Service selection delegated to a generative reasoning service.

use crate::models::ServiceDescriptor;
use crate::registry::Registry;
use crate::strategy::{Strategy, GENERATIVE};
use providers::{CompletionRequest, LlmProvider};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_CANDIDATE_LIMIT: usize = 20;

pub struct GenerativeStrategy {
    registry: Arc<Registry>,
    llm: Arc<dyn LlmProvider>,
    candidate_limit: usize,
}

impl GenerativeStrategy {
    pub fn new(registry: Arc<Registry>, llm: Arc<dyn LlmProvider>, candidate_limit: usize) -> Self {
        Self {
            registry,
            llm,
            candidate_limit,
        }
    }

    pub fn prompt(&self, query: &str) -> serde_json::Result<String> {
        let candidates = serde_json::to_string_pretty(self.registry.prefix(self.candidate_limit))?;
        Ok(build_prompt(query, &candidates))
    }
}

fn build_prompt(query: &str, candidates: &str) -> String {
    format!(
        "You are an expert service recommender.\n\
         Given a user query and a list of available services in JSON format, choose the single \
         best service that matches the query.\n\
         You MUST return the result as a single, valid JSON object of the chosen service. \
         Do not add any explanation or introductory text.\n\
         \n\
         User Query: \"{query}\"\n\
         \n\
         Available Services:\n\
         {candidates}\n\
         \n\
         Best Matching Service (JSON format only):\n"
    )
}

pub fn parse_selection(content: &str) -> Option<ServiceDescriptor> {
    let value: serde_json::Value = serde_json::from_str(content.trim()).ok()?;
    if value.as_object().map_or(true, |fields| fields.is_empty()) {
        return None;
    }
    serde_json::from_value(value).ok()
}

#[async_trait::async_trait]
impl Strategy for GenerativeStrategy {
    fn id(&self) -> &str {
        GENERATIVE
    }

    async fn rank(&self, query: &str) -> Vec<ServiceDescriptor> {
        self.predict(query).await.into_iter().collect()
    }

    async fn predict(&self, query: &str) -> Option<ServiceDescriptor> {
        if query.trim().is_empty() || self.registry.is_empty() {
            return None;
        }
        let prompt = match self.prompt(query) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("failed to serialize candidates: {}", e);
                return None;
            }
        };
        let content = match self
            .llm
            .complete(&CompletionRequest::deterministic_json(prompt))
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!("generative selection failed for {:?}: {}", query, e);
                return None;
            }
        };
        let selection = parse_selection(&content);
        if selection.is_none() {
            warn!("unparseable selection for {:?}", query);
            debug!("raw completion: {}", content);
        }
        selection
    }
}
