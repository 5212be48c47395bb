//! Core library: registry, similarity, aspect matching, strategies, evaluation.

pub mod config;
pub mod dataset;
pub mod generative;
pub mod harness;
pub mod matcher;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod pool;
pub mod registry;
pub mod report;
pub mod similarity;
pub mod strategy;
pub mod taxonomy;
pub mod text;
mod wordnet;
