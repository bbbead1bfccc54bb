use anyhow::{bail, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LLMConfig,
    pub research: ResearchConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub anthropic_api_key: String,
    /// Fast model used for per-paper analysis.
    pub analysis_model: String,
    /// Stronger model used for query generation, state updates, directions,
    /// and the final evaluation.
    pub orchestration_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchConfig {
    pub iterations: u32,
    pub papers_per_iteration: usize,
    pub iteration_delay_secs: u64,
    pub pdf_text_cap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub max_results: usize,
    pub retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        if anthropic_api_key.trim().is_empty() {
            // The one fatal failure class: caught before the loop starts.
            bail!("ANTHROPIC_API_KEY must be set");
        }

        Ok(Self {
            llm: LLMConfig {
                provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "anthropic".to_string()),
                anthropic_api_key,
                analysis_model: env::var("ANALYSIS_MODEL")
                    .unwrap_or_else(|_| "claude-3-haiku-20240307".to_string()),
                orchestration_model: env::var("ORCHESTRATION_MODEL")
                    .unwrap_or_else(|_| "claude-3-5-sonnet-20240620".to_string()),
            },
            research: ResearchConfig {
                iterations: env::var("NUM_ITERATIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                papers_per_iteration: env::var("PAPERS_PER_ITERATION")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
                iteration_delay_secs: env::var("ITERATION_DELAY_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                pdf_text_cap: env::var("PDF_TEXT_CAP")
                    .unwrap_or_else(|_| "50000".to_string())
                    .parse()?,
            },
            search: SearchConfig {
                max_results: env::var("MAX_SEARCH_RESULTS")
                    .unwrap_or_else(|_| "200".to_string())
                    .parse()?,
                retries: env::var("SEARCH_RETRIES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
            },
        })
    }
}
