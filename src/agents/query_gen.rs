//! Query Generator
//!
//! Asks the model for the next search query, informed by the evolving
//! state and every previously issued query. Total: a failed request or an
//! empty reply falls back to a fixed, broad query rather than stalling the
//! iteration.

use tracing::warn;

use crate::llm::LLM;
use crate::models::ResearchState;
use crate::types::{LLMMessage, LLMRequest};

/// Used when query generation fails; broad enough to always match papers.
pub const FALLBACK_QUERY: &str = "artificial intelligence AND recent advancements";

const MAX_TOKENS: u32 = 100;

pub struct QueryGenerator;

impl QueryGenerator {
    pub async fn generate(
        llm: &LLM,
        model: &str,
        state: &ResearchState,
        previous_queries: &[String],
    ) -> String {
        let prompt = Self::create_query_prompt(state, previous_queries);

        let request = LLMRequest {
            model: model.to_string(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: MAX_TOKENS,
            temperature: None,
            system_instruction: None,
        };

        match llm.create_chat_completion(&request).await {
            Ok(response) => {
                let query = response.content.trim().to_string();
                if query.is_empty() {
                    warn!("Query generation returned empty text, using fallback query");
                    FALLBACK_QUERY.to_string()
                } else {
                    query
                }
            }
            Err(e) => {
                warn!(error = %e, "Error generating search query, using fallback query");
                FALLBACK_QUERY.to_string()
            }
        }
    }

    fn create_query_prompt(state: &ResearchState, previous_queries: &[String]) -> String {
        format!(
            r#"Based on our current research state and previous queries:
Current Research State: {state}
Previous Queries: {queries}

Generate a refined search query for arXiv that will help us find papers most relevant to our current focus and knowledge gaps.
The query should be a string of keywords and phrases. You can use AND/OR operators, but keep it relatively simple.
Avoid using quotation marks or parentheses. Focus on the most important 3-4 concepts.
Consider the effectiveness of previous queries and adjust accordingly.
Do not include any explanation, just provide the query string."#,
            state = state.to_pretty_json(),
            queries = serde_json::to_string_pretty(previous_queries).unwrap_or_else(|_| "[]".to_string()),
        )
    }
}
