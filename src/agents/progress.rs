//! Progress Evaluator
//!
//! Runs once, after the last iteration: compares the seed state against the
//! final state and reports advancements, how well the initial knowledge
//! gaps were addressed, and what still needs work. Read-only.

use crate::extract::{extract_structured, Extraction};
use crate::llm::LLM;
use crate::models::ResearchState;
use crate::types::{AppResult, LLMMessage, LLMRequest};

/// Field contract for a progress evaluation, in prompt order.
pub const EVALUATION_FIELDS: [&str; 5] = [
    "advancements",
    "gap_assessment",
    "pivotal_discoveries",
    "direction_assessment",
    "recommendations",
];

const MAX_TOKENS: u32 = 2000;

pub struct ProgressEvaluator;

impl ProgressEvaluator {
    pub async fn evaluate(
        llm: &LLM,
        model: &str,
        initial_state: &ResearchState,
        current_state: &ResearchState,
    ) -> AppResult<Extraction> {
        let prompt = Self::create_evaluation_prompt(initial_state, current_state);

        let request = LLMRequest {
            model: model.to_string(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: MAX_TOKENS,
            temperature: None,
            system_instruction: None,
        };

        let response = llm.create_chat_completion(&request).await?;
        Ok(extract_structured(&response.content, &EVALUATION_FIELDS))
    }

    fn create_evaluation_prompt(initial: &ResearchState, current: &ResearchState) -> String {
        format!(
            r#"As an AI research evaluator, assess the progress made in our research:

Initial Research State:
{initial}

Current Research State:
{current}

Please provide:
1. A summary of key advancements and insights gained.
2. An evaluation of how well we've addressed our initial knowledge gaps.
3. Identification of any pivotal discoveries or potential breakthroughs.
4. An assessment of the overall direction and focus of our research.
5. Recommendations for areas that require further investigation or refinement.

Format your response as a JSON object with the following keys:
"advancements", "gap_assessment", "pivotal_discoveries", "direction_assessment", "recommendations"

Ensure your response is a valid JSON object, starting with '{{' and ending with '}}'."#,
            initial = initial.to_pretty_json(),
            current = current.to_pretty_json(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LLMAdapter;
    use crate::models::{FieldValue, NO_INFORMATION};
    use crate::types::{AppResult, LLMResponse, TokenUsage};
    use async_trait::async_trait;

    struct CannedAdapter(String);

    #[async_trait]
    impl LLMAdapter for CannedAdapter {
        async fn create_chat_completion(&self, _request: &LLMRequest) -> AppResult<LLMResponse> {
            Ok(LLMResponse {
                content: self.0.clone(),
                finish_reason: "end_turn".to_string(),
                usage: TokenUsage::default(),
            })
        }
    }

    #[tokio::test]
    async fn degraded_evaluation_still_covers_the_contract() {
        let llm = LLM::with_adapter(Box::new(CannedAdapter("nothing structured".to_string())));
        let extraction = ProgressEvaluator::evaluate(
            &llm,
            "model",
            &ResearchState::seed(),
            &ResearchState::seed(),
        )
        .await
        .unwrap();
        assert!(extraction.degraded);
        for name in EVALUATION_FIELDS {
            assert_eq!(extraction.record.field(name), FieldValue::text(NO_INFORMATION));
        }
    }

    #[test]
    fn prompt_contains_both_states() {
        let mut current = ResearchState::seed();
        current.set("current_focus", FieldValue::text("a very specific new focus"));
        let prompt = ProgressEvaluator::create_evaluation_prompt(&ResearchState::seed(), &current);
        assert!(prompt.contains("Identifying cutting-edge advancements"));
        assert!(prompt.contains("a very specific new focus"));
    }
}
