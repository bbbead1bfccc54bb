//! State Updater
//!
//! Merges a paper analysis into the research state by asking the model for
//! a full replacement state. The replacement only happens on a genuine
//! structural parse: a reply that had to be salvaged by the pattern
//! fallback is not a trustworthy state object, so the caller keeps the
//! prior state untouched. No partial merge exists by construction: the
//! state is replaced wholesale or not at all.

use tracing::info;

use crate::extract::extract_structured;
use crate::llm::LLM;
use crate::models::{ResearchState, StructuredRecord};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

const MAX_TOKENS: u32 = 2000;

pub struct StateUpdater;

impl StateUpdater {
    /// Produce the replacement research state, or an error that leaves the
    /// caller's current state as the state of record.
    pub async fn update(
        llm: &LLM,
        model: &str,
        state: &ResearchState,
        analysis: &StructuredRecord,
    ) -> AppResult<ResearchState> {
        let prompt = Self::create_update_prompt(state, analysis);

        let request = LLMRequest {
            model: model.to_string(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: MAX_TOKENS,
            temperature: None,
            system_instruction: None,
        };

        let response = llm.create_chat_completion(&request).await?;

        let field_names = state.field_names();
        let expected: Vec<&str> = field_names.iter().map(String::as_str).collect();
        let extraction = extract_structured(&response.content, &expected);

        if extraction.degraded {
            return Err(AppError::MalformedResponse(
                "research state update was not a parseable JSON object".to_string(),
            ));
        }

        let new_state = ResearchState::from_record(&extraction.record);
        if new_state.is_empty() {
            return Err(AppError::MalformedResponse(
                "research state update contained no usable fields".to_string(),
            ));
        }

        info!(fields = new_state.field_names().len(), "Research state updated");
        Ok(new_state)
    }

    fn create_update_prompt(state: &ResearchState, analysis: &StructuredRecord) -> String {
        format!(
            r#"As an advanced AI researcher, update our research state based on the latest paper analysis:

Current Research State:
{state}

Latest Paper Analysis:
{analysis}

Please provide an updated research state that:
1. Integrates new insights and refines our understanding of key AI concepts.
2. Updates our hypotheses and theoretical frameworks.
3. Identifies emerging trends or shifts in AI research directions.
4. Highlights potential breakthroughs or revolutionary ideas.
5. Refines our research focus and strategic direction.
6. Identifies any new knowledge gaps or areas requiring further investigation.

Format your response as a JSON object representing the new research state, maintaining the structure of the current state but updating its contents.
Ensure your response is a valid JSON object, starting with '{{' and ending with '}}'."#,
            state = state.to_pretty_json(),
            analysis = analysis.to_pretty_json(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LLMAdapter;
    use crate::models::{Field, FieldValue};
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

    fn analysis() -> StructuredRecord {
        let mut record = StructuredRecord::new();
        record.insert("summary", Field::Present(FieldValue::text("a summary")));
        record
    }

    #[tokio::test]
    async fn replaces_state_on_valid_json() {
        let llm = LLM::with_adapter(Box::new(CannedAdapter(
            r#"{"current_focus": "new focus", "knowledge_gaps": ["gap"]}"#.to_string(),
        )));
        let prior = ResearchState::seed();
        let updated = StateUpdater::update(&llm, "model", &prior, &analysis())
            .await
            .unwrap();
        assert_eq!(updated.get("current_focus"), Some(&FieldValue::text("new focus")));
        assert_ne!(updated, prior);
    }

    #[tokio::test]
    async fn degraded_reply_is_an_error() {
        let llm = LLM::with_adapter(Box::new(CannedAdapter(
            "current_focus: salvaged but unstructured".to_string(),
        )));
        let result = StateUpdater::update(&llm, "model", &ResearchState::seed(), &analysis()).await;
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn empty_object_is_an_error() {
        let llm = LLM::with_adapter(Box::new(CannedAdapter("{}".to_string())));
        let result = StateUpdater::update(&llm, "model", &ResearchState::seed(), &analysis()).await;
        assert!(matches!(result, Err(AppError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn prior_state_is_untouched_by_a_failed_update() {
        let llm = LLM::with_adapter(Box::new(CannedAdapter("not json at all".to_string())));
        let prior = ResearchState::seed();
        let snapshot = prior.clone();
        let _ = StateUpdater::update(&llm, "model", &prior, &analysis()).await;
        assert_eq!(prior, snapshot);
    }
}
