//! Direction Generator
//!
//! Read-only analysis over the current state: promising areas, bold
//! hypotheses, the next concrete step. Output is for reporting; it never
//! feeds back into the research state.

use crate::extract::{extract_structured, Extraction};
use crate::llm::LLM;
use crate::models::ResearchState;
use crate::types::{AppResult, LLMMessage, LLMRequest};

/// Field contract for a direction report, in prompt order.
pub const DIRECTION_FIELDS: [&str; 5] = [
    "promising_areas",
    "bold_hypotheses",
    "unconventional_approaches",
    "emerging_trends",
    "next_step",
];

const MAX_TOKENS: u32 = 2000;

pub struct DirectionGenerator;

impl DirectionGenerator {
    pub async fn generate(llm: &LLM, model: &str, state: &ResearchState) -> AppResult<Extraction> {
        let prompt = Self::create_directions_prompt(state);

        let request = LLMRequest {
            model: model.to_string(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: MAX_TOKENS,
            temperature: None,
            system_instruction: None,
        };

        let response = llm.create_chat_completion(&request).await?;
        Ok(extract_structured(&response.content, &DIRECTION_FIELDS))
    }

    fn create_directions_prompt(state: &ResearchState) -> String {
        format!(
            r#"As a pioneering AI researcher, analyze our current research state:
{state}

Based on this, please:
1. Identify 3-5 most promising areas for potential breakthroughs.
2. Formulate 2-3 bold, testable hypotheses that could lead to significant advancements.
3. Suggest 1-2 unconventional approaches or experiments that could yield novel insights.
4. Identify any emerging patterns or trends across our analyzed papers that might indicate a shift in the field.
5. Propose a concrete next step or experiment to pursue based on our current findings.

Format your response as a JSON object with the following keys:
"promising_areas", "bold_hypotheses", "unconventional_approaches", "emerging_trends", "next_step"

Ensure your response is a valid JSON object, starting with '{{' and ending with '}}'."#,
            state = state.to_pretty_json(),
        )
    }
}
