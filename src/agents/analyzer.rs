//! Paper Analyzer
//!
//! One model call per paper: title, authors, abstract, the extracted
//! document text (already size-capped by the fetcher), and the current
//! research state all go into a single prompt. The reply is recovered
//! through the extraction cascade, so even a badly formatted analysis
//! yields a usable record. A transport failure is per-paper: the caller
//! skips the state update for that paper and moves on.

use tracing::info;

use crate::extract::{extract_structured, Extraction};
use crate::llm::LLM;
use crate::models::{Paper, ResearchState};
use crate::types::{AppResult, LLMMessage, LLMRequest};

/// Field contract for a paper analysis, in the order the prompt requests.
pub const ANALYSIS_FIELDS: [&str; 7] = [
    "summary",
    "groundbreaking_ideas",
    "critical_analysis",
    "synthesis",
    "novel_hypotheses",
    "potential_breakthroughs",
    "cross_disciplinary_insights",
];

const MAX_TOKENS: u32 = 4000;

pub struct PaperAnalyzer;

impl PaperAnalyzer {
    /// Analyze one paper in the context of the current research state.
    pub async fn analyze(
        llm: &LLM,
        model: &str,
        paper: &Paper,
        document_text: &str,
        state: &ResearchState,
    ) -> AppResult<Extraction> {
        let prompt = Self::create_analysis_prompt(paper, document_text, state);

        let request = LLMRequest {
            model: model.to_string(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: MAX_TOKENS,
            temperature: None,
            system_instruction: None,
        };

        let response = llm.create_chat_completion(&request).await?;
        info!(
            title = %paper.title,
            response_len = response.content.len(),
            "Received paper analysis from LLM"
        );

        Ok(extract_structured(&response.content, &ANALYSIS_FIELDS))
    }

    fn create_analysis_prompt(paper: &Paper, document_text: &str, state: &ResearchState) -> String {
        format!(
            r#"You are an advanced AI researcher at the forefront of AI development. Your goal is to push the boundaries of AI and make groundbreaking discoveries. Analyze the following AI research paper in the context of our ongoing research:

Title: {title}
Authors: {authors}
Abstract: {abstract_text}
Paper Content (truncated): {document_text}

Current Research State:
{state}

Please provide:
1. A concise summary of the paper's main contributions.
2. Identification of any potentially groundbreaking ideas or techniques.
3. Critical analysis: What are the strengths and limitations of this approach?
4. Synthesis: How does this work connect with or challenge our current understanding?
5. Novel hypotheses: Generate 2-3 new, testable hypotheses inspired by this paper.
6. Potential breakthroughs: Identify areas where this work could lead to significant advancements.
7. Cross-disciplinary insights: Are there connections to other fields that could yield new perspectives?

Format your response as a JSON object with the following keys:
"summary", "groundbreaking_ideas", "critical_analysis", "synthesis", "novel_hypotheses", "potential_breakthroughs", "cross_disciplinary_insights"

Ensure your response is a valid JSON object, starting with '{{' and ending with '}}'.
Avoid using any control characters or non-UTF-8 characters in your response."#,
            title = paper.title,
            authors = paper.authors,
            abstract_text = paper.abstract_text,
            document_text = document_text,
            state = state.to_pretty_json(),
        )
    }
}
