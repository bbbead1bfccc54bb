//! Iteration Controller
//!
//! Drives the whole run: generate query → search → analyze unseen papers →
//! update state → report directions, repeated for the configured number of
//! iterations, then one final progress evaluation.
//!
//! The controller is the sole owner of the shared state (the research
//! state, the set of analyzed titles, and the query history), and every
//! step runs sequentially on this one logical thread. A paper's
//! title enters the analyzed set *before* its analysis starts, so a failed
//! analysis is never retried. The research state is only ever replaced
//! wholesale, on the state updater's success path.
//!
//! Failure policy: every per-call failure is printed and the loop goes on.
//! Nothing past construction can abort the run.

use std::collections::HashSet;
use std::time::Duration;

use tracing::info;

use crate::agents::{
    DirectionGenerator, PaperAnalyzer, ProgressEvaluator, QueryGenerator, StateUpdater,
};
use crate::config::Config;
use crate::document::DocumentFetcher;
use crate::llm::{LLMProviderConfig, LLM};
use crate::models::{FieldValue, ResearchState};
use crate::search::{ArxivClient, PaperFinder};
use crate::types::AppResult;

pub struct ResearchPipeline {
    config: Config,
    llm: LLM,
    finder: PaperFinder,
    fetcher: DocumentFetcher,
    initial_state: ResearchState,
    state: ResearchState,
    analyzed_titles: HashSet<String>,
    query_history: Vec<String>,
}

impl ResearchPipeline {
    /// Construct the pipeline from configuration. This is the last point at
    /// which an error can abort the process.
    pub fn new(config: Config) -> AppResult<Self> {
        let llm = LLM::new(LLMProviderConfig {
            name: config.llm.provider.clone(),
            api_key: config.llm.anthropic_api_key.clone(),
        })?;
        let finder = PaperFinder::new(ArxivClient::new()?, config.search.retries);
        let fetcher = DocumentFetcher::new(config.research.pdf_text_cap)?;
        Ok(Self::with_components(config, llm, finder, fetcher))
    }

    /// Assemble from pre-built components. Tests use this to point the
    /// pipeline at stub servers.
    pub fn with_components(
        config: Config,
        llm: LLM,
        finder: PaperFinder,
        fetcher: DocumentFetcher,
    ) -> Self {
        let seed = ResearchState::seed();
        Self {
            config,
            llm,
            finder,
            fetcher,
            initial_state: seed.clone(),
            state: seed,
            analyzed_titles: HashSet::new(),
            query_history: Vec::new(),
        }
    }

    pub fn state(&self) -> &ResearchState {
        &self.state
    }

    pub fn analyzed_titles(&self) -> &HashSet<String> {
        &self.analyzed_titles
    }

    /// Run the full research process to completion.
    pub async fn run(&mut self) {
        println!("Initiating Comprehensive Autonomous AI Research Process");

        let iterations = self.config.research.iterations;
        for iteration in 0..iterations {
            println!("\nIteration {}/{}", iteration + 1, iterations);
            self.run_iteration().await;
            tokio::time::sleep(Duration::from_secs(self.config.research.iteration_delay_secs))
                .await;
        }

        println!("\nComprehensive Autonomous AI Research Process Completed");
        self.evaluate_progress().await;

        println!("\nFinal Research State and Potential Breakthroughs:");
        println!("{}", self.state.to_pretty_json());
    }

    async fn run_iteration(&mut self) {
        let query = QueryGenerator::generate(
            &self.llm,
            &self.config.llm.orchestration_model,
            &self.state,
            &self.query_history,
        )
        .await;
        self.query_history.push(query.clone());
        println!("Generated search query: {}", query);

        let papers = self
            .finder
            .search(&query, self.config.search.max_results)
            .await;
        println!("Found {} papers", papers.len());

        let new_papers: Vec<_> = papers
            .into_iter()
            .filter(|p| !self.analyzed_titles.contains(&p.title))
            .take(self.config.research.papers_per_iteration)
            .collect();
        let batch_size = new_papers.len();

        for (index, paper) in new_papers.into_iter().enumerate() {
            println!("\nAnalyzing paper {}/{}:", index + 1, batch_size);
            println!("Title: {}", paper.title);

            // Marked before analysis: a paper that fails is never retried.
            self.analyzed_titles.insert(paper.title.clone());

            let document_text = self.fetcher.fetch_pdf_text(&paper.pdf_url).await;

            let analysis = match PaperAnalyzer::analyze(
                &self.llm,
                &self.config.llm.analysis_model,
                &paper,
                &document_text,
                &self.state,
            )
            .await
            {
                Ok(extraction) => extraction.record,
                Err(e) => {
                    println!("Error in paper analysis: {}", e);
                    continue;
                }
            };

            println!("\nKey Insights and Potential Breakthroughs:");
            print_bullets(&analysis.field("groundbreaking_ideas"));

            println!("\nNovel Hypotheses Generated:");
            print_bullets(&analysis.field("novel_hypotheses"));

            match StateUpdater::update(
                &self.llm,
                &self.config.llm.orchestration_model,
                &self.state,
                &analysis,
            )
            .await
            {
                Ok(new_state) => {
                    info!(title = %paper.title, "Merged analysis into research state");
                    self.state = new_state;
                }
                Err(e) => {
                    println!("Error occurred while updating research state: {}", e);
                    println!("Continuing with previous research state.");
                }
            }
        }

        println!("\nUpdated Research Focus:");
        match self.state.get("current_focus") {
            Some(focus) => println!("{}", focus),
            None => println!("No focus available"),
        }

        println!("\nGenerating New Research Directions...");
        match DirectionGenerator::generate(
            &self.llm,
            &self.config.llm.orchestration_model,
            &self.state,
        )
        .await
        {
            Ok(extraction) => {
                println!("\nPromising Areas for Breakthroughs:");
                print_bullets(&extraction.record.field("promising_areas"));
                println!("\nBold New Hypotheses:");
                print_bullets(&extraction.record.field("bold_hypotheses"));
                println!("\nNext Step:");
                println!("{}", extraction.record.field("next_step"));
            }
            Err(e) => println!("Error generating new research directions: {}", e),
        }
    }

    async fn evaluate_progress(&self) {
        println!("\nEvaluating Overall Progress...");
        match ProgressEvaluator::evaluate(
            &self.llm,
            &self.config.llm.orchestration_model,
            &self.initial_state,
            &self.state,
        )
        .await
        {
            Ok(extraction) => {
                println!("\nKey Advancements:");
                print_bullets(&extraction.record.field("advancements"));
                println!("\nPivotal Discoveries:");
                print_bullets(&extraction.record.field("pivotal_discoveries"));
                println!("\nRecommendations for Further Research:");
                print_bullets(&extraction.record.field("recommendations"));
            }
            Err(e) => println!("Error evaluating progress: {}", e),
        }
    }
}

/// Print a field as dash bullets: a lone text value is one bullet, lists
/// flatten recursively, nested maps are skipped.
fn print_bullets(value: &FieldValue) {
    match value {
        FieldValue::Text(text) => println!("- {}", text),
        FieldValue::List(items) => {
            for item in items {
                print_bullets(item);
            }
        }
        FieldValue::Map(_) => {}
    }
}
