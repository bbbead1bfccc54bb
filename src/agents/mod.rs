//! Research agents
//!
//! Each agent owns one prompt shape and one model invocation:
//!
//! - **Query Generator**: turns the research state and query history into
//!   the next arXiv search query
//! - **Paper Analyzer**: reads one paper against the current state
//! - **State Updater**: folds an analysis into a replacement state
//! - **Direction Generator**: proposes next research directions (read-only)
//! - **Progress Evaluator**: compares seed state to final state (read-only)
//!
//! ## Loop Overview
//!
//! ```text
//! ┌──────────────┐
//! │    Query     │  → search query
//! │  Generator   │
//! └──────────────┘
//!        │ search
//!        ▼
//! ┌──────────────┐
//! │    Paper     │  → structured analysis (per paper)
//! │   Analyzer   │
//! └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │    State     │  → replacement research state
//! │   Updater    │
//! └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐      ┌──────────────┐
//! │  Direction   │      │   Progress   │
//! │  Generator   │      │  Evaluator   │  (after the last iteration)
//! └──────────────┘      └──────────────┘
//! ```
//!
//! Every model reply runs through [`crate::extract::extract_structured`];
//! a transport failure surfaces as an `Err` the controller inspects and
//! reports without stopping the loop.

pub mod analyzer;
pub mod directions;
pub mod progress;
pub mod query_gen;
pub mod state_updater;

pub use analyzer::{PaperAnalyzer, ANALYSIS_FIELDS};
pub use directions::{DirectionGenerator, DIRECTION_FIELDS};
pub use progress::{ProgressEvaluator, EVALUATION_FIELDS};
pub use query_gen::{QueryGenerator, FALLBACK_QUERY};
pub use state_updater::StateUpdater;
