//! Paper discovery
//!
//! Overly specific boolean queries are the most common cause of zero search
//! results, so the finder degrades the query instead of giving up: every
//! empty or failed attempt runs the query through [`simplify_query`] before
//! the next try. The simplification is irreversible within one search call.
//! After the retry budget the finder returns an empty list; an iteration
//! with zero papers is a reportable condition, never a crash.

pub mod arxiv;

pub use arxiv::ArxivClient;

use tracing::{info, warn};

use crate::models::Paper;

/// Degrade an overly specific query into a looser one: drop quoting and
/// grouping punctuation, boolean connectives, and 4-digit year tokens, then
/// keep at most the first 4 remaining tokens. Pure; idempotent on a query
/// that is already simplified.
pub fn simplify_query(query: &str) -> String {
    let stripped: String = query
        .chars()
        .filter(|c| !matches!(c, '"' | '(' | ')'))
        .collect();

    stripped
        .split_whitespace()
        .filter(|token| *token != "AND" && *token != "OR")
        .filter(|token| !is_year_token(token))
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_year_token(token: &str) -> bool {
    token.len() == 4 && token.chars().all(|c| c.is_ascii_digit())
}

/// Searches the paper index with a bounded retry-and-simplify escalation.
pub struct PaperFinder {
    client: ArxivClient,
    retries: u32,
}

impl PaperFinder {
    pub fn new(client: ArxivClient, retries: u32) -> Self {
        Self {
            client,
            retries: retries.max(1),
        }
    }

    /// Return a non-empty list of papers if at all possible, else empty.
    /// Makes at most `retries` search attempts.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<Paper> {
        let mut query = query.to_string();

        for attempt in 1..=self.retries {
            match self.client.search(&query, max_results).await {
                Ok(papers) if !papers.is_empty() => {
                    info!(attempt, count = papers.len(), "Search returned papers");
                    return papers;
                }
                Ok(_) => {
                    warn!(attempt, query = %query, "No papers found");
                }
                Err(e) => {
                    // A failed request counts the same as zero results.
                    warn!(attempt, query = %query, error = %e, "Search attempt failed");
                }
            }

            if attempt < self.retries {
                query = simplify_query(&query);
                info!(simplified = %query, "Simplifying query for next attempt");
            }
        }

        warn!(retries = self.retries, "No papers found after all attempts");
        Vec::new()
    }
}
