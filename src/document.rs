//! Full-text retrieval
//!
//! Resolves a paper's PDF link to plain text, capped in size. Failures at
//! this boundary are returned *as content*: the analyzer receives the
//! inline error string the same way it would receive extracted text, and
//! the model is left to make of it what it can. Nothing here can abort the
//! run.

use std::time::Duration;

use tracing::{debug, warn};

use crate::types::{AppError, AppResult};

const REQUEST_TIMEOUT_SECS: u64 = 60;

pub struct DocumentFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl DocumentFetcher {
    pub fn new(max_chars: usize) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, max_chars })
    }

    /// Download a PDF and extract its text, truncated to the configured cap.
    /// Total: download and extraction failures come back as inline error
    /// strings.
    pub async fn fetch_pdf_text(&self, url: &str) -> String {
        let bytes = match self.download(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = %url, error = %e, "PDF download failed");
                return format!("Error downloading PDF: {}", e);
            }
        };

        debug!(url = %url, size = bytes.len(), "Downloaded PDF");

        match extract_pdf_text(&bytes) {
            Ok(text) => truncate_chars(text, self.max_chars),
            Err(e) => {
                warn!(url = %url, error = %e, "PDF text extraction failed");
                format!("Error extracting PDF content: {}", e)
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let document = lopdf::Document::load_mem(bytes)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    let mut text = String::new();
    for page in pages {
        // A single unreadable page should not discard the rest.
        match document.extract_text(&[page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => warn!(page, error = %e, "Skipping unreadable PDF page"),
        }
    }
    Ok(text)
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text,
    }
}
