//! arXiv export API client
//!
//! Thin wrapper over the Atom feed at `/api/query`. Feed parsing is
//! deliberately forgiving: entries missing a title or PDF link are skipped,
//! and a malformed feed yields however many entries were readable before
//! the damage. Absence of results is not an error here; the retry policy
//! lives in [`crate::search::PaperFinder`].

use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;

use crate::models::Paper;
use crate::types::{AppError, AppResult};

const ARXIV_API_BASE: &str = "https://export.arxiv.org";
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> AppResult<Self> {
        Self::with_base_url(ARXIV_API_BASE)
    }

    pub fn with_base_url(base_url: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run one search request, newest submissions first.
    pub async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<Paper>> {
        let url = format!("{}/api/query", self.base_url);
        debug!(query = %query, max_results, "Querying arXiv export API");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("search_query", format!("all:{}", query)),
                ("max_results", max_results.to_string()),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Search(format!("arXiv request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Search(format!("arXiv returned HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Search(format!("Failed to read arXiv response: {}", e)))?;

        Ok(parse_atom_feed(&body))
    }
}

/// Parse an Atom feed into papers. Total: malformed XML terminates the scan
/// early and returns whatever complete entries came before it.
pub fn parse_atom_feed(xml: &str) -> Vec<Paper> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut papers = Vec::new();
    let mut buf = Vec::new();

    let mut in_entry = false;
    let mut in_author = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut summary = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut pdf_url = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let local = tag_name.split(':').next_back().unwrap_or(&tag_name);

                match local {
                    "entry" => {
                        in_entry = true;
                        title.clear();
                        summary.clear();
                        authors.clear();
                        pdf_url.clear();
                    }
                    "author" if in_entry => in_author = true,
                    "name" if in_author => current_tag = "author_name".to_string(),
                    "title" | "summary" if in_entry => current_tag = local.to_string(),
                    "link" if in_entry => {
                        if let Some(href) = pdf_href(e) {
                            pdf_url = href;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let local = tag_name.split(':').next_back().unwrap_or(&tag_name);
                if local == "link" && in_entry {
                    if let Some(href) = pdf_href(e) {
                        pdf_url = href;
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_default();
                match current_tag.as_str() {
                    "title" => title.push_str(&text),
                    "summary" => summary.push_str(&text),
                    "author_name" => authors.push(text),
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let local = tag_name.split(':').next_back().unwrap_or(&tag_name);
                match local {
                    "entry" => {
                        if in_entry && !title.trim().is_empty() && !pdf_url.is_empty() {
                            papers.push(Paper {
                                title: normalize_whitespace(&title),
                                authors: authors.join(", "),
                                abstract_text: summary.trim().to_string(),
                                pdf_url: pdf_url.clone(),
                            });
                        }
                        in_entry = false;
                    }
                    "author" => in_author = false,
                    _ => {}
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            // Damaged feed: keep what was parsed so far.
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    papers
}

/// `href` of a `<link>` element whose `title` attribute is `pdf`.
fn pdf_href(element: &quick_xml::events::BytesStart<'_>) -> Option<String> {
    let mut is_pdf = false;
    let mut href = None;
    for attr in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match key.as_str() {
            "title" if value == "pdf" => is_pdf = true,
            "href" => href = Some(value),
            _ => {}
        }
    }
    if is_pdf {
        href
    } else {
        None
    }
}

// arXiv titles wrap across lines with extra indentation.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <title>Attention Is
     Not All You Need</title>
    <summary>We revisit the attention mechanism &amp; its limits.</summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <title>No PDF Here</title>
    <summary>An entry without a pdf link.</summary>
    <author><name>Nobody</name></author>
    <link href="http://arxiv.org/abs/2401.00002v1" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_and_skips_those_without_pdf() {
        let papers = parse_atom_feed(FEED);
        assert_eq!(papers.len(), 1);
        let paper = &papers[0];
        assert_eq!(paper.title, "Attention Is Not All You Need");
        assert_eq!(paper.authors, "Ada Lovelace, Alan Turing");
        assert_eq!(paper.abstract_text, "We revisit the attention mechanism & its limits.");
        assert_eq!(paper.pdf_url, "http://arxiv.org/pdf/2401.00001v1");
    }

    #[test]
    fn empty_feed_yields_no_papers() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_atom_feed(xml).is_empty());
    }

    #[test]
    fn garbage_is_zero_papers_not_a_failure() {
        assert!(parse_atom_feed("this is not xml at all <<<>>>").is_empty());
        assert!(parse_atom_feed("").is_empty());
    }

    #[tokio::test]
    async fn search_hits_the_query_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/api/query".to_string()))
            .with_status(200)
            .with_body(FEED)
            .create_async()
            .await;

        let client = ArxivClient::with_base_url(&server.url()).unwrap();
        let papers = client.search("attention mechanisms", 10).await.unwrap();
        assert_eq!(papers.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_surfaces_as_search_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex(r"^/api/query".to_string()))
            .with_status(503)
            .create_async()
            .await;

        let client = ArxivClient::with_base_url(&server.url()).unwrap();
        let err = client.search("anything", 10).await.unwrap_err();
        assert!(matches!(err, crate::types::AppError::Search(_)));
    }
}
