//! Article extraction from webpages.
//!
//! Uses reqwest for fetching, dom_smoothie (Readability) for boilerplate
//! removal and scraper for flattening HTML into plain paragraphs.

use crate::config::ScraperConfig;
use dom_smoothie::Readability;
use reqwest::{redirect, Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Blocks shorter than this are dropped by the heuristic fallback
const MIN_FALLBACK_BLOCK_CHARS: usize = 20;

/// Containers tried in order when Readability finds nothing
const MAIN_SELECTORS: [&str; 5] = ["article", "main", "[role='main']", ".content", "#content"];

const BLOCK_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6, li, pre, blockquote";

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to fetch URL: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("no article text found at URL")]
    NoContent,
}

impl ScraperError {
    /// Whether the failure happened before any HTML was received
    pub fn is_network(&self) -> bool {
        matches!(self, ScraperError::Network(_) | ScraperError::Status(_))
    }
}

/// Article text extracted from a webpage
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// The URL as requested
    pub url: String,
    pub title: Option<String>,
    /// Body text, paragraphs separated by blank lines
    pub text: String,
}

/// Create a configured HTTP client for scraping
pub fn create_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(redirect::Policy::limited(config.max_redirects))
        .build()
}

/// Fetch a URL and extract its article text
pub async fn fetch_article(url: &str, config: &ScraperConfig) -> Result<Article, ScraperError> {
    let parsed = Url::parse(url.trim())?;
    let client = create_client(config)?;

    log::info!("fetching {}", parsed);
    let response = client.get(parsed.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::Status(status));
    }
    let html = response.text().await?;
    log::debug!("received {} bytes from {}", html.len(), parsed);

    let (title, text) = extract_article(&html, Some(parsed.as_str()))?;
    Ok(Article {
        url: url.to_string(),
        title,
        text,
    })
}

/// Extract `(title, text)` from an HTML document.
///
/// Readability runs first; if it fails or yields no text, the main-content
/// heuristics take over.
pub fn extract_article(
    html: &str,
    url: Option<&str>,
) -> Result<(Option<String>, String), ScraperError> {
    let document = Html::parse_document(html);
    let title = extract_title(&document);

    if let Some((readable_title, text)) = readable_text(html, url) {
        let title = non_blank(readable_title).or(title);
        return Ok((title, text));
    }

    log::debug!("readability found no article, using heuristics");
    let text = extract_text(&document);
    if text.trim().is_empty() {
        return Err(ScraperError::NoContent);
    }
    Ok((title, text))
}

/// Run Readability and flatten its cleaned HTML to text
fn readable_text(html: &str, url: Option<&str>) -> Option<(String, String)> {
    let mut readability = match Readability::new(html, url, None) {
        Ok(readability) => readability,
        Err(e) => {
            log::debug!("readability setup failed: {}", e);
            return None;
        }
    };
    let article = match readability.parse() {
        Ok(article) => article,
        Err(e) => {
            log::debug!("readability parse failed: {}", e);
            return None;
        }
    };

    let fragment = Html::parse_fragment(&article.content.to_string());
    let text = blocks_to_text(fragment.root_element(), 0);
    if text.trim().is_empty() {
        None
    } else {
        Some((article.title, text))
    }
}

/// Extract the page title from <title> or <h1>
fn extract_title(document: &Html) -> Option<String> {
    ["title", "h1"]
        .into_iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            let element = document.select(&selector).next()?;
            non_blank(element.text().collect())
        })
}

/// Extract readable text from the first matching content container
fn extract_text(document: &Html) -> String {
    for selector_str in MAIN_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = blocks_to_text(element, MIN_FALLBACK_BLOCK_CHARS);
                if !text.trim().is_empty() {
                    return text;
                }
            }
        }
    }

    blocks_to_text(document.root_element(), MIN_FALLBACK_BLOCK_CHARS)
}

/// Collect paragraph-level blocks under `root`, whitespace-normalised.
///
/// Blocks nested in another matched block are skipped so list items holding
/// paragraphs are not emitted twice.
fn blocks_to_text(root: ElementRef<'_>, min_chars: usize) -> String {
    let Ok(selector) = Selector::parse(BLOCK_SELECTOR) else {
        return String::new();
    };

    let mut paragraphs: Vec<String> = Vec::new();
    for element in root.select(&selector) {
        let nested = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|ancestor| ancestor.id() != root.id())
            .any(|ancestor| selector.matches(&ancestor));
        if nested {
            continue;
        }

        let cleaned = element.text().collect::<Vec<_>>().join(" ");
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        if !cleaned.is_empty() && cleaned.len() > min_chars {
            paragraphs.push(cleaned);
        }
    }

    paragraphs.join("\n\n")
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
