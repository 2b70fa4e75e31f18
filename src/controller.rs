//! Request handlers behind every user action.
//!
//! Each action is one call that returns an [`Outcome`]; nothing is carried
//! between calls except the summarizer, which owns the loaded model.

use crate::config::ScraperConfig;
use crate::generation::Seq2SeqModel;
use crate::scraper::{self, Article, ScraperError};
use crate::stats::SummaryStats;
use crate::summarizer::{SummarizeError, Summarizer, SummaryConfig};
use std::fmt::Display;

/// Where article text for a URL comes from
#[allow(async_fn_in_trait)]
pub trait ArticleSource {
    async fn fetch(&self, url: &str) -> Result<Article, ScraperError>;
}

/// Fetches articles over HTTP
#[derive(Debug, Clone, Default)]
pub struct WebSource {
    config: ScraperConfig,
}

impl WebSource {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

impl ArticleSource for WebSource {
    async fn fetch(&self, url: &str) -> Result<Article, ScraperError> {
        scraper::fetch_article(url, &self.config).await
    }
}

/// What a handled action produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing to do: the URL or text was blank
    Idle,
    Extracted(Article),
    /// A user-facing explanation of why extraction failed
    ExtractionFailed(String),
    Summarized {
        summary: String,
        stats: SummaryStats,
    },
}

pub struct Controller<M, S = WebSource> {
    summarizer: Summarizer<M>,
    source: S,
}

impl<M, S> Controller<M, S>
where
    M: Seq2SeqModel,
    M::Error: Display,
    S: ArticleSource,
{
    pub fn new(summarizer: Summarizer<M>, source: S) -> Self {
        Self { summarizer, source }
    }

    /// Fetch the article behind `url`.
    ///
    /// Failures are reported as [`Outcome::ExtractionFailed`], never as errors.
    pub async fn extract(&self, url: &str) -> Outcome {
        let url = url.trim();
        if url.is_empty() {
            return Outcome::Idle;
        }

        match self.source.fetch(url).await {
            Ok(article) => {
                log::info!("extracted {} words from {}", crate::stats::word_count(&article.text), url);
                Outcome::Extracted(article)
            }
            Err(e) => {
                log::warn!("extraction of {} failed: {}", url, e);
                Outcome::ExtractionFailed(failure_message(&e))
            }
        }
    }

    /// Summarise `text` and measure how much shorter it got
    pub fn summarize(&mut self, text: &str, config: &SummaryConfig) -> Result<Outcome, SummarizeError> {
        if text.trim().is_empty() {
            return Ok(Outcome::Idle);
        }

        let summary = self.summarizer.summarize(text, config)?;
        let stats = SummaryStats::compute(text, &summary);
        log::info!(
            "summarised {} words into {} ({})",
            stats.original_words,
            stats.summary_words,
            stats.reduction_display()
        );
        Ok(Outcome::Summarized { summary, stats })
    }
}

fn failure_message(error: &ScraperError) -> String {
    let hint = match error {
        ScraperError::InvalidUrl(_) => "Please check the URL.",
        e if e.is_network() => "Please check the URL or try another one.",
        _ => "The page has no readable article text; try another one.",
    };
    format!("Failed to extract article ({}). {}", error, hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_name_the_cause() {
        let message = failure_message(&ScraperError::NoContent);
        assert!(message.starts_with("Failed to extract article"));
        assert!(message.contains("no article text"));

        let status = failure_message(&ScraperError::Status(reqwest::StatusCode::NOT_FOUND));
        assert!(status.contains("404"));
        assert!(status.contains("try another one"));

        let invalid = failure_message(&ScraperError::InvalidUrl(url::ParseError::EmptyHost));
        assert!(invalid.ends_with("Please check the URL."));
    }
}
