//! # Briefly
//!
//! A TUI application for abstractive summarisation of text and web articles
//! with a local pretrained encoder-decoder model.
//!
//! ## Features
//!
//! - **Article extraction**: Readability-style boilerplate removal for URLs
//! - **Local inference**: T5-family checkpoints from the Hugging Face hub, run with candle
//! - **Beam search**: length-penalised beam decoding with min/max length bounds
//! - **Statistics**: word counts and length reduction for every summary

pub mod config;
pub mod controller;
pub mod generation;
pub mod model;
pub mod scraper;
pub mod stats;
pub mod summarizer;
pub mod ui;

pub use config::Config;
pub use controller::{Controller, Outcome, WebSource};
pub use model::{ModelHandle, ModelLoader};
pub use stats::SummaryStats;
pub use summarizer::{Summarizer, SummaryConfig};
