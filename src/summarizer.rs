//! Abstractive summarisation on top of a loaded [`ModelHandle`].

use crate::config::{GenerationConfig, MAX_LENGTH_RANGE, MIN_LENGTH_RANGE};
use crate::generation::{beam_search, BeamSearchParams, Seq2SeqModel};
use crate::model::ModelHandle;
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("generation failed: {0}")]
    Model(String),
}

/// Per-request output length bounds, in tokens.
///
/// `min_length <= max_length` is not enforced; generation stops at
/// `max_length` regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryConfig {
    pub max_length: usize,
    pub min_length: usize,
}

impl SummaryConfig {
    pub fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length,
        }
    }

    /// Move `max_length` by `delta`, staying on its slider
    pub fn nudge_max(&mut self, delta: isize) {
        self.max_length = nudge(self.max_length, delta, MAX_LENGTH_RANGE);
    }

    /// Move `min_length` by `delta`, staying on its slider
    pub fn nudge_min(&mut self, delta: isize) {
        self.min_length = nudge(self.min_length, delta, MIN_LENGTH_RANGE);
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self::new(generation.max_length, generation.min_length)
    }
}

impl From<&GenerationConfig> for SummaryConfig {
    fn from(generation: &GenerationConfig) -> Self {
        Self::new(generation.max_length, generation.min_length)
    }
}

fn nudge(value: usize, delta: isize, (lo, hi): (usize, usize)) -> usize {
    value.saturating_add_signed(delta).clamp(lo, hi)
}

/// Turns text into a summary with a tokenizer + seq2seq model pair
pub struct Summarizer<M> {
    handle: ModelHandle<M>,
    prefix: String,
    generation: GenerationConfig,
}

impl<M> Summarizer<M>
where
    M: Seq2SeqModel,
    M::Error: Display,
{
    pub fn new(handle: ModelHandle<M>, prefix: impl Into<String>, generation: GenerationConfig) -> Self {
        Self {
            handle,
            prefix: prefix.into(),
            generation,
        }
    }

    /// Summarise `text` within the bounds of `config`.
    ///
    /// Input beyond `max_input_tokens` is dropped; only the lead of a long
    /// article contributes to its summary.
    pub fn summarize(&mut self, text: &str, config: &SummaryConfig) -> Result<String, SummarizeError> {
        let input_ids = self.encode_input(text)?;
        let params = BeamSearchParams {
            num_beams: self.generation.num_beams,
            max_length: config.max_length,
            min_length: config.min_length,
            length_penalty: self.generation.length_penalty,
            early_stopping: self.generation.early_stopping,
            no_repeat_ngram_size: self.generation.no_repeat_ngram_size,
        };
        log::debug!("generating with {:?} from {} input tokens", params, input_ids.len());

        let output = beam_search(&mut self.handle.model, &input_ids, &params)
            .map_err(|e| SummarizeError::Model(e.to_string()))?;
        let summary = self
            .handle
            .tokenizer
            .decode(&output, true)
            .map_err(|e| SummarizeError::Tokenizer(e.to_string()))?;

        Ok(summary.trim().to_string())
    }

    /// Prefix, tokenize and truncate, keeping room for the trailing EOS
    fn encode_input(&self, text: &str) -> Result<Vec<u32>, SummarizeError> {
        let prompt = format!("{}{}", self.prefix, text);
        let encoding = self
            .handle
            .tokenizer
            .encode(prompt, false)
            .map_err(|e| SummarizeError::Tokenizer(e.to_string()))?;

        let mut ids = encoding.get_ids().to_vec();
        let budget = self.generation.max_input_tokens.saturating_sub(1);
        if ids.len() > budget {
            log::debug!("truncating input from {} to {} tokens", ids.len(), budget);
            ids.truncate(budget);
        }
        ids.push(self.handle.model.eos_token_id());
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nudges_stay_on_the_sliders() {
        let mut config = SummaryConfig::default();
        config.nudge_max(1_000);
        config.nudge_min(-1_000);
        assert_eq!(config, SummaryConfig::new(200, 20));
        config.nudge_max(-10);
        config.nudge_min(5);
        assert_eq!(config, SummaryConfig::new(190, 25));
    }

    #[test]
    fn slider_extremes_are_accepted_in_either_order() {
        let mut config = SummaryConfig::new(50, 100);
        config.nudge_max(0);
        config.nudge_min(0);
        assert_eq!(config, SummaryConfig::new(50, 100));
    }

    #[test]
    fn defaults_follow_generation_config() {
        let generation = GenerationConfig {
            max_length: 150,
            min_length: 40,
            ..GenerationConfig::default()
        };
        assert_eq!(SummaryConfig::from(&generation), SummaryConfig::new(150, 40));
        assert_eq!(SummaryConfig::default(), SummaryConfig::new(130, 30));
    }
}
