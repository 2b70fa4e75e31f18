//! Offline stand-ins for the pretrained model, tokenizer and web.

#![allow(dead_code)]

use briefly::controller::ArticleSource;
use briefly::generation::Seq2SeqModel;
use briefly::scraper::{Article, ScraperError};
use briefly::{ModelHandle, Summarizer};
use briefly::config::GenerationConfig;
use std::convert::Infallible;
use tokenizers::Tokenizer;

pub const PAD: u32 = 0;
pub const EOS: u32 = 1;

pub const WORDS: &[&str] = &[
    "the", "cat", "sat", "on", "mat", "a", "dog", "ran", "in", "park", "river", "rose", "fast",
];

/// Word-level tokenizer over [`WORDS`], split on whitespace
pub fn tokenizer() -> Tokenizer {
    let mut vocab = vec![
        r#""<pad>": 0"#.to_string(),
        r#""</s>": 1"#.to_string(),
        r#""<unk>": 2"#.to_string(),
        r#""summarize:": 3"#.to_string(),
    ];
    for (i, word) in WORDS.iter().enumerate() {
        vocab.push(format!(r#""{}": {}"#, word, i + 4));
    }

    let json = format!(
        r#"{{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [
    {{"id": 0, "content": "<pad>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}},
    {{"id": 1, "content": "</s>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}},
    {{"id": 2, "content": "<unk>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}}
  ],
  "normalizer": null,
  "pre_tokenizer": {{"type": "WhitespaceSplit"}},
  "post_processor": null,
  "decoder": null,
  "model": {{"type": "WordLevel", "vocab": {{{}}}, "unk_token": "<unk>"}}
}}"#,
        vocab.join(", ")
    );
    Tokenizer::from_bytes(json.as_bytes()).expect("test tokenizer")
}

pub fn vocab_size() -> usize {
    WORDS.len() + 4
}

/// Copies the first `keep` words after the instruction prefix, then wants to stop.
///
/// Once it wants to stop, every other word is a weak alternative so length
/// bounds can still push it on.
pub struct Echo {
    pub keep: usize,
}

impl Seq2SeqModel for Echo {
    type Encoded = Vec<u32>;
    type Error = Infallible;

    fn encode(&mut self, input_ids: &[u32]) -> Result<Vec<u32>, Infallible> {
        Ok(input_ids.to_vec())
    }

    fn next_token_logits(&mut self, encoded: &Vec<u32>, decoder_ids: &[u32]) -> Result<Vec<f32>, Infallible> {
        let content: Vec<u32> = encoded
            .iter()
            .copied()
            .skip(1)
            .filter(|id| *id != EOS)
            .collect();
        let step = decoder_ids.len() - 1;

        let mut logits = vec![f32::NEG_INFINITY; vocab_size()];
        if step < self.keep.min(content.len()) {
            logits[content[step] as usize] = 0.0;
        } else {
            for word in 4..vocab_size() {
                logits[word] = -2.0;
            }
            logits[EOS as usize] = 0.0;
        }
        Ok(logits)
    }

    fn decoder_start_token_id(&self) -> u32 {
        PAD
    }

    fn eos_token_id(&self) -> u32 {
        EOS
    }
}

pub fn summarizer(keep: usize, generation: GenerationConfig) -> Summarizer<Echo> {
    let handle = ModelHandle {
        tokenizer: tokenizer(),
        model: Echo { keep },
    };
    Summarizer::new(handle, "summarize: ", generation)
}

/// Serves one canned response for every URL
pub struct StubSource {
    pub text: Option<String>,
}

impl ArticleSource for StubSource {
    async fn fetch(&self, url: &str) -> Result<Article, ScraperError> {
        match &self.text {
            Some(text) => Ok(Article {
                url: url.to_string(),
                title: Some("Stub".to_string()),
                text: text.clone(),
            }),
            None => Err(ScraperError::NoContent),
        }
    }
}
