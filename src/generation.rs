//! Beam-search decoding for encoder-decoder models.
//!
//! The search is independent of the neural backend: anything implementing
//! [`Seq2SeqModel`] can be decoded. Sequence lengths count the decoder start
//! token, so `max_length = 130` allows at most 129 generated tokens.

use std::cmp::Ordering;

/// An encoder-decoder model reduced to what decoding needs.
pub trait Seq2SeqModel {
    /// Encoder output reused across decoding steps
    type Encoded;
    type Error;

    fn encode(&mut self, input_ids: &[u32]) -> Result<Self::Encoded, Self::Error>;

    /// Unnormalised scores over the vocabulary for the token following `decoder_ids`
    fn next_token_logits(
        &mut self,
        encoded: &Self::Encoded,
        decoder_ids: &[u32],
    ) -> Result<Vec<f32>, Self::Error>;

    fn decoder_start_token_id(&self) -> u32;
    fn eos_token_id(&self) -> u32;
}

/// Parameters of one beam-search run
#[derive(Debug, Clone, PartialEq)]
pub struct BeamSearchParams {
    pub num_beams: usize,
    pub max_length: usize,
    pub min_length: usize,
    pub length_penalty: f32,
    pub early_stopping: bool,
    pub no_repeat_ngram_size: usize,
}

impl Default for BeamSearchParams {
    fn default() -> Self {
        Self {
            num_beams: 4,
            max_length: 130,
            min_length: 30,
            length_penalty: 2.0,
            early_stopping: true,
            no_repeat_ngram_size: 3,
        }
    }
}

/// A live beam: the decoder sequence (start token first) and its summed log-probability
#[derive(Debug, Clone)]
struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

/// A finished candidate ranked by its length-normalised score
#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<u32>,
    score: f32,
}

/// The best `capacity` finished hypotheses seen so far
struct Hypotheses {
    capacity: usize,
    length_penalty: f32,
    early_stopping: bool,
    items: Vec<Hypothesis>,
}

impl Hypotheses {
    fn new(params: &BeamSearchParams) -> Self {
        Self {
            capacity: params.num_beams,
            length_penalty: params.length_penalty,
            early_stopping: params.early_stopping,
            items: Vec::with_capacity(params.num_beams + 1),
        }
    }

    fn normalise(&self, sum_logprobs: f32, len: usize) -> f32 {
        sum_logprobs / (len as f32).powf(self.length_penalty)
    }

    fn worst_score(&self) -> f32 {
        self.items
            .iter()
            .map(|h| h.score)
            .fold(f32::INFINITY, f32::min)
    }

    /// Offer a hypothesis whose length before EOS was `len`
    fn add(&mut self, tokens: Vec<u32>, sum_logprobs: f32, len: usize) {
        let score = self.normalise(sum_logprobs, len);
        if self.items.len() >= self.capacity && score <= self.worst_score() {
            return;
        }
        self.items.push(Hypothesis { tokens, score });
        if self.items.len() > self.capacity {
            if let Some(worst) = self
                .items
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.score.partial_cmp(&b.1.score).unwrap_or(Ordering::Equal))
                .map(|(i, _)| i)
            {
                self.items.remove(worst);
            }
        }
    }

    /// Whether no live beam can still improve the finished set
    fn is_done(&self, best_live_score: f32, cur_len: usize) -> bool {
        if self.items.len() < self.capacity {
            return false;
        }
        if self.early_stopping {
            return true;
        }
        self.worst_score() >= self.normalise(best_live_score, cur_len)
    }

    fn best(self) -> Option<Hypothesis> {
        self.items
            .into_iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
    }
}

/// Decode `input_ids` with beam search and return the generated tokens.
///
/// The result excludes the decoder start token and includes the EOS token when
/// the best hypothesis finished before `max_length`.
pub fn beam_search<M: Seq2SeqModel>(
    model: &mut M,
    input_ids: &[u32],
    params: &BeamSearchParams,
) -> Result<Vec<u32>, M::Error> {
    let num_beams = params.num_beams.max(1);
    let start = model.decoder_start_token_id();
    let eos = model.eos_token_id();
    let encoded = model.encode(input_ids)?;

    let mut beams = vec![Beam {
        tokens: vec![start],
        score: 0.0,
    }];
    let mut hypotheses = Hypotheses::new(&BeamSearchParams {
        num_beams,
        ..params.clone()
    });

    let mut cur_len = 1;
    while cur_len < params.max_length {
        let mut candidates: Vec<(usize, u32, f32)> = Vec::new();
        for (beam_idx, beam) in beams.iter().enumerate() {
            let mut logprobs = log_softmax(&model.next_token_logits(&encoded, &beam.tokens)?);
            if cur_len < params.min_length {
                ban(&mut logprobs, eos);
            }
            for token in banned_ngram_tokens(&beam.tokens, params.no_repeat_ngram_size) {
                ban(&mut logprobs, token);
            }
            for (token, lp) in top_k(&logprobs, 2 * num_beams) {
                candidates.push((beam_idx, token, beam.score + lp));
            }
        }
        candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));
        candidates.truncate(2 * num_beams);

        let mut next_beams: Vec<Beam> = Vec::with_capacity(num_beams);
        for (rank, (beam_idx, token, score)) in candidates.into_iter().enumerate() {
            let parent = &beams[beam_idx];
            if token == eos {
                if rank < num_beams {
                    let mut tokens = parent.tokens[1..].to_vec();
                    tokens.push(eos);
                    hypotheses.add(tokens, score, cur_len);
                }
            } else {
                let mut tokens = parent.tokens.clone();
                tokens.push(token);
                next_beams.push(Beam { tokens, score });
            }
            if next_beams.len() == num_beams {
                break;
            }
        }

        cur_len += 1;
        beams = next_beams;
        if beams.is_empty() {
            break;
        }

        let best_live = beams
            .iter()
            .map(|b| b.score)
            .fold(f32::NEG_INFINITY, f32::max);
        if hypotheses.is_done(best_live, cur_len) {
            beams.clear();
            break;
        }
    }

    // Sequences cut off by max_length compete with the finished ones.
    for beam in beams {
        let len = beam.tokens.len();
        hypotheses.add(beam.tokens[1..].to_vec(), beam.score, len);
    }

    Ok(hypotheses.best().map(|h| h.tokens).unwrap_or_default())
}

fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![f32::NEG_INFINITY; logits.len()];
    }
    let log_sum = logits.iter().map(|&x| (x - max).exp()).sum::<f32>().ln();
    logits.iter().map(|&x| x - max - log_sum).collect()
}

fn ban(logprobs: &mut [f32], token: u32) {
    if let Some(lp) = logprobs.get_mut(token as usize) {
        *lp = f32::NEG_INFINITY;
    }
}

/// Indices of the `k` largest values, best first
fn top_k(values: &[f32], k: usize) -> Vec<(u32, f32)> {
    let mut indexed: Vec<(u32, f32)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > f32::NEG_INFINITY)
        .map(|(i, &v)| (i as u32, v))
        .collect();
    let k = k.min(indexed.len());
    if k == 0 {
        return Vec::new();
    }
    let cmp = |a: &(u32, f32), b: &(u32, f32)| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal);
    if k < indexed.len() {
        indexed.select_nth_unstable_by(k - 1, cmp);
        indexed.truncate(k);
    }
    indexed.sort_by(cmp);
    indexed
}

/// Tokens that would complete an n-gram already present in `tokens`
fn banned_ngram_tokens(tokens: &[u32], n: usize) -> Vec<u32> {
    if n == 0 || tokens.len() + 1 < n {
        return Vec::new();
    }
    let prefix = &tokens[tokens.len() + 1 - n..];
    tokens
        .windows(n)
        .filter(|window| &window[..n - 1] == prefix)
        .map(|window| window[n - 1])
        .collect()
}
