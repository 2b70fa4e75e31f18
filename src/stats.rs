//! Length-reduction statistics shown next to a summary.

use std::fmt;

/// Word counts of an original text and its summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub original_words: usize,
    pub summary_words: usize,
}

impl SummaryStats {
    pub fn new(original_words: usize, summary_words: usize) -> Self {
        Self {
            original_words,
            summary_words,
        }
    }

    /// Count whitespace-separated words of both texts
    pub fn compute(original: &str, summary: &str) -> Self {
        Self::new(word_count(original), word_count(summary))
    }

    /// Percentage of words removed, or `None` when the original had no words
    pub fn reduction(&self) -> Option<f64> {
        if self.original_words == 0 {
            return None;
        }
        let original = self.original_words as f64;
        Some((original - self.summary_words as f64) / original * 100.0)
    }

    pub fn reduction_display(&self) -> Reduction {
        Reduction(self.reduction())
    }
}

/// Renders a reduction as `75.0%`, or `n/a` when undefined
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction(pub Option<f64>);

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(pct) => write!(f, "{:.1}%", pct),
            None => f.write_str("n/a"),
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_to_twenty_five_is_seventy_five_percent() {
        let stats = SummaryStats::new(100, 25);
        assert_eq!(stats.reduction_display().to_string(), "75.0%");
    }

    #[test]
    fn counts_whitespace_separated_words() {
        let stats = SummaryStats::compute("one  two\nthree\tfour ", "one two");
        assert_eq!(stats, SummaryStats::new(4, 2));
        assert_eq!(stats.reduction(), Some(50.0));
    }

    #[test]
    fn empty_original_has_undefined_reduction() {
        let stats = SummaryStats::compute("   ", "anything at all");
        assert_eq!(stats.reduction(), None);
        assert_eq!(stats.reduction_display().to_string(), "n/a");
    }

    #[test]
    fn longer_summary_is_a_negative_reduction() {
        let stats = SummaryStats::new(4, 6);
        assert_eq!(stats.reduction_display().to_string(), "-50.0%");
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(SummaryStats::new(3, 1).reduction_display().to_string(), "66.7%");
    }
}
