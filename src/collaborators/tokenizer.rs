use crate::core::config::Config;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Turns raw text into an ordered sequence of index terms.
///
/// The same tokenizer instance MUST be used for both building and
/// querying, or document frequencies and BM25 scores become meaningless:
/// a term's position in the returned vector is its token position within
/// the document, which the builder and the query evaluator both rely on.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;

    fn name(&self) -> &str;
}

/// Unicode word segmentation, lowercasing, and stopword/length filtering.
///
/// Deliberately does not attempt stemming or CJK-specific segmentation;
/// `unicode_words()` treats runs of CJK characters as a single token,
/// which is an acceptable approximation for this crate's scope.
#[derive(Clone)]
pub struct StandardTokenizer {
    pub lowercase: bool,
    pub min_term_length: u8,
    pub max_term_length: u8,
    pub stop_words: Option<HashSet<String>>,
}

impl StandardTokenizer {
    pub fn from_config(config: &Config) -> Self {
        StandardTokenizer {
            lowercase: true,
            min_term_length: config.min_term_length,
            max_term_length: config.max_term_length,
            stop_words: if config.stopwords_enabled {
                Some(english_stop_words())
            } else {
                None
            },
        }
    }
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            lowercase: true,
            min_term_length: 2,
            max_term_length: 64,
            stop_words: Some(english_stop_words()),
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered;
        let text_to_process: &str = if self.lowercase {
            lowered = text.to_lowercase();
            &lowered
        } else {
            text
        };

        text_to_process
            .unicode_words()
            .filter(|word| {
                let len = word.chars().count();
                len >= self.min_term_length as usize && len <= self.max_term_length as usize
            })
            .filter(|word| {
                self.stop_words
                    .as_ref()
                    .map(|stops| !stops.contains(*word))
                    .unwrap_or(true)
            })
            .map(str::to_string)
            .collect()
    }

    fn name(&self) -> &str {
        "standard"
    }
}

fn english_stop_words() -> HashSet<String> {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "that", "the", "to", "was", "will", "with",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_and_lowercases() {
        let tok = StandardTokenizer::default();
        assert_eq!(tok.tokenize("Alpha Beta Alpha"), vec!["alpha", "beta", "alpha"]);
    }

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let tok = StandardTokenizer::default();
        assert_eq!(tok.tokenize("the quick fox is a cat"), vec!["quick", "fox", "cat"]);
    }

    #[test]
    fn deterministic_across_calls() {
        let tok = StandardTokenizer::default();
        let text = "Financial markets react to quarterly earnings reports";
        assert_eq!(tok.tokenize(text), tok.tokenize(text));
    }
}
