//! Plain text metrics.
//!
//! [`analyze`] is a pure function of the document content; everything the
//! cache stores for a document is derived from it.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^A-Za-z0-9_\s]").unwrap();
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").unwrap();
    static ref BLANK_LINE: Regex = Regex::new(r"\n\s*\n").unwrap();
}

/// Full analysis of one content snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub word_count: u64,
    pub character_count: u64,
    pub sentence_count: u64,
    pub paragraph_count: u64,
    /// Longest words of every paragraph, unique, in first-seen order.
    pub longest_words: Vec<String>,
}

/// A single metric that can be cached on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisField {
    WordCount,
    CharacterCount,
    SentenceCount,
    ParagraphCount,
    LongestWords,
}

impl AnalysisField {
    pub const ALL: [AnalysisField; 5] = [
        AnalysisField::WordCount,
        AnalysisField::CharacterCount,
        AnalysisField::SentenceCount,
        AnalysisField::ParagraphCount,
        AnalysisField::LongestWords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisField::WordCount => "wordCount",
            AnalysisField::CharacterCount => "characterCount",
            AnalysisField::SentenceCount => "sentenceCount",
            AnalysisField::ParagraphCount => "paragraphCount",
            AnalysisField::LongestWords => "longestWords",
        }
    }
}

impl fmt::Display for AnalysisField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase, strip punctuation, split on whitespace.
fn words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, "")
        .split(|c: char| c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compute every metric for `content`.
pub fn analyze(content: &str) -> Analysis {
    let content = content.trim();
    if content.is_empty() {
        return Analysis::default();
    }

    // UTF-16 code units, the same units the fingerprint hashes
    let character_count = content
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.len_utf16() as u64)
        .sum();
    let word_count = words(content).len() as u64;

    let sentence_count = SENTENCE_END
        .split(content)
        .filter(|s| !s.trim().is_empty())
        .count() as u64;

    let paragraphs: Vec<&str> = BLANK_LINE
        .split(content)
        .filter(|p| !p.trim().is_empty())
        .collect();

    let mut longest_words: Vec<String> = Vec::new();
    for paragraph in &paragraphs {
        let paragraph_words = words(paragraph);
        let Some(max_len) = paragraph_words.iter().map(|w| w.chars().count()).max() else {
            continue;
        };
        for word in paragraph_words {
            if word.chars().count() == max_len && !longest_words.contains(&word) {
                longest_words.push(word);
            }
        }
    }

    Analysis {
        word_count,
        character_count,
        sentence_count,
        paragraph_count: paragraphs.len() as u64,
        longest_words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(analyze(""), Analysis::default());
        assert_eq!(analyze("   \n\n\t "), Analysis::default());
    }

    #[test]
    fn test_quick_brown_fox() {
        let analysis =
            analyze("The quick brown fox jumps over the lazy dog. The lazy dog slept in the sun.");
        assert_eq!(analysis.word_count, 16);
        assert_eq!(analysis.character_count, 60);
        assert_eq!(analysis.sentence_count, 2);
        assert_eq!(analysis.paragraph_count, 1);
        assert_eq!(analysis.longest_words, vec!["quick", "brown", "jumps", "slept"]);
    }

    #[test]
    fn test_paragraphs_and_longest_words() {
        let text = "Short words here.\n\nAnother paragraph!\n  \nTiny one?";
        let analysis = analyze(text);
        assert_eq!(analysis.paragraph_count, 3);
        assert_eq!(analysis.sentence_count, 3);
        assert_eq!(analysis.longest_words, vec!["short", "words", "paragraph", "tiny"]);
    }

    #[test]
    fn test_longest_words_deduplicated_case_insensitive() {
        let analysis = analyze("Hello hello HELLO\n\nhello world");
        assert_eq!(analysis.longest_words, vec!["hello", "world"]);
    }

    #[test]
    fn test_punctuation_only_word_is_dropped() {
        let analysis = analyze("wait -- what");
        assert_eq!(analysis.word_count, 2);
        assert_eq!(analysis.character_count, 10);
    }

    #[test]
    fn test_character_count_uses_utf16_units() {
        assert_eq!(analyze("a😀").character_count, 3);
        assert_eq!(analyze("café au lait").character_count, 10);
    }

    #[test]
    fn test_field_names() {
        let names: Vec<&str> = AnalysisField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec!["wordCount", "characterCount", "sentenceCount", "paragraphCount", "longestWords"]
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(analyze("One two.")).unwrap();
        assert_eq!(json["wordCount"], 2);
        assert_eq!(json["longestWords"][0], "one");
    }
}
