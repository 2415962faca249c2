//! Document statistics shown next to the editor.

use serde::{Deserialize, Serialize};

/// Derived metrics of a markdown buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Number of characters, whitespace included.
    pub characters: usize,
    /// Number of whitespace separated words.
    pub words: usize,
    /// Number of lines.
    pub lines: usize,
    /// Estimated reading time in minutes (based on 200 words per minute).
    pub reading_minutes: usize,
}

impl DocumentStats {
    /// Status line text, e.g. `42 chars · 7 words`.
    pub fn summary(&self) -> String {
        format!("{} chars · {} words", self.characters, self.words)
    }
}

/// Calculate document statistics from markdown content.
///
/// # Example
///
/// ```
/// use mdpress_core::stats::calculate_document_stats;
///
/// let stats = calculate_document_stats("Hello world!\n\nThis is a test.");
/// assert_eq!(stats.words, 6);
/// assert_eq!(stats.characters, 29);
/// ```
pub fn calculate_document_stats(content: &str) -> DocumentStats {
    let words = content.split_whitespace().count();

    DocumentStats {
        characters: content.chars().count(),
        words,
        lines: content.lines().count(),
        reading_minutes: words.div_ceil(200),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats() {
        let stats = calculate_document_stats("Hello world!\n\nThis is a test.");

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.words, 6);
        assert_eq!(stats.characters, 29);
        assert_eq!(stats.summary(), "29 chars · 6 words");
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(calculate_document_stats(""), DocumentStats::default());

        let blank = calculate_document_stats("  \n\t ");
        assert_eq!(blank.words, 0);
        assert_eq!(blank.characters, 5);
    }

    #[test]
    fn test_characters_are_not_bytes() {
        let stats = calculate_document_stats("héllo wörld");
        assert_eq!(stats.characters, 11);
        assert_eq!(stats.words, 2);
    }

    #[test]
    fn test_reading_time_longer() {
        // 450 words should be ~3 minutes (450/200 = 2.25, rounded up)
        let content = vec!["word"; 450].join(" ");
        let stats = calculate_document_stats(&content);

        assert_eq!(stats.reading_minutes, 3);
    }
}
