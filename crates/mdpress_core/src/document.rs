//! The markdown buffer being edited.
//!
//! A [`Document`] is owned by a single editor session. Positions are expressed in
//! characters and clamped to the buffer, so stale cursor positions never panic.

use crate::stats::{calculate_document_stats, DocumentStats};
use std::ops::Range;
use std::path::Path;

/// Extensions accepted as markdown sources, lowercase.
pub const SOURCE_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Largest file [`Document::load`] accepts.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// What the Tab key inserts.
const TAB_INSERT: &str = "  ";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file type, expected one of .md, .markdown or .txt: {0}")]
    UnsupportedType(String),

    #[error("File too large ({size} bytes), maximum size is {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

/// Returns `name` without a trailing markdown/text extension (case-insensitive).
///
/// ```
/// use mdpress_core::document::strip_source_extension;
///
/// assert_eq!(strip_source_extension("notes.MD"), "notes");
/// assert_eq!(strip_source_extension("a.b.markdown"), "a.b");
/// assert_eq!(strip_source_extension("report.pdf"), "report.pdf");
/// ```
pub fn strip_source_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if is_source_extension(ext) => stem,
        _ => name,
    }
}

fn is_source_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    SOURCE_EXTENSIONS.iter().any(|e| *e == ext)
}

/// In-memory markdown buffer with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    name: Option<String>,
    /// Cursor position in characters.
    cursor: usize,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self {
            text,
            name: None,
            cursor,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name.replace(name.into());
        self
    }

    /// Reads a markdown file, rejecting unknown extensions and files over [`MAX_FILE_SIZE`].
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let has_source_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(is_source_extension)
            .unwrap_or(false);
        if !has_source_extension {
            return Err(DocumentError::UnsupportedType(file_name));
        }

        let size = std::fs::metadata(path)?.len();
        if size > MAX_FILE_SIZE {
            return Err(DocumentError::TooLarge {
                size,
                max: MAX_FILE_SIZE,
            });
        }

        let text = std::fs::read_to_string(path)?;

        Ok(Self::new(text).with_name(file_name))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn stats(&self) -> DocumentStats {
        calculate_document_stats(&self.text)
    }

    /// Replaces the whole buffer, the cursor moves to the end.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    /// Replaces the characters in `selection` with `insertion` and puts the cursor right
    /// after the inserted text. Returns the new cursor position.
    pub fn replace_range(&mut self, selection: Range<usize>, insertion: &str) -> usize {
        let start = selection.start.min(selection.end);
        let end = selection.end.max(selection.start);

        let start_byte = self.byte_offset(start);
        let end_byte = self.byte_offset(end);
        self.text.replace_range(start_byte..end_byte, insertion);

        self.cursor = self.text[..start_byte].chars().count() + insertion.chars().count();
        self.cursor
    }

    /// Inserts `text` at the character position `at`.
    pub fn insert(&mut self, at: usize, text: &str) -> usize {
        self.replace_range(at..at, text)
    }

    /// Tab key: two spaces replace the selection instead of moving the focus.
    pub fn insert_tab(&mut self, selection: Range<usize>) -> usize {
        self.replace_range(selection, TAB_INSERT)
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_tab_at_cursor() {
        let mut doc = Document::new("- item");
        let cursor = doc.insert_tab(0..0);
        assert_eq!(doc.text(), "  - item");
        assert_eq!(cursor, 2);
        assert_eq!(doc.cursor(), 2);
    }

    #[test]
    fn test_insert_tab_replaces_selection() {
        let mut doc = Document::new("héllo world");
        let cursor = doc.insert_tab(1..5);
        assert_eq!(doc.text(), "h   world");
        assert_eq!(cursor, 3);
    }

    #[test]
    fn test_out_of_range_positions_are_clamped() {
        let mut doc = Document::new("abc");
        doc.insert(100, "!");
        assert_eq!(doc.text(), "abc!");
        let cursor = doc.insert_tab(9..2);
        assert_eq!(doc.text(), "ab  ");
        assert_eq!(cursor, 4);
    }

    #[test]
    fn test_replace_updates_stats() {
        let mut doc = Document::default();
        assert_eq!(doc.stats().words, 0);
        doc.replace("two words");
        assert_eq!(doc.stats().words, 2);
        assert_eq!(doc.stats().characters, 9);
        assert_eq!(doc.cursor(), 9);
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();

        let md = dir.path().join("Notes.MD");
        std::fs::write(&md, "# Notes").unwrap();
        let doc = Document::load(&md).unwrap();
        assert_eq!(doc.text(), "# Notes");
        assert_eq!(doc.name(), Some("Notes.MD"));

        let png = dir.path().join("cat.png");
        std::fs::write(&png, [0u8; 4]).unwrap();
        assert!(matches!(
            Document::load(&png),
            Err(DocumentError::UnsupportedType(name)) if name == "cat.png"
        ));

        let big = dir.path().join("big.txt");
        std::fs::write(&big, vec![b'a'; MAX_FILE_SIZE as usize + 1]).unwrap();
        assert!(matches!(
            Document::load(&big),
            Err(DocumentError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_strip_source_extension() {
        assert_eq!(strip_source_extension("readme.txt"), "readme");
        assert_eq!(strip_source_extension("readme"), "readme");
        assert_eq!(strip_source_extension(".md"), "");
    }
}
