//! Markdown document renderer implementation.
//!
//! This module provides the [`MarkdownRenderer`] which implements the
//! [`TextRenderer`] trait consumed by the preview scheduler and the PDF export.

use super::{to_html, RenderOptions};
use crate::stats::{calculate_document_stats, DocumentStats};

/// Trait for text-based document renderers.
pub trait TextRenderer: Send + Sync {
    /// Render text content to an HTML fragment.
    fn render_text(&self, content: &str) -> String;

    /// Calculate statistics from text content.
    fn calculate_text_stats(&self, content: &str) -> DocumentStats {
        calculate_document_stats(content)
    }
}

/// Markdown document renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer with the given options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }
}

impl TextRenderer for MarkdownRenderer {
    fn render_text(&self, content: &str) -> String {
        let html = to_html(content, &self.options);
        tracing::trace!(
            markdown_len = content.len(),
            html_len = html.len(),
            "Rendered markdown"
        );
        html
    }
}
