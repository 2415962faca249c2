//! Core library of mdpress.
//!
//! This crate provides the pieces shared by the live preview and the PDF export:
//! rendering markdown to HTML, scheduling preview renders while the user types,
//! and the UI theme state.
//!
//! # Modules
//!
//! - [`render`] - Markdown to HTML conversion with GitHub-style features
//! - [`scheduler`] - Debounced preview rendering
//! - [`theme`] - Light/dark UI theme, persisted locally
//! - [`document`] - The edited buffer
//! - [`stats`] - Document statistics calculation
//! - [`page`] - Standalone preview page
//! - [`watcher`] - File watching abstraction

pub mod document;
pub mod page;
pub mod render;
pub mod scheduler;
pub mod stats;
pub mod theme;
pub mod watcher;

// Re-export commonly used types at crate root
pub use document::{Document, DocumentError};
pub use render::{escape_html, to_html, MarkdownRenderer, RenderOptions, TextRenderer};
pub use scheduler::{EditorEvent, EditorHandle, PreviewScheduler, RenderedPreview, SchedulerConfig};
pub use stats::{calculate_document_stats, DocumentStats};
pub use theme::{FileThemeStore, MemoryThemeStore, ThemeManager, ThemeStore, UiTheme};
pub use watcher::{FileWatcher, WatchEvent};
