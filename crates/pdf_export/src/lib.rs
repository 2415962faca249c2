//! Markdown to PDF export.
//!
//! The markdown is rendered to HTML, wrapped in a document styled by a theme of the
//! [`catalog`], and printed by a shared headless Chrome managed by the [`engine`].

pub mod catalog;
pub mod engine;
pub mod filename;
pub mod pipeline;
pub mod shell;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use catalog::{PdfTheme, ThemeSummary, DEFAULT_THEME_ID};
pub use engine::{ChromeLauncher, EngineError, PageOptions, PdfEngine, RenderEngine};
pub use pipeline::{ExportError, ExportRequest, ExportSettings, Exporter, PdfArtifact};
