use crate::catalog::{self, PdfTheme};
use crate::engine::{ChromeLauncher, EngineError, PageOptions, PdfEngine, RenderEngine};
use crate::filename::pdf_filename;
use crate::shell::document_shell;
use mdpress_config::Config;
use mdpress_core::{MarkdownRenderer, RenderOptions, TextRenderer};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Render(#[from] EngineError),
}

/// Only `markdown` is checked strictly, the optional fields ignore values that are not strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub markdown: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub theme: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        None | Some(Value::Null) => Ok(None),
        Some(other) => {
            tracing::debug!(value = %other, "Ignoring non-string export option");
            Ok(None)
        }
    }
}

impl ExportRequest {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub theme: &'static str,
}

#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Theme used when the request names none.
    pub default_theme: String,
    pub max_markdown_bytes: usize,
    pub page: PageOptions,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            default_theme: catalog::DEFAULT_THEME_ID.to_string(),
            max_markdown_bytes: 10 * 1024 * 1024,
            page: PageOptions::default(),
        }
    }
}

impl ExportSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_theme: config.export.default_theme.clone(),
            max_markdown_bytes: config.export.max_markdown_bytes,
            ..Default::default()
        }
    }
}

/// Turns markdown into a downloadable PDF.
pub struct Exporter {
    engine: Arc<dyn PdfEngine>,
    renderer: MarkdownRenderer,
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(engine: Arc<dyn PdfEngine>, settings: ExportSettings) -> Self {
        Self {
            engine,
            renderer: MarkdownRenderer::new(RenderOptions::gfm()),
            settings,
        }
    }

    /// Exporter printing with the local Chrome.
    pub fn with_chrome(config: &Config) -> Self {
        let engine = RenderEngine::new(
            ChromeLauncher::from_config(&config.engine),
            config.export.render_timeout(),
        );
        Self::new(Arc::new(engine), ExportSettings::from_config(config))
    }

    pub fn engine(&self) -> &Arc<dyn PdfEngine> {
        &self.engine
    }

    pub fn default_theme(&self) -> &'static PdfTheme {
        catalog::resolve(&self.settings.default_theme)
    }

    fn resolve_theme(&self, id: Option<&str>) -> &'static PdfTheme {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => catalog::find(id).unwrap_or_else(|| {
                tracing::debug!(theme = id, "Unknown PDF theme, using the default");
                self.default_theme()
            }),
            None => self.default_theme(),
        }
    }

    fn validate(&self, request: &ExportRequest) -> Result<(), ExportError> {
        if request.markdown.trim().is_empty() {
            return Err(ExportError::Validation(
                "Markdown content is required".to_string(),
            ));
        }
        if request.markdown.len() > self.settings.max_markdown_bytes {
            return Err(ExportError::Validation(format!(
                "Markdown content exceeds {} bytes",
                self.settings.max_markdown_bytes
            )));
        }
        Ok(())
    }

    /// Builds the styled HTML document of `request` without printing it.
    pub fn prepare(&self, request: &ExportRequest) -> Result<(String, &'static PdfTheme), ExportError> {
        self.validate(request)?;
        let theme = self.resolve_theme(request.theme.as_deref());
        let fragment = self.renderer.render_text(&request.markdown);
        let document = document_shell(&fragment, theme, request.title.as_deref());
        Ok((document, theme))
    }

    pub async fn export(&self, request: ExportRequest) -> Result<PdfArtifact, ExportError> {
        let now = Instant::now();

        let (document, theme) = self.prepare(&request)?;
        let filename = pdf_filename(request.filename.as_deref(), request.title.as_deref());

        let bytes = self
            .engine
            .render_to_pdf(document, self.settings.page)
            .await
            .map_err(|err| {
                tracing::error!(?err, theme = theme.id, %filename, "Failed to render PDF");
                err
            })?;

        tracing::info!(
            theme = theme.id,
            %filename,
            pdf_bytes = bytes.len(),
            elapsed_ms = now.elapsed().as_millis() as u64,
            "Generated PDF"
        );

        Ok(PdfArtifact {
            bytes,
            filename,
            theme: theme.id,
        })
    }
}
