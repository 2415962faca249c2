use anyhow::{bail, Result};
use clap::Parser;
use mdpress_config::Config;
use mdpress_core::Document;
use pdf_export::{ExportRequest, Exporter, PdfArtifact};
use std::future::Future;
use std::path::PathBuf;

/// Exports a markdown file to PDF with the headless browser.
#[derive(Parser, Debug, Clone)]
pub struct Export {
    /// Markdown file (.md, .markdown or .txt).
    file: PathBuf,

    /// PDF theme, see `mdpress themes`.
    #[clap(long)]
    theme: Option<String>,

    /// Document title, also used for the file name.
    #[clap(long)]
    title: Option<String>,

    /// Output path, defaults to the file name derived from the input in the current directory.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl Export {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let document = Document::load(&self.file)?;

        let exporter = Exporter::with_chrome(config);
        let request = ExportRequest {
            markdown: document.text().to_string(),
            filename: document.name().map(ToString::to_string),
            theme: self.theme.clone(),
            title: self.title.clone(),
        };

        let Some(artifact) =
            export_until(&exporter, request, mdpress_server::shutdown_signal()).await?
        else {
            bail!("Export interrupted");
        };

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&artifact.filename));
        std::fs::write(&output, &artifact.bytes)?;

        println!(
            "Wrote {} ({} bytes, theme {})",
            output.display(),
            artifact.bytes.len(),
            artifact.theme
        );

        Ok(())
    }
}

/// Exports `request` unless `stop` resolves first, the engine is shut down either way.
async fn export_until(
    exporter: &Exporter,
    request: ExportRequest,
    stop: impl Future<Output = ()>,
) -> Result<Option<PdfArtifact>> {
    let res = tokio::select! {
        res = exporter.export(request) => Some(res),
        () = stop => None,
    };

    exporter.engine().shutdown().await;

    Ok(res.transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_export::testing::FakeLauncher;
    use pdf_export::{EngineError, ExportSettings, PageOptions, RenderEngine};
    use std::sync::Arc;
    use std::time::Duration;

    fn fake_exporter(print_delay: Duration) -> Exporter {
        let launcher = FakeLauncher::default().with_print_delay(print_delay);
        let engine = RenderEngine::new(launcher, Duration::from_secs(5));
        Exporter::new(Arc::new(engine), ExportSettings::default())
    }

    async fn engine_is_shut_down(exporter: &Exporter) -> bool {
        exporter
            .engine()
            .render_to_pdf(String::new(), PageOptions::default())
            .await
            == Err(EngineError::ShutDown)
    }

    #[tokio::test]
    async fn test_export_shuts_engine_down() {
        let exporter = fake_exporter(Duration::ZERO);
        let artifact = export_until(&exporter, ExportRequest::new("# Hi"), std::future::pending())
            .await
            .unwrap()
            .unwrap();
        assert!(artifact.bytes.starts_with(b"%PDF-"));
        assert!(engine_is_shut_down(&exporter).await);
    }

    #[tokio::test]
    async fn test_interrupted_export_shuts_engine_down() {
        let exporter = fake_exporter(Duration::from_millis(200));
        let res = export_until(
            &exporter,
            ExportRequest::new("# Hi"),
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await
        .unwrap();
        assert!(res.is_none());
        assert!(engine_is_shut_down(&exporter).await);
    }
}
