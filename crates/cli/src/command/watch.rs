use anyhow::{Context, Result};
use clap::Parser;
use mdpress_config::Config;
use mdpress_core::page::preview_page;
use mdpress_core::render::highlight_stylesheet;
use mdpress_core::{
    Document, FileThemeStore, FileWatcher, MarkdownRenderer, PreviewScheduler, SchedulerConfig,
    ThemeManager, WatchEvent,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Re-renders a preview page whenever the markdown file is saved.
///
/// The page follows the UI theme, `mdpress theme toggle` from another terminal
/// re-renders it with the other palette.
#[derive(Parser, Debug, Clone)]
pub struct Watch {
    /// Markdown file (.md, .markdown or .txt).
    file: PathBuf,

    /// HTML page to write.
    #[clap(short, long)]
    output: PathBuf,
}

impl Watch {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let document = Document::load(&self.file)?;
        let title = document.name().unwrap_or("Preview").to_string();

        let store = Arc::new(FileThemeStore::in_state_dir()?);
        let state_file = store.path().to_path_buf();
        let themes = ThemeManager::new(store);

        let (scheduler, editor, mut previews) = PreviewScheduler::new(
            document,
            MarkdownRenderer::default(),
            themes.subscribe(),
            SchedulerConfig {
                debounce: config.preview.debounce(),
                theme_change_delay: config.preview.theme_change_delay(),
            },
        );
        let scheduler = tokio::spawn(scheduler.run());

        let (_file_watcher, mut file_events) = FileWatcher::new(&self.file)
            .with_context(|| format!("failed to watch {}", self.file.display()))?;
        let (_state_watcher, mut state_events) = FileWatcher::new(&state_file)
            .with_context(|| format!("failed to watch {}", state_file.display()))?;

        println!(
            "Watching {}, preview at {}",
            self.file.display(),
            self.output.display()
        );

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                Some(event) = file_events.recv() => match event {
                    WatchEvent::Changed(path) => match Document::load(&path) {
                        Ok(document) => {
                            editor.input(document.text());
                        }
                        Err(err) => tracing::warn!(?err, ?path, "Failed to reload the document"),
                    },
                    WatchEvent::Removed(path) => {
                        tracing::warn!(?path, "Watched file removed, waiting for it to come back");
                    }
                },
                Some(_) = state_events.recv() => {
                    if let Err(err) = themes.reload() {
                        tracing::warn!(?err, "Failed to reload the UI theme");
                    }
                }
                Some(preview) = previews.recv() => {
                    let stylesheet = highlight_stylesheet(preview.theme.highlight_theme());
                    std::fs::write(&self.output, preview_page(&title, &preview, &stylesheet))?;
                    println!(
                        "[{}] {} ({} theme)",
                        preview.revision,
                        preview.stats.summary(),
                        preview.theme
                    );
                }
                _ = &mut ctrl_c => break,
            }
        }

        drop(editor);
        scheduler.await?;

        Ok(())
    }
}
