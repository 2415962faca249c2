//! Live preview scheduling.
//!
//! Every keystroke produces an [`EditorEvent`], rendering on each of them would make
//! typing sluggish on large documents. The [`PreviewScheduler`] applies the edits to
//! the [`Document`] immediately and re-renders once the input has been quiet for the
//! debounce delay:
//!
//! ```text
//! Idle --input--> Pending(deadline)
//! Pending --input--> Pending(new deadline)
//! Pending --deadline--> Idle + render
//! ```
//!
//! A UI theme change renders after a short delay regardless of the pending input, so
//! that the preview picks up the new highlight palette.

use crate::document::Document;
use crate::render::TextRenderer;
use crate::stats::DocumentStats;
use crate::theme::UiTheme;
use std::ops::Range;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// If a timer isn't active, it will be set to expire "never", which is actually just
/// 1 year in the future.
const NEVER: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The whole buffer was replaced, e.g. a file was loaded.
    Input(String),
    /// Text typed or pasted at a character position.
    Insert { at: usize, text: String },
    /// Tab key pressed with the given character selection.
    Tab { selection: Range<usize> },
}

/// Output of a completed render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPreview {
    pub html: String,
    pub stats: DocumentStats,
    pub theme: UiTheme,
    /// Incremented on every render, starting at 1.
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub debounce: Duration,
    pub theme_change_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            theme_change_delay: Duration::from_millis(100),
        }
    }
}

/// Sending half of the editor events, dropping every handle stops the scheduler.
#[derive(Debug, Clone)]
pub struct EditorHandle {
    sender: mpsc::UnboundedSender<EditorEvent>,
}

impl EditorHandle {
    /// Returns `false` if the scheduler is gone.
    pub fn send(&self, event: EditorEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn input(&self, text: impl Into<String>) -> bool {
        self.send(EditorEvent::Input(text.into()))
    }

    pub fn insert(&self, at: usize, text: impl Into<String>) -> bool {
        self.send(EditorEvent::Insert {
            at,
            text: text.into(),
        })
    }

    pub fn tab(&self, selection: Range<usize>) -> bool {
        self.send(EditorEvent::Tab { selection })
    }
}

pub struct PreviewScheduler<R> {
    document: Document,
    renderer: R,
    theme: watch::Receiver<UiTheme>,
    event_recv: mpsc::UnboundedReceiver<EditorEvent>,
    preview_sender: mpsc::UnboundedSender<RenderedPreview>,
    config: SchedulerConfig,
    revision: u64,
}

impl<R: TextRenderer> PreviewScheduler<R> {
    pub fn new(
        document: Document,
        renderer: R,
        theme: watch::Receiver<UiTheme>,
        config: SchedulerConfig,
    ) -> (Self, EditorHandle, mpsc::UnboundedReceiver<RenderedPreview>) {
        let (event_sender, event_recv) = mpsc::unbounded_channel();
        let (preview_sender, preview_recv) = mpsc::unbounded_channel();

        let scheduler = Self {
            document,
            renderer,
            theme,
            event_recv,
            preview_sender,
            config,
            revision: 0,
        };

        (
            scheduler,
            EditorHandle {
                sender: event_sender,
            },
            preview_recv,
        )
    }

    fn apply(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::Input(text) => self.document.replace(text),
            EditorEvent::Insert { at, text } => {
                self.document.insert(at, &text);
            }
            EditorEvent::Tab { selection } => {
                self.document.insert_tab(selection);
            }
        }
    }

    /// Returns `false` once nobody listens to the previews anymore.
    fn render(&mut self) -> bool {
        let now = Instant::now();
        let theme = *self.theme.borrow_and_update();
        let html = self.renderer.render_text(self.document.text());
        let stats = self.renderer.calculate_text_stats(self.document.text());
        self.revision += 1;

        tracing::debug!(
            revision = self.revision,
            %theme,
            elapsed_ms = now.elapsed().as_millis() as u64,
            "Rendered preview"
        );

        self.preview_sender
            .send(RenderedPreview {
                html,
                stats,
                theme,
                revision: self.revision,
            })
            .is_ok()
    }

    /// Runs until every [`EditorHandle`] is dropped, then returns the final document.
    ///
    /// The document is rendered once on start, an edit still waiting for its debounce
    /// deadline when the handles go away is rendered before returning.
    pub async fn run(mut self) -> Document {
        if !self.render() {
            return self.document;
        }

        let debounce = self.config.debounce;
        let theme_change_delay = self.config.theme_change_delay;

        let mut input_dirty = false;
        let input_timer = tokio::time::sleep(NEVER);
        tokio::pin!(input_timer);

        let mut theme_dirty = false;
        let theme_timer = tokio::time::sleep(NEVER);
        tokio::pin!(theme_timer);

        let mut theme_open = true;

        loop {
            tokio::select! {
                maybe_event = self.event_recv.recv() => {
                    match maybe_event {
                        Some(event) => {
                            tracing::trace!(?event, "Received editor event");
                            self.apply(event);
                            input_dirty = true;
                            input_timer.as_mut().reset(Instant::now() + debounce);
                        }
                        None => {
                            if (input_dirty || theme_dirty) && !self.render() {
                                tracing::debug!("Preview receiver dropped");
                            }
                            break;
                        }
                    }
                }
                changed = self.theme.changed(), if theme_open => {
                    match changed {
                        Ok(()) => {
                            theme_dirty = true;
                            theme_timer.as_mut().reset(Instant::now() + theme_change_delay);
                        }
                        Err(_) => theme_open = false,
                    }
                }
                _ = theme_timer.as_mut(), if theme_dirty => {
                    theme_dirty = false;
                    theme_timer.as_mut().reset(Instant::now() + NEVER);

                    // The forced render covers any pending edit as well.
                    input_dirty = false;
                    input_timer.as_mut().reset(Instant::now() + NEVER);

                    if !self.render() {
                        break;
                    }
                }
                _ = input_timer.as_mut(), if input_dirty => {
                    input_dirty = false;
                    input_timer.as_mut().reset(Instant::now() + NEVER);

                    if !self.render() {
                        break;
                    }
                }
            }
        }

        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MarkdownRenderer;
    use crate::theme::{MemoryThemeStore, ThemeManager};
    use std::sync::Arc;

    fn spawn_scheduler(
        text: &str,
        theme: watch::Receiver<UiTheme>,
    ) -> (
        tokio::task::JoinHandle<Document>,
        EditorHandle,
        mpsc::UnboundedReceiver<RenderedPreview>,
    ) {
        let (scheduler, handle, previews) = PreviewScheduler::new(
            Document::new(text),
            MarkdownRenderer::default(),
            theme,
            SchedulerConfig::default(),
        );
        (tokio::spawn(scheduler.run()), handle, previews)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_renders_once_after_quiet_period() {
        let (_theme_tx, theme_rx) = watch::channel(UiTheme::Dark);
        let (task, handle, mut previews) = spawn_scheduler("", theme_rx);

        let initial = previews.recv().await.unwrap();
        assert_eq!(initial.revision, 1);
        assert_eq!(initial.html, "");

        let start = Instant::now();
        let mut text = String::new();
        for i in 0..10 {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            text.push('a');
            assert!(handle.input(text.clone()));
            assert!(previews.try_recv().is_err());
        }

        let preview = previews.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1050), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "{elapsed:?}");
        assert_eq!(preview.revision, 2);
        assert_eq!(preview.html, "<p>aaaaaaaaaa</p>\n");
        assert_eq!(preview.stats.characters, 10);

        drop(handle);
        let document = task.await.unwrap();
        assert_eq!(document.text(), "aaaaaaaaaa");
        assert!(previews.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_goes_through_debounce() {
        let (_theme_tx, theme_rx) = watch::channel(UiTheme::Dark);
        let (task, handle, mut previews) = spawn_scheduler("- item", theme_rx);
        previews.recv().await.unwrap();

        handle.tab(0..0);
        handle.insert(100, "\n- next");

        let preview = previews.recv().await.unwrap();
        assert_eq!(preview.revision, 2);
        assert!(preview.html.contains("item"));
        assert!(preview.html.contains("next"));

        drop(handle);
        let document = task.await.unwrap();
        assert_eq!(document.text(), "  - item\n- next");
    }

    #[tokio::test(start_paused = true)]
    async fn test_theme_change_forces_render() {
        let manager = ThemeManager::new(Arc::new(MemoryThemeStore::default()));
        let (task, handle, mut previews) = spawn_scheduler("# Title", manager.subscribe());

        let initial = previews.recv().await.unwrap();
        assert_eq!(initial.theme, UiTheme::Dark);

        let start = Instant::now();
        manager.toggle().unwrap();

        let preview = previews.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(150), "{elapsed:?}");
        assert_eq!(preview.theme, UiTheme::Light);
        assert_eq!(preview.html, initial.html);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_edit_is_flushed_on_close() {
        let (_theme_tx, theme_rx) = watch::channel(UiTheme::Light);
        let (task, handle, mut previews) = spawn_scheduler("", theme_rx);
        previews.recv().await.unwrap();

        let start = Instant::now();
        handle.input("*last*");
        drop(handle);

        let preview = previews.recv().await.unwrap();
        assert_eq!(preview.html, "<p><em>last</em></p>\n");
        assert!(start.elapsed() < Duration::from_millis(150));

        task.await.unwrap();
        assert!(previews.recv().await.is_none());
    }
}
