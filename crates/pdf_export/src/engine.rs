//! Shared headless browser printing HTML documents to PDF.
//!
//! Starting Chrome takes a while, so a single browser process is launched on the
//! first export and shared by all the following ones, each export works in its own
//! tab. The process lives until [`PdfEngine::shutdown`] is called on termination.

use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use mdpress_config::EngineConfig;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const MM_PER_INCH: f64 = 25.4;

/// Switches required to run Chrome inside containers.
const DEFAULT_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
];

/// Resolves once the web fonts are loaded and every image has either loaded or failed.
const WAIT_FOR_ASSETS: &str = r#"(async () => {
  await document.fonts.ready;
  const pending = Array.from(document.images)
    .filter((img) => !img.complete)
    .map((img) => new Promise((resolve) => { img.onload = img.onerror = resolve; }));
  await Promise.all(pending);
  return true;
})()"#;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("failed to launch the browser: {0}")]
    Launch(String),
    /// The browser could not open a tab, it is likely dead.
    #[error("failed to open a browser tab: {0}")]
    Tab(String),
    #[error("failed to print the document: {0}")]
    Print(String),
    #[error("rendering timed out after {0:?}")]
    Timeout(Duration),
    #[error("the render engine is shut down")]
    ShutDown,
}

/// Page geometry, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageOptions {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin: f64,
    pub print_background: bool,
}

impl PageOptions {
    /// A4 portrait with even margins.
    pub fn a4(margin_mm: f64) -> Self {
        Self {
            paper_width: 8.27,
            paper_height: 11.69,
            margin: margin_mm / MM_PER_INCH,
            print_background: true,
        }
    }

    fn to_print_options(self) -> PrintToPdfOptions {
        PrintToPdfOptions {
            landscape: Some(false),
            display_header_footer: Some(false),
            print_background: Some(self.print_background),
            scale: Some(1.0),
            paper_width: Some(self.paper_width),
            paper_height: Some(self.paper_height),
            margin_top: Some(self.margin),
            margin_bottom: Some(self.margin),
            margin_left: Some(self.margin),
            margin_right: Some(self.margin),
            prefer_css_page_size: Some(false),
            ..Default::default()
        }
    }
}

impl Default for PageOptions {
    fn default() -> Self {
        Self::a4(20.0)
    }
}

/// Starts a browser. Called from a blocking thread.
pub trait Launcher: Send + Sync + 'static {
    type Browser: PdfBrowser;

    fn launch(&self) -> Result<Self::Browser, EngineError>;
}

/// A running browser. Called from blocking threads, possibly concurrently.
pub trait PdfBrowser: Send + Sync + 'static {
    fn print_pdf(&self, html: &str, page: &PageOptions) -> Result<Vec<u8>, EngineError>;
}

/// Object safe face of [`RenderEngine`].
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn render_to_pdf(&self, html: String, page: PageOptions) -> Result<Vec<u8>, EngineError>;

    /// Closes the browser. Returns `false` if there was nothing to close.
    async fn shutdown(&self) -> bool;
}

pub struct RenderEngine<L: Launcher> {
    launcher: Arc<L>,
    browser: Mutex<Option<Arc<L::Browser>>>,
    render_timeout: Duration,
    launches: AtomicUsize,
    closed: AtomicBool,
}

impl<L: Launcher> RenderEngine<L> {
    pub fn new(launcher: L, render_timeout: Duration) -> Self {
        Self {
            launcher: Arc::new(launcher),
            browser: Mutex::new(None),
            render_timeout,
            launches: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of browser processes launched so far.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }

    /// Returns the shared browser, launching it if needed.
    ///
    /// Concurrent callers wait for the same launch.
    pub async fn acquire(&self) -> Result<Arc<L::Browser>, EngineError> {
        let mut slot = self.browser.lock().await;

        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::ShutDown);
        }

        if let Some(browser) = slot.as_ref() {
            return Ok(browser.clone());
        }

        let now = Instant::now();
        let launcher = self.launcher.clone();
        let browser = tokio::task::spawn_blocking(move || launcher.launch())
            .await
            .map_err(|err| EngineError::Launch(err.to_string()))??;
        let browser = Arc::new(browser);

        self.launches.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            elapsed_ms = now.elapsed().as_millis() as u64,
            "Launched headless browser"
        );

        slot.replace(browser.clone());

        Ok(browser)
    }

    /// Forgets `browser` if it is still the shared one, the next export relaunches.
    async fn invalidate(&self, browser: &Arc<L::Browser>) {
        let mut slot = self.browser.lock().await;
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, browser)) {
            tracing::warn!("Discarding the headless browser");
            slot.take();
        }
    }

    async fn print(
        &self,
        browser: &Arc<L::Browser>,
        html: &Arc<str>,
        page: PageOptions,
    ) -> Result<Vec<u8>, EngineError> {
        let task = tokio::task::spawn_blocking({
            let browser = browser.clone();
            let html = html.clone();
            move || browser.print_pdf(&html, &page)
        });

        match tokio::time::timeout(self.render_timeout, task).await {
            Ok(Ok(res)) => res,
            Ok(Err(join_error)) => Err(EngineError::Print(join_error.to_string())),
            Err(_elapsed) => Err(EngineError::Timeout(self.render_timeout)),
        }
    }
}

#[async_trait]
impl<L: Launcher> PdfEngine for RenderEngine<L> {
    /// A browser that can no longer open tabs is relaunched and the print retried once.
    async fn render_to_pdf(&self, html: String, page: PageOptions) -> Result<Vec<u8>, EngineError> {
        let html: Arc<str> = html.into();
        let browser = self.acquire().await?;

        match self.print(&browser, &html, page).await {
            Err(EngineError::Tab(err)) => {
                tracing::warn!(%err, "Browser tab failed, relaunching the browser");
                self.invalidate(&browser).await;

                let browser = self.acquire().await?;
                let res = self.print(&browser, &html, page).await;
                if matches!(res, Err(EngineError::Tab(_))) {
                    self.invalidate(&browser).await;
                }
                res
            }
            res => res,
        }
    }

    async fn shutdown(&self) -> bool {
        let mut slot = self.browser.lock().await;
        self.closed.store(true, Ordering::SeqCst);
        let Some(browser) = slot.take() else {
            return false;
        };
        drop(slot);

        let in_flight = Arc::strong_count(&browser) - 1;
        if in_flight > 0 {
            tracing::warn!(
                in_flight,
                "Headless browser still used by pending renders, it closes once they finish"
            );
        } else {
            tracing::info!("Closing headless browser");
        }

        // Dropping the last handle kills and reaps the process.
        if let Err(err) = tokio::task::spawn_blocking(move || drop(browser)).await {
            tracing::error!(?err, "Failed to close the headless browser");
        }

        true
    }
}

/// Launches the local Chrome/Chromium.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    executable_path: Option<PathBuf>,
    idle_timeout: Duration,
    args: Vec<OsString>,
}

impl ChromeLauncher {
    pub fn new(executable_path: Option<PathBuf>, idle_timeout: Duration) -> Self {
        Self {
            executable_path,
            idle_timeout,
            args: DEFAULT_ARGS.iter().map(OsString::from).collect(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut launcher = Self::new(config.executable_path(), config.idle_timeout());
        launcher
            .args
            .extend(config.extra_args.iter().map(OsString::from));
        launcher
    }
}

impl Launcher for ChromeLauncher {
    type Browser = ChromeBrowser;

    fn launch(&self) -> Result<Self::Browser, EngineError> {
        let args: Vec<&OsStr> = self.args.iter().map(OsString::as_os_str).collect();

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(self.executable_path.clone())
            .idle_browser_timeout(self.idle_timeout)
            .args(args)
            .build()
            .map_err(|err| EngineError::Launch(err.to_string()))?;

        let browser = Browser::new(options).map_err(|err| EngineError::Launch(format!("{err:#}")))?;

        Ok(ChromeBrowser { browser })
    }
}

pub struct ChromeBrowser {
    browser: Browser,
}

fn print_tab(tab: &Tab, url: &str, page: &PageOptions) -> Result<Vec<u8>, EngineError> {
    let print_err = |err: anyhow::Error| EngineError::Print(format!("{err:#}"));

    tab.navigate_to(url).map_err(print_err)?;
    tab.wait_until_navigated().map_err(print_err)?;
    tab.evaluate(WAIT_FOR_ASSETS, true).map_err(print_err)?;
    tab.print_to_pdf(Some(page.to_print_options()))
        .map_err(print_err)
}

impl PdfBrowser for ChromeBrowser {
    fn print_pdf(&self, html: &str, page: &PageOptions) -> Result<Vec<u8>, EngineError> {
        // Navigating to a file avoids the size limit of data URLs.
        let mut file = tempfile::Builder::new()
            .prefix("mdpress-")
            .suffix(".html")
            .tempfile()
            .map_err(|err| EngineError::Print(err.to_string()))?;
        file.write_all(html.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|err| EngineError::Print(err.to_string()))?;
        let url = format!("file://{}", file.path().display());

        let tab = self
            .browser
            .new_tab()
            .map_err(|err| EngineError::Tab(format!("{err:#}")))?;

        let res = print_tab(&tab, &url, page);

        if let Err(err) = tab.close(false) {
            tracing::debug!(?err, "Failed to close browser tab");
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLauncher;

    #[test]
    fn test_a4_page() {
        let page = PageOptions::default();
        assert!((page.margin - 0.787).abs() < 0.001);
        assert!(page.print_background);
        let options = page.to_print_options();
        assert_eq!(options.paper_width, Some(8.27));
        assert_eq!(options.margin_left, options.margin_top);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_launches_once() {
        let engine = Arc::new(RenderEngine::new(
            FakeLauncher::default().with_launch_delay(Duration::from_millis(50)),
            Duration::from_secs(5),
        ));

        let tasks = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.acquire().await.map(|_| ()) })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(engine.launches(), 1);
    }

    #[tokio::test]
    async fn test_render_and_shutdown() {
        let engine = RenderEngine::new(FakeLauncher::default(), Duration::from_secs(5));

        let pdf = engine
            .render_to_pdf("<p>hi</p>".into(), PageOptions::default())
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(engine.is_running().await);

        assert!(engine.shutdown().await);
        assert!(!engine.shutdown().await);
        assert!(!engine.is_running().await);
        assert_eq!(
            engine
                .render_to_pdf("<p>hi</p>".into(), PageOptions::default())
                .await,
            Err(EngineError::ShutDown)
        );
        assert_eq!(engine.launches(), 1);
    }

    #[tokio::test]
    async fn test_tab_failure_relaunches_browser() {
        let launcher = FakeLauncher::default();
        let failures = launcher.tab_failures();
        let engine = RenderEngine::new(launcher, Duration::from_secs(5));

        engine
            .render_to_pdf("x".into(), PageOptions::default())
            .await
            .unwrap();

        // The connection of the cached browser is gone.
        failures.store(1, Ordering::SeqCst);
        let pdf = engine
            .render_to_pdf("x".into(), PageOptions::default())
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(engine.is_running().await);
        assert_eq!(engine.launches(), 2);
    }

    #[tokio::test]
    async fn test_tab_failure_after_relaunch_discards_browser() {
        let launcher = FakeLauncher::default();
        let failures = launcher.tab_failures();
        let engine = RenderEngine::new(launcher, Duration::from_secs(5));

        failures.store(2, Ordering::SeqCst);
        let err = engine
            .render_to_pdf("x".into(), PageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Tab(_)));
        assert!(!engine.is_running().await);
        assert_eq!(engine.launches(), 2);

        engine
            .render_to_pdf("x".into(), PageOptions::default())
            .await
            .unwrap();
        assert_eq!(engine.launches(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_closes_browser_after_pending_render() {
        let launcher = FakeLauncher::default();
        let closed = launcher.closed();
        let engine = RenderEngine::new(launcher, Duration::from_secs(5));

        let pending = engine.acquire().await.unwrap();
        assert!(engine.shutdown().await);
        assert_eq!(closed.load(Ordering::SeqCst), 0);

        drop(pending);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_browser() {
        let launcher = FakeLauncher::default();
        let closed = launcher.closed();
        let engine = RenderEngine::new(launcher, Duration::from_secs(5));

        engine.acquire().await.unwrap();
        assert!(engine.shutdown().await);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_print_failure_keeps_browser() {
        let engine = RenderEngine::new(FakeLauncher::default(), Duration::from_secs(5));

        let err = engine
            .render_to_pdf(crate::testing::FAIL_MARKER.into(), PageOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Print(_)));
        assert!(engine.is_running().await);
        assert_eq!(engine.launches(), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let launcher = FakeLauncher::default().with_print_delay(Duration::from_millis(500));
        let engine = RenderEngine::new(launcher, Duration::from_millis(50));

        let err = engine
            .render_to_pdf("slow".into(), PageOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Timeout(Duration::from_millis(50)));
    }

    #[tokio::test]
    #[ignore = "requires a local Chrome installation"]
    async fn test_chrome_prints_pdf() {
        let launcher = ChromeLauncher::from_config(&EngineConfig::default());
        let engine = RenderEngine::new(launcher, Duration::from_secs(60));
        let pdf = engine
            .render_to_pdf(
                "<!DOCTYPE html><html><body><h1>Hello</h1></body></html>".into(),
                PageOptions::default(),
            )
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(engine.shutdown().await);
    }
}
