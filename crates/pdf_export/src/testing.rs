//! In-process stand-in for the browser, for tests that should not need Chrome.

use crate::engine::{EngineError, Launcher, PageOptions, PdfBrowser};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Documents containing this text fail to print.
pub const FAIL_MARKER: &str = "<!-- fail-print -->";

#[derive(Debug, Default, Clone)]
pub struct FakeLauncher {
    launch_delay: Duration,
    print_delay: Duration,
    tab_failures: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    pub fn with_print_delay(mut self, delay: Duration) -> Self {
        self.print_delay = delay;
        self
    }

    /// Number of upcoming tab openings that fail, shared by every launched browser.
    pub fn tab_failures(&self) -> Arc<AtomicUsize> {
        self.tab_failures.clone()
    }

    /// Number of launched browsers that have been closed.
    pub fn closed(&self) -> Arc<AtomicUsize> {
        self.closed.clone()
    }
}

impl Launcher for FakeLauncher {
    type Browser = FakeBrowser;

    fn launch(&self) -> Result<Self::Browser, EngineError> {
        if !self.launch_delay.is_zero() {
            std::thread::sleep(self.launch_delay);
        }
        Ok(FakeBrowser {
            print_delay: self.print_delay,
            tab_failures: self.tab_failures.clone(),
            closed: self.closed.clone(),
        })
    }
}

#[derive(Debug)]
pub struct FakeBrowser {
    print_delay: Duration,
    tab_failures: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl Drop for FakeBrowser {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl PdfBrowser for FakeBrowser {
    fn print_pdf(&self, html: &str, page: &PageOptions) -> Result<Vec<u8>, EngineError> {
        let failing_tab = self
            .tab_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing_tab {
            return Err(EngineError::Tab("browser connection closed".into()));
        }

        if !self.print_delay.is_zero() {
            std::thread::sleep(self.print_delay);
        }

        if html.contains(FAIL_MARKER) {
            return Err(EngineError::Print("page crashed".into()));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.extend_from_slice(
            format!(
                "% {}x{}in, {} bytes of html\n%%EOF\n",
                page.paper_width,
                page.paper_height,
                html.len()
            )
            .as_bytes(),
        );
        Ok(pdf)
    }
}
