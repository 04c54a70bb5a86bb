use crate::{Browser, Page, ViewportSize};
use eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageCall {
    Open,
    SetViewport(ViewportSize),
    Goto(String),
    ScrollHeight(u64),
    ScrollTo(u64),
    Screenshot { path: PathBuf, full_page: bool },
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    NewPage,
    SetViewport,
    Goto,
    ScrollHeight,
    ScrollTo,
    Screenshot,
    Close,
}

/// An in-process browser that replays scripted scroll heights and journals every call.
///
/// Screenshots are written as the bare PNG signature so callers can check file layout
/// without a real renderer.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBrowser {
    heights: Vec<u64>,
    fail_step: Option<Step>,
    fail_url: Option<String>,
    journal: Arc<Mutex<Vec<PageCall>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successive `scroll_height` readings for every page; the last one repeats.
    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights;
        self
    }

    /// Fail `step` on every page.
    pub fn failing(mut self, step: Step) -> Self {
        self.fail_step = Some(step);
        self
    }

    /// Fail navigation to any URL containing `fragment`.
    pub fn failing_url(mut self, fragment: impl Into<String>) -> Self {
        self.fail_url = Some(fragment.into());
        self
    }

    pub fn calls(&self) -> Vec<PageCall> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check(&self, step: Step) -> Result<()> {
        if self.fail_step == Some(step) {
            eyre::bail!("scripted failure at {:?}", step);
        }
        Ok(())
    }

    fn record(&self, call: PageCall) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(call);
        }
    }
}

impl Browser for ScriptedBrowser {
    type Page = ScriptedPage;

    async fn new_page(&self) -> Result<ScriptedPage> {
        self.check(Step::NewPage)?;
        self.record(PageCall::Open);
        Ok(ScriptedPage {
            browser: self.clone(),
            reads: 0,
        })
    }

    async fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct ScriptedPage {
    browser: ScriptedBrowser,
    reads: usize,
}

impl Page for ScriptedPage {
    async fn set_viewport(&mut self, size: ViewportSize) -> Result<()> {
        self.browser.check(Step::SetViewport)?;
        self.browser.record(PageCall::SetViewport(size));
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        self.browser.check(Step::Goto)?;
        self.browser.record(PageCall::Goto(url.to_owned()));
        if let Some(fragment) = &self.browser.fail_url {
            if url.contains(fragment.as_str()) {
                eyre::bail!("net::ERR_CONNECTION_REFUSED at {}", url);
            }
        }
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64> {
        self.browser.check(Step::ScrollHeight)?;
        let heights = &self.browser.heights;
        let height = heights
            .get(self.reads)
            .or_else(|| heights.last())
            .copied()
            .unwrap_or(0);
        self.reads += 1;
        self.browser.record(PageCall::ScrollHeight(height));
        Ok(height)
    }

    async fn scroll_to(&mut self, y: u64) -> Result<()> {
        self.browser.check(Step::ScrollTo)?;
        self.browser.record(PageCall::ScrollTo(y));
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
        self.browser.check(Step::Screenshot)?;
        tokio::fs::write(path, PNG_SIGNATURE).await?;
        self.browser.record(PageCall::Screenshot {
            path: path.to_path_buf(),
            full_page,
        });
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.browser.record(PageCall::Close);
        self.browser.check(Step::Close)
    }
}
