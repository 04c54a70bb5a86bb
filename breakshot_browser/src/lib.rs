pub mod chromium;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;
use eyre::Result;
use std::fmt;
use std::path::Path;

/// Size of the virtual browser window, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ViewportSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A browser instance that hands out pages, one capture at a time.
pub trait Browser {
    type Page: Page;

    fn new_page(&self) -> impl Future<Output = Result<Self::Page>> + Send;

    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// A single tab. Callers own it for one capture and must `close` it afterwards.
pub trait Page: Send {
    fn set_viewport(&mut self, size: ViewportSize) -> impl Future<Output = Result<()>> + Send;

    /// Navigate and resolve once network activity is idle.
    fn goto(&mut self, url: &str) -> impl Future<Output = Result<()>> + Send;

    /// Current `document.body.scrollHeight`.
    fn scroll_height(&mut self) -> impl Future<Output = Result<u64>> + Send;

    fn scroll_to(&mut self, y: u64) -> impl Future<Output = Result<()>> + Send;

    /// Write a PNG to `path`. With `full_page` the whole scrollable area is captured,
    /// otherwise only the current viewport box.
    fn screenshot(&mut self, path: &Path, full_page: bool)
    -> impl Future<Output = Result<()>> + Send;

    fn close(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}
