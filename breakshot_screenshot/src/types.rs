use crate::viewport::Viewport;
use breakshot_browser::ViewportSize;
use serde::Serialize;
use std::path::PathBuf;

/// Browser window size and capture mode for one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureMode {
    pub size: ViewportSize,
    pub full_page: bool,
}

impl CaptureMode {
    /// A height limit wins over the viewport's own height; with neither, the page is
    /// laid out at `LAYOUT_HEIGHT` and captured full-page.
    pub fn for_viewport(viewport: &Viewport, height_limit: Option<u32>) -> Self {
        match (height_limit, viewport.height) {
            (Some(limit), _) => Self {
                size: ViewportSize::new(viewport.width, limit),
                full_page: false,
            },
            (None, Some(height)) => Self {
                size: ViewportSize::new(viewport.width, height),
                full_page: false,
            },
            (None, None) => Self {
                size: ViewportSize::new(viewport.width, crate::viewport::LAYOUT_HEIGHT),
                full_page: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedCapture {
    pub url: String,
    pub viewport: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureFailure {
    pub url: String,
    pub viewport: String,
    pub error: String,
}

/// Outcome of a whole run. Failed captures do not fail the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub saved: Vec<SavedCapture>,
    pub failed: Vec<CaptureFailure>,
}

impl CaptureReport {
    pub fn total(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}
