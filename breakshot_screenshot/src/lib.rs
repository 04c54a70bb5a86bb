pub mod config;
pub mod output;
pub mod screenshot;
pub mod scroll;
pub mod types;
pub mod viewport;

pub use config::{Config, ConfigError};
pub use output::OutputPlan;
pub use screenshot::{capture_all, capture_screenshot, run, run_with_browser};
pub use types::{CaptureFailure, CaptureMode, CaptureReport, SavedCapture};
pub use viewport::{Viewport, ViewportSet};
