use crate::config::Config;
use crate::output::OutputPlan;
use crate::scroll::auto_scroll;
use crate::types::{CaptureFailure, CaptureMode, CaptureReport, SavedCapture};
use crate::viewport::ViewportSet;
use breakshot_browser::chromium::{Browser as ChromiumBrowser, LaunchOptions};
use breakshot_browser::{Browser, Page};
use eyre::{Result, WrapErr};
use std::path::Path;
use std::time::Duration;

/// Resolve viewports and output layout, launch Chromium and capture every page.
pub async fn run(config: &Config) -> Result<CaptureReport> {
    let viewports = ViewportSet::resolve(&config.viewports, &config.custom_resolutions);
    let plan = OutputPlan::create(config)?;
    let browser = ChromiumBrowser::launch(LaunchOptions::from_env()).await?;
    run_with_browser(browser, config, &viewports, &plan).await
}

/// Capture every (path, viewport) pair with `browser`, then close it.
///
/// The browser is closed even when the run stops early.
pub async fn run_with_browser<B: Browser>(
    browser: B,
    config: &Config,
    viewports: &ViewportSet,
    plan: &OutputPlan,
) -> Result<CaptureReport> {
    let report = capture_all(&browser, config, viewports, plan).await;
    let closed = browser.close().await.wrap_err("failed to close browser");
    let report = report?;
    closed?;
    Ok(report)
}

/// Sequentially capture paths × viewports. Only output directory failures abort;
/// capture failures are logged and recorded.
pub async fn capture_all<B: Browser>(
    browser: &B,
    config: &Config,
    viewports: &ViewportSet,
    plan: &OutputPlan,
) -> Result<CaptureReport> {
    if viewports.is_empty() {
        tracing::warn!("No viewports selected, nothing to capture");
    }
    tracing::info!(
        "Capturing {} paths at {} viewports ({})",
        config.paths.len(),
        viewports.len(),
        viewports.names().join(", ")
    );

    let mut report = CaptureReport::default();
    for (i, path) in config.paths.iter().enumerate() {
        let url = config.url_for(path);
        for (name, viewport) in viewports.iter() {
            let output = plan.file_path(name, i + 1, path)?;
            let mode = CaptureMode::for_viewport(viewport, config.height_limit);
            tracing::debug!(
                "Capturing {} at {} ({}, full_page={})",
                url,
                name,
                mode.size,
                mode.full_page
            );

            match capture_screenshot(browser, &url, mode, &output, config).await {
                Ok(()) => {
                    tracing::info!("Screenshot saved: {}", output.display());
                    report.saved.push(SavedCapture {
                        url: url.clone(),
                        viewport: name.to_owned(),
                        path: output,
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to capture {} - {:#}", url, e);
                    report.failed.push(CaptureFailure {
                        url: url.clone(),
                        viewport: name.to_owned(),
                        error: format!("{:#}", e),
                    });
                }
            }
        }
    }
    Ok(report)
}

/// One page lifecycle: open, drive, close. The page is closed whatever the
/// outcome of the steps in between.
pub async fn capture_screenshot<B: Browser>(
    browser: &B,
    url: &str,
    mode: CaptureMode,
    output: &Path,
    config: &Config,
) -> Result<()> {
    let mut page = browser.new_page().await.wrap_err("failed to open page")?;
    let result = drive_page(
        &mut page,
        url,
        mode,
        output,
        config.timeout,
        config.max_scroll_rounds,
    )
    .await;
    let closed = page.close().await.wrap_err("failed to close page");
    match (result, closed) {
        (Ok(()), closed) => closed,
        (Err(e), Err(close_err)) => {
            tracing::warn!("{:#}", close_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
    }
}

async fn drive_page<P: Page>(
    page: &mut P,
    url: &str,
    mode: CaptureMode,
    output: &Path,
    delay: Duration,
    max_scroll_rounds: Option<u32>,
) -> Result<()> {
    page.set_viewport(mode.size)
        .await
        .wrap_err_with(|| format!("failed to set viewport {}", mode.size))?;
    page.goto(url).await?;
    let scrolled = auto_scroll(page, delay, max_scroll_rounds).await?;
    tracing::debug!(
        "Scrolled {} in {} rounds to {}px",
        url,
        scrolled.rounds,
        scrolled.height
    );
    tokio::time::sleep(delay).await;
    page.screenshot(output, mode.full_page).await
}
