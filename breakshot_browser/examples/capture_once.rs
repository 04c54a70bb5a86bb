use breakshot_browser::chromium::{Browser as ChromiumBrowser, LaunchOptions};
use breakshot_browser::{Browser, Page, ViewportSize};
use eyre::Result;
use std::path::PathBuf;

// cargo run -p breakshot_browser --example capture_once -- https://example.com out.png
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "https://example.com".to_string());
    let output = PathBuf::from(args.next().unwrap_or_else(|| "capture_once.png".to_string()));

    let browser = ChromiumBrowser::launch(LaunchOptions::from_env()).await?;
    let mut page = browser.new_page().await?;
    page.set_viewport(ViewportSize::new(1024, 800)).await?;
    page.goto(&url).await?;
    let height = page.scroll_height().await?;
    page.screenshot(&output, true).await?;
    page.close().await?;
    browser.close().await?;

    println!("Captured {} ({}px tall) to {}", url, height, output.display());
    Ok(())
}
