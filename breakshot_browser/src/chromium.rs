use crate::ViewportSize;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, EventLifecycleEvent};
use chromiumoxide::page::ScreenshotParams;
use eyre::{Result, WrapErr};
use futures::{Stream, StreamExt};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

const DEFAULT_NAV_TIMEOUT_SECS: u64 = 30;

/// Launch settings for the local Chromium, read from the environment.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    /// Explicit Chromium/Chrome executable; autodetected when unset.
    pub executable: Option<PathBuf>,
    /// Bounds each CDP request and the wait for network idle.
    pub nav_timeout: Duration,
    pub headful: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            nav_timeout: Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
            headful: false,
        }
    }
}

impl LaunchOptions {
    /// BREAKSHOT_CHROME, BREAKSHOT_NAV_TIMEOUT_SECS, BREAKSHOT_HEADFUL
    pub fn from_env() -> Self {
        let executable = env::var_os("BREAKSHOT_CHROME").map(PathBuf::from);
        let secs: u64 = env::var("BREAKSHOT_NAV_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_NAV_TIMEOUT_SECS);
        let headful = env::var("BREAKSHOT_HEADFUL")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self {
            executable,
            nav_timeout: Duration::from_secs(secs),
            headful,
        }
    }
}

pub struct Browser {
    inner: chromiumoxide::Browser,
    handler: JoinHandle<()>,
    nav_timeout: Duration,
}

impl Browser {
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let mut builder =
            chromiumoxide::BrowserConfig::builder().request_timeout(options.nav_timeout);
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        if options.headful {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| eyre::eyre!("invalid browser config: {}", e))?;

        tracing::info!(
            "Launching Chromium (executable={:?}, headful={})",
            options.executable,
            options.headful
        );
        let (inner, mut handler) = chromiumoxide::Browser::launch(config)
            .await
            .wrap_err("failed to launch Chromium")?;

        // the CDP connection only makes progress while its handler is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        Ok(Self {
            inner,
            handler,
            nav_timeout: options.nav_timeout,
        })
    }
}

impl crate::Browser for Browser {
    type Page = Page;

    async fn new_page(&self) -> Result<Page> {
        let inner = self
            .inner
            .new_page("about:blank")
            .await
            .wrap_err("failed to open page")?;
        Ok(Page {
            inner,
            nav_timeout: self.nav_timeout,
        })
    }

    async fn close(mut self) -> Result<()> {
        tracing::info!("Closing Chromium");
        let closed = self.inner.close().await.wrap_err("failed to close Chromium");
        if closed.is_ok() {
            self.inner.wait().await.wrap_err("failed to wait for Chromium exit")?;
        }
        self.handler.abort();
        closed.map(|_| ())
    }
}

pub struct Page {
    inner: chromiumoxide::Page,
    nav_timeout: Duration,
}

impl crate::Page for Page {
    async fn set_viewport(&mut self, size: ViewportSize) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(size.width as i64)
            .height(size.height as i64)
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| eyre::eyre!("failed to build viewport params: {}", e))?;
        self.inner.execute(params).await?;
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        let main_frame = self
            .inner
            .mainframe()
            .await?
            .ok_or_else(|| eyre::eyre!("page has no main frame"))?;
        // subscribe first so lifecycle events of the new document are not missed
        let events = self
            .inner
            .event_listener::<EventLifecycleEvent>()
            .await?
            .map(|event| (event.frame_id.inner().clone(), event.name.clone()));
        self.inner
            .goto(url)
            .await
            .wrap_err_with(|| format!("navigation to {} failed", url))?;
        let idle = wait_for_network_idle(events, main_frame.inner());
        tokio::time::timeout(self.nav_timeout, idle)
            .await
            .map_err(|_| {
                eyre::eyre!(
                    "network did not become idle within {}s",
                    self.nav_timeout.as_secs()
                )
            })?
    }

    async fn scroll_height(&mut self) -> Result<u64> {
        let height = self
            .inner
            .evaluate("document.body.scrollHeight")
            .await?
            .into_value::<u64>()?;
        Ok(height)
    }

    async fn scroll_to(&mut self, y: u64) -> Result<()> {
        self.inner
            .evaluate(format!("window.scrollTo(0, {})", y))
            .await?;
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path, full_page: bool) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        self.inner
            .save_screenshot(params, path)
            .await
            .wrap_err_with(|| format!("failed to save screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

/// Resolve on the first `networkIdle` of `main_frame` that follows its `init`.
/// Items are `(frame_id, event_name)`; events of child frames are ignored.
///
/// Lifecycle events of the previous document (e.g. `about:blank`) can still be
/// buffered when navigation starts, so an idle signal only counts once the new
/// document has announced itself.
pub(crate) async fn wait_for_network_idle<S>(events: S, main_frame: &str) -> Result<()>
where
    S: Stream<Item = (String, String)>,
{
    futures::pin_mut!(events);
    let mut document_started = false;
    while let Some((frame, name)) = events.next().await {
        if frame != main_frame {
            continue;
        }
        match name.as_str() {
            "init" => document_started = true,
            "networkIdle" if document_started => return Ok(()),
            _ => {}
        }
    }
    eyre::bail!("lifecycle event stream closed before network idle")
}
