use breakshot_browser::Page;
use eyre::{Result, WrapErr};
use std::time::Duration;

pub const SCROLL_STEP_PX: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub rounds: u32,
    /// Last scroll height read.
    pub height: u64,
    /// False when the round cap stopped a still-growing page.
    pub settled: bool,
}

/// Scroll down in 300px steps until the page stops growing, pausing `delay` after
/// each step so lazy content can load.
///
/// Each round reads the height, steps from the previous round's height up to it,
/// then reads again; equal readings end the loop. Without `max_rounds` a page that
/// keeps growing is scrolled forever.
pub async fn auto_scroll<P: Page>(
    page: &mut P,
    delay: Duration,
    max_rounds: Option<u32>,
) -> Result<ScrollOutcome> {
    let mut floor = 0;
    let mut rounds = 0;
    loop {
        let current = page
            .scroll_height()
            .await
            .wrap_err("failed to read scroll height")?;

        let mut position = floor;
        while position < current {
            page.scroll_to(position)
                .await
                .wrap_err_with(|| format!("failed to scroll to {}", position))?;
            tokio::time::sleep(delay).await;
            position += SCROLL_STEP_PX;
        }

        let next = page
            .scroll_height()
            .await
            .wrap_err("failed to read scroll height")?;
        rounds += 1;
        tracing::debug!("Scroll round {}: height {} -> {}", rounds, current, next);

        if next == current {
            return Ok(ScrollOutcome {
                rounds,
                height: next,
                settled: true,
            });
        }
        if max_rounds.is_some_and(|max| rounds >= max) {
            tracing::warn!(
                "Page still growing after {} scroll rounds ({}px), capturing anyway",
                rounds,
                next
            );
            return Ok(ScrollOutcome {
                rounds,
                height: next,
                settled: false,
            });
        }
        floor = current;
    }
}
