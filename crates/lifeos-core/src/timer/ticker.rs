use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

/// Shared stop switch for a [`Ticker`]. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a [`Ticker`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerExit {
    /// The callback asked to stop.
    Finished,
    /// The cancel flag was set.
    Cancelled,
}

/// Calls a function on a fixed period until it breaks or is cancelled.
///
/// Ticks that fall behind are skipped rather than bunched up.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    cancel: CancelFlag,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            cancel: CancelFlag::new(),
        }
    }

    /// A handle that stops this ticker before its next callback.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn run<F>(&self, mut on_tick: F) -> TickerExit
    where
        F: FnMut() -> ControlFlow<()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if self.cancel.is_cancelled() {
                tracing::debug!("ticker cancelled");
                return TickerExit::Cancelled;
            }
            if on_tick().is_break() {
                return TickerExit::Finished;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stops_when_callback_breaks() {
        let ticker = Ticker::new(Duration::from_millis(100));
        let mut calls = 0;
        let exit = ticker
            .run(|| {
                calls += 1;
                if calls == 5 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        assert_eq!(exit, TickerExit::Finished);
        assert_eq!(calls, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_cancelled() {
        let ticker = Ticker::new(Duration::from_millis(100));
        let flag = ticker.cancel_flag();
        let mut calls = 0;
        let exit = ticker
            .run(|| {
                calls += 1;
                if calls == 3 {
                    flag.cancel();
                }
                ControlFlow::Continue(())
            })
            .await;
        assert_eq!(exit, TickerExit::Cancelled);
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_never_calls_back() {
        let ticker = Ticker::new(Duration::from_millis(100));
        ticker.cancel_flag().cancel();
        let exit = ticker.run(|| panic!("should not tick")).await;
        assert_eq!(exit, TickerExit::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_the_interval() {
        let ticker = Ticker::new(Duration::from_millis(250));
        let start = tokio::time::Instant::now();
        let mut calls = 0;
        ticker
            .run(|| {
                calls += 1;
                if calls == 4 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        // First tick fires immediately.
        assert_eq!(start.elapsed(), Duration::from_millis(750));
    }
}
