//! Poll scheduling.
//!
//! The forwarding loop asks a [`Ticker`] when to run the next cycle, so tests
//! can drive a fixed number of cycles without sleeping.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Interval, MissedTickBehavior};

#[async_trait]
pub trait Ticker: Send {
    /// Wait until the next cycle is due. `false` ends the loop.
    async fn tick(&mut self) -> bool;
}

/// Fires immediately, then once every `period`, forever.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        // A slow cycle pushes the next one back instead of firing a burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}
