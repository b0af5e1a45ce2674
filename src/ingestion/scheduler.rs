use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::types::CycleSummary;
use super::IngestError;
use crate::telemetry::{self};
use crate::telemetry::config::sanitize;
use crate::telemetry::emit::Meta;
use crate::util::time::parse_duration_str;

pub const MIN_INTERVAL: Duration = Duration::from_secs(120);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("invalid interval {0:?} (expected a duration like 2m, 90s or 1h30m)")]
    Unparseable(String),
    #[error("interval must be at least 2m, got {0:?}")]
    TooShort(String),
}

/// Fixed-interval driver for ingestion cycles.
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Result<Self, IntervalError> {
        if interval < MIN_INTERVAL {
            return Err(IntervalError::TooShort(format!("{:?}", interval)));
        }
        Ok(Self { interval })
    }

    pub fn parse(raw: &str) -> Result<Self, IntervalError> {
        let interval = parse_duration_str(raw).ok_or_else(|| IntervalError::Unparseable(raw.to_string()))?;
        Self::new(interval).map_err(|_| IntervalError::TooShort(raw.to_string()))
    }

    pub fn interval(&self) -> Duration { self.interval }

    /// Run `cycle` now and then once per tick until it fails fatally.
    ///
    /// Missed ticks are skipped rather than replayed, so a slow cycle is followed by the next
    /// tick boundary instead of a burst of catch-up cycles. Non-fatal cycle errors are logged.
    pub async fn run<F, Fut>(&self, mut cycle: F) -> Result<(), IngestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<CycleSummary>, IngestError>>,
    {
        let log = telemetry::agg();
        let _root = log.root_span_kv([("interval", format!("{:?}", self.interval))]).entered();
        log.info(format!("⏱️  Collecting feeds every {:?}", self.interval));

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            // first tick completes immediately
            ticker.tick().await;
            let started = Instant::now();
            match cycle().await {
                Ok(Some(summary)) => {
                    if telemetry::config::json_mode() {
                        let meta = Meta { duration_ms: Some(started.elapsed().as_millis()), user: None };
                        if let Err(err) = log.result(&summary, Some(meta)) { log.warn(format!("failed to emit cycle result: {err}")); }
                    }
                }
                Ok(None) => {}
                Err(err) if err.is_fatal() => {
                    log.error(format!("❌ cycle failed fatally: {}", sanitize(&err.to_string())));
                    return Err(err);
                }
                Err(err) => log.warn(format!("⚠️ cycle skipped: {}", sanitize(&err.to_string()))),
            }
        }
    }
}
