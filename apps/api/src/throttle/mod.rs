//! Request throttle — a fixed-size rolling window over successful generations.
//!
//! Callers use a two-step protocol: [`RequestThrottle::check_limit`] before
//! calling the LLM and [`RequestThrottle::record_request`] only once the call
//! has succeeded, so failed generations never consume quota. The pair is not
//! atomic on its own; callers serialize generations around it.

pub mod handlers;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::storage::{read_json, write_json, KvStore, StorageError, THROTTLE_KEY};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Persisted window state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleWindow {
    pub count: u32,
    #[serde(rename = "resetTime", with = "chrono::serde::ts_milliseconds")]
    pub reset_at: DateTime<Utc>,
}

impl ThrottleWindow {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }
}

/// Fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleConfig {
    pub max_requests: u32,
    pub window: Duration,
}

/// Outcome of [`RequestThrottle::check_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed { remaining: u32 },
    /// `reset_in_minutes` is rounded up and never zero.
    Denied { reset_in_minutes: i64 },
}

#[derive(Clone)]
pub struct RequestThrottle {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    config: ThrottleConfig,
}

impl RequestThrottle {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, config: ThrottleConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }

    /// Loads the stored window, or a fresh unsaved one when nothing usable is stored.
    fn load(&self, now: DateTime<Utc>) -> ThrottleWindow {
        read_json(self.store.as_ref(), THROTTLE_KEY).unwrap_or_else(|| self.fresh_window(now, 0))
    }

    fn fresh_window(&self, now: DateTime<Utc>, count: u32) -> ThrottleWindow {
        ThrottleWindow {
            count,
            reset_at: now
                .checked_add_signed(self.config.window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Decides whether another generation may start. Does not consume quota.
    pub fn check_limit(&self) -> ThrottleDecision {
        let now = self.clock.now();
        let window = self.load(now);

        if window.is_expired_at(now) {
            let fresh = self.fresh_window(now, 0);
            if let Err(e) = write_json(self.store.as_ref(), THROTTLE_KEY, &fresh) {
                warn!("Failed to persist rolled-over throttle window: {e}");
            }
            debug!("Throttle window rolled over, resets at {}", fresh.reset_at);
            return ThrottleDecision::Allowed {
                remaining: self.config.max_requests,
            };
        }

        if window.count >= self.config.max_requests {
            let reset_in_minutes = minutes_until(now, window.reset_at);
            info!(
                "Throttle denied: {} of {} used, resets in {} min",
                window.count, self.config.max_requests, reset_in_minutes
            );
            return ThrottleDecision::Denied { reset_in_minutes };
        }

        ThrottleDecision::Allowed {
            remaining: self.config.max_requests - window.count,
        }
    }

    /// Charges one request against the current window.
    /// Call only after a generation has succeeded.
    pub fn record_request(&self) -> Result<ThrottleWindow, StorageError> {
        let now = self.clock.now();
        let mut window = self.load(now);

        if window.is_expired_at(now) {
            window = self.fresh_window(now, 1);
        } else {
            window.count += 1;
        }

        write_json(self.store.as_ref(), THROTTLE_KEY, &window)?;
        debug!(
            "Throttle recorded request {}/{}",
            window.count, self.config.max_requests
        );
        Ok(window)
    }

    /// Remaining quota in the current window, never negative.
    pub fn remaining_requests(&self) -> u32 {
        let now = self.clock.now();
        let window = self.load(now);
        if window.is_expired_at(now) {
            return self.config.max_requests;
        }
        self.config.max_requests.saturating_sub(window.count)
    }

    /// When the current window ends.
    pub fn reset_time(&self) -> DateTime<Utc> {
        self.load(self.clock.now()).reset_at
    }

    pub fn reset(&self) -> Result<(), StorageError> {
        self.store.remove(THROTTLE_KEY)?;
        info!("Throttle window reset");
        Ok(())
    }
}

/// Whole minutes from `now` to `until`, rounded up.
fn minutes_until(now: DateTime<Utc>, until: DateTime<Utc>) -> i64 {
    let millis = (until - now).num_milliseconds().max(0);
    (millis + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE
}
