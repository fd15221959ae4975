//! Per-side countdown clock.

use chess_core::Color;
use std::time::Duration;
use tokio::time::{self, Instant};

pub const DEFAULT_SECONDS: u64 = 600;
/// Remaining time at which a side is considered short of time.
pub const LOW_TIME_SECONDS: u64 = 10;

/// Two countdowns, only one of which runs at a time.
///
/// A side is charged exactly the time spent inside
/// [`run_down`](Self::run_down) for that side. Time while nobody runs the
/// clock (prompts, between games) is charged to no one. Remaining time is
/// reported in whole clock seconds, rounded up.
#[derive(Debug)]
pub struct GameClock {
    left: [Duration; 2],
    tick: Duration,
    enabled: bool,
}

/// Charges the time since `since` to `left` when dropped, so a cancelled
/// [`GameClock::run_down`] still bills what it ran.
struct Running<'a> {
    left: &'a mut Duration,
    since: Instant,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        *self.left = self.left.saturating_sub(self.since.elapsed());
    }
}

impl GameClock {
    /// A clock with `seconds` per side, one clock second per real second.
    /// Zero seconds means no clock.
    pub fn new(seconds: u64) -> Self {
        Self::with_tick(seconds, Duration::from_secs(1))
    }

    /// Same as [`new`](Self::new) with a custom length for a clock second.
    pub fn with_tick(seconds: u64, tick: Duration) -> Self {
        GameClock {
            left: [full_time(seconds, tick); 2],
            tick,
            enabled: seconds > 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Clock seconds left for `color`.
    pub fn remaining(&self, color: Color) -> u64 {
        let left = self.left[color.index()].as_nanos();
        let tick = self.tick.as_nanos().max(1);
        u64::try_from(left.div_ceil(tick)).unwrap_or(u64::MAX)
    }

    pub fn is_low(&self, color: Color) -> bool {
        self.enabled && self.remaining(color) <= LOW_TIME_SECONDS
    }

    /// Remaining time as `m:ss`, with a trailing `!` when short of time.
    pub fn display(&self, color: Color) -> String {
        let secs = self.remaining(color);
        let flag = if self.is_low(color) { "!" } else { "" };
        format!("{}:{:02}{}", secs / 60, secs % 60, flag)
    }

    /// Puts both sides back to `seconds`.
    pub fn reset(&mut self, seconds: u64) {
        self.left = [full_time(seconds, self.tick); 2];
        self.enabled = seconds > 0;
    }

    /// Counts `color` down until their flag falls, then returns `color`.
    ///
    /// Never completes for a disabled clock. Cancel safe: dropping the
    /// future charges `color` for the time it ran.
    pub async fn run_down(&mut self, color: Color) -> Color {
        if !self.enabled {
            return std::future::pending().await;
        }
        let running = Running {
            left: &mut self.left[color.index()],
            since: Instant::now(),
        };
        time::sleep(*running.left).await;
        drop(running);
        self.left[color.index()] = Duration::ZERO;
        color
    }
}

fn full_time(seconds: u64, tick: Duration) -> Duration {
    tick.saturating_mul(u32::try_from(seconds).unwrap_or(u32::MAX))
}
