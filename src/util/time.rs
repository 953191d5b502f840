//! Time utilities for the simulation host

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Default frame rate of the match loop
pub const DEFAULT_FRAME_RATE: u32 = 60;
/// Snapshots per second sent to clients
pub const SNAPSHOT_RATE: u32 = 30;

/// Interval between frames at `frame_rate` ticks per second
pub fn frame_duration(frame_rate: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(frame_rate.max(1)))
}

/// Monotonic clock measuring the real time between frames.
/// The simulation takes whatever Δt this reports; nothing is clamped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Milliseconds since the previous lap (or since creation)
    pub fn lap_ms(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        elapsed.as_secs_f32() * 1000.0
    }

    pub fn reset(&mut self) {
        self.last = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
