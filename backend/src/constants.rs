// Shared constants for aggregation windows, throttling and background timers.

pub const DEFAULT_HTTP_PORT: u16 = 9099;
pub const WINDOW_MS: u64 = 24 * 60 * 60 * 1_000;
pub const WINDOW_LEN: usize = 8;
pub const DEFAULT_RADIUS_KM: f64 = 50.0;
pub const COOLDOWN_SECS: u64 = 12;
pub const THROTTLE_SWEEP_INTERVAL_SECS: u64 = 5 * 60;
pub const IDLE_TICK_SECS: u64 = 10;
pub const IDLE_AFTER_SECS: u64 = 90;
pub const VIEWER_QUEUE_CAPACITY: usize = 256;
