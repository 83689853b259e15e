use std::time::Duration;

/// Detections below this normalised confidence are discarded.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.4;

/// Frames larger than this on their longest side are downscaled before OCR.
pub const DEFAULT_MAX_DETECTION_DIMENSION: u32 = 1000;

/// Minimum time between translate-cycle dispatches.
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_millis(500);

/// A translate cycle running longer than this is abandoned by the watchdog.
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Render loop cadence (~100 ticks per second).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

pub const DEFAULT_SOURCE_LANGUAGE: &str = "ja";
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// Requested capture resolution for live devices.
pub const CAPTURE_WIDTH: u32 = 1280;
pub const CAPTURE_HEIGHT: u32 = 720;

/// Luma above this gets black text, otherwise white.
pub const BRIGHTNESS_THRESHOLD: f64 = 128.0;

pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];
