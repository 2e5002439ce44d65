// Tunable constants shared across the cue model and the audio engine.

/// Upper bound for cue and player volume. 1.0 is unity gain; values above
/// unity are boost.
pub const MAX_VOLUME: f64 = 2.0;

/// Allowed playback-rate range for audio cues.
pub const RATE_BOUNDS: (f64, f64) = (0.1, 4.0);

/// Matrix-routing levels at or below this are treated as "off" and removed
/// from the sparse map.
pub const ROUTING_FLOOR_DB: f64 = -96.0;

/// Fade applied by a Devamp control cue when its own fade time is zero.
pub const DEFAULT_DEVAMP_FADE: f64 = 0.5;

/// Duration assigned to a freshly created wait cue.
pub const DEFAULT_WAIT_DURATION: f64 = 5.0;

/// Version string written into workspace documents.
pub const WORKSPACE_VERSION: &str = "2.0.0";
