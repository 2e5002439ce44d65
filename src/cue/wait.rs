// Wait cue countdown state.
//
// The cue's `duration` field is the wait length; this struct only tracks
// the transient countdown while the cue runs. Timing is driven by the
// control-plane scheduler, not a timer of its own, so pausing is a matter
// of banking the remaining time and rescheduling on resume.

/// Transient countdown state for a running wait cue.
#[derive(Debug, Clone, Default)]
pub struct WaitCue {
    /// Virtual-clock time the current run segment started, None while paused
    /// or idle.
    started_at: Option<f64>,
    /// Seconds left when the current segment started.
    remaining: f64,
}

impl WaitCue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin counting down `duration` seconds from `now`.
    pub fn arm(&mut self, now: f64, duration: f64) {
        self.started_at = Some(now);
        self.remaining = duration.max(0.0);
    }

    /// Bank the remaining time; the scheduler entry is invalidated separately.
    pub fn pause(&mut self, now: f64) {
        if let Some(t0) = self.started_at {
            self.remaining = (self.remaining - (now - t0)).max(0.0);
            self.started_at = None;
        }
    }

    /// Continue from the banked remaining time.
    pub fn resume(&mut self, now: f64) {
        self.started_at = Some(now);
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.remaining = 0.0;
    }

    /// Whether a countdown is underway (running or banked by a pause).
    pub fn is_engaged(&self) -> bool {
        self.started_at.is_some() || self.remaining > 0.0
    }

    /// Seconds left at `now`.
    pub fn remaining(&self, now: f64) -> f64 {
        match self.started_at {
            Some(t0) => (self.remaining - (now - t0)).max(0.0),
            None => self.remaining,
        }
    }

    /// Completion fraction in [0, 1].
    pub fn progress(&self, now: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return 0.0;
        }
        (1.0 - self.remaining(now) / duration).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown() {
        let mut wait = WaitCue::new();
        wait.arm(10.0, 5.0);

        assert_eq!(wait.remaining(10.0), 5.0);
        assert_eq!(wait.remaining(12.0), 3.0);
        assert_eq!(wait.remaining(20.0), 0.0);
    }

    #[test]
    fn test_pause_banks_remaining() {
        let mut wait = WaitCue::new();
        wait.arm(0.0, 4.0);

        wait.pause(1.5);
        // Time does not pass while paused
        assert_eq!(wait.remaining(100.0), 2.5);

        wait.resume(100.0);
        assert_eq!(wait.remaining(101.0), 1.5);
    }

    #[test]
    fn test_progress() {
        let mut wait = WaitCue::new();
        wait.arm(0.0, 2.0);

        assert_eq!(wait.progress(0.0, 2.0), 0.0);
        assert_eq!(wait.progress(1.0, 2.0), 0.5);
        assert_eq!(wait.progress(5.0, 2.0), 1.0);
        assert_eq!(wait.progress(1.0, 0.0), 0.0);
    }
}
