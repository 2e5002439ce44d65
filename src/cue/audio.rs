// Audio cue parameters: file reference, gain/pan/rate, trim points and the
// sparse channel-routing matrix. Playback itself goes through the audio
// engine; this struct only carries the settings applied to the player.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{MAX_VOLUME, RATE_BOUNDS, ROUTING_FLOOR_DB};
use crate::engine::PlayerId;
use crate::engine::loader;

/// Metadata probed from the audio file header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFileInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub duration: f64,
    pub format: String,
    pub valid: bool,
}

/// Type-specific payload of an audio cue.
#[derive(Debug, Clone)]
pub struct AudioCue {
    file_path: String,
    file_info: AudioFileInfo,
    volume: f64,
    pan: f64,
    rate: f64,
    start_time: f64,
    end_time: f64,
    loop_enabled: bool,
    /// Sparse (input, output) -> level in dB. Entries at or below the
    /// routing floor are removed rather than stored.
    matrix_routing: BTreeMap<(u16, u16), f64>,
    audio_output_patch: String,
    /// Live player handle, present only while the cue owns an engine player.
    pub(crate) player: Option<PlayerId>,
}

impl AudioCue {
    pub fn new() -> Self {
        Self {
            file_path: String::new(),
            file_info: AudioFileInfo::default(),
            volume: 0.8,
            pan: 0.0,
            rate: 1.0,
            start_time: 0.0,
            end_time: 0.0,
            loop_enabled: false,
            matrix_routing: BTreeMap::new(),
            audio_output_patch: String::new(),
            player: None,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub(crate) fn set_file_path(&mut self, path: &str) -> bool {
        if self.file_path == path {
            return false;
        }
        self.file_path = path.to_string();
        self.refresh_file_info();
        true
    }

    /// Re-probe the file header. Missing or unreadable files leave the info
    /// invalid instead of failing.
    pub fn refresh_file_info(&mut self) {
        self.file_info = AudioFileInfo::default();
        if self.file_path.is_empty() {
            return;
        }
        match loader::probe_file(Path::new(&self.file_path)) {
            Ok(info) => self.file_info = info,
            Err(err) => log::warn!("audio file not usable: {}: {}", self.file_path, err),
        }
        self.validate_trim_points();
    }

    pub fn file_info(&self) -> &AudioFileInfo {
        &self.file_info
    }

    pub(crate) fn file_info_mut(&mut self) -> &mut AudioFileInfo {
        &mut self.file_info
    }

    pub fn has_valid_file(&self) -> bool {
        self.file_info.valid
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub(crate) fn set_volume(&mut self, volume: f64) -> bool {
        let volume = volume.clamp(0.0, MAX_VOLUME);
        if (self.volume - volume).abs() > 1e-9 {
            self.volume = volume;
            true
        } else {
            false
        }
    }

    /// Linear volume expressed in dB relative to unity gain.
    pub fn volume_db(&self) -> f64 {
        if self.volume <= 0.0 {
            ROUTING_FLOOR_DB
        } else {
            20.0 * self.volume.log10()
        }
    }

    pub(crate) fn set_volume_db(&mut self, db: f64) -> bool {
        if db <= ROUTING_FLOOR_DB {
            self.set_volume(0.0)
        } else {
            self.set_volume(10f64.powf(db / 20.0))
        }
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub(crate) fn set_pan(&mut self, pan: f64) -> bool {
        let pan = pan.clamp(-1.0, 1.0);
        if (self.pan - pan).abs() > 1e-9 {
            self.pan = pan;
            true
        } else {
            false
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub(crate) fn set_rate(&mut self, rate: f64) -> bool {
        let rate = rate.clamp(RATE_BOUNDS.0, RATE_BOUNDS.1);
        if (self.rate - rate).abs() > 1e-9 {
            self.rate = rate;
            self.validate_trim_points();
            true
        } else {
            false
        }
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub(crate) fn set_start_time(&mut self, seconds: f64) -> bool {
        let seconds = seconds.max(0.0);
        if (self.start_time - seconds).abs() > 1e-9 {
            self.start_time = seconds;
            self.validate_trim_points();
            true
        } else {
            false
        }
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub(crate) fn set_end_time(&mut self, seconds: f64) -> bool {
        let seconds = seconds.max(0.0);
        if (self.end_time - seconds).abs() > 1e-9 {
            self.end_time = seconds;
            self.validate_trim_points();
            true
        } else {
            false
        }
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub(crate) fn set_loop_enabled(&mut self, enabled: bool) -> bool {
        if self.loop_enabled != enabled {
            self.loop_enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Trimmed playback span divided by rate; falls back to the cue duration
    /// when no end trim is set.
    pub fn effective_duration(&self, base_duration: f64) -> f64 {
        if self.end_time > self.start_time {
            (self.end_time - self.start_time) / self.rate
        } else {
            base_duration / self.rate
        }
    }

    /// Keep start < end and both within the probed file duration.
    fn validate_trim_points(&mut self) {
        if self.start_time >= self.end_time && self.end_time > 0.0 {
            self.start_time = (self.end_time - 0.1).max(0.0);
        }
        if self.file_info.valid && self.file_info.duration > 0.0 {
            self.start_time = self.start_time.min(self.file_info.duration);
            if self.end_time > self.file_info.duration {
                self.end_time = self.file_info.duration;
            }
        }
    }

    pub fn matrix_routing(&self) -> &BTreeMap<(u16, u16), f64> {
        &self.matrix_routing
    }

    pub(crate) fn set_matrix_routing(&mut self, routing: BTreeMap<(u16, u16), f64>) {
        self.matrix_routing = routing;
        self.matrix_routing.retain(|_, db| *db > ROUTING_FLOOR_DB);
    }

    pub(crate) fn set_routing_level(&mut self, input: u16, output: u16, level_db: f64) {
        if level_db <= ROUTING_FLOOR_DB {
            self.matrix_routing.remove(&(input, output));
        } else {
            self.matrix_routing.insert((input, output), level_db);
        }
    }

    pub fn routing_level(&self, input: u16, output: u16) -> f64 {
        self.matrix_routing
            .get(&(input, output))
            .copied()
            .unwrap_or(ROUTING_FLOOR_DB)
    }

    pub fn is_routed(&self, input: u16, output: u16) -> bool {
        self.matrix_routing.contains_key(&(input, output))
    }

    pub fn audio_output_patch(&self) -> &str {
        &self.audio_output_patch
    }

    pub(crate) fn set_audio_output_patch(&mut self, patch: &str) -> bool {
        if self.audio_output_patch != patch {
            self.audio_output_patch = patch.to_string();
            true
        } else {
            false
        }
    }

    pub(crate) fn clear_runtime(&mut self) {
        self.player = None;
    }
}

impl Default for AudioCue {
    fn default() -> Self {
        Self::new()
    }
}
