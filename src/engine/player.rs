// Per-player playback state shared between the control plane and the audio
// thread. The decoded buffer is immutable once created; everything the two
// threads race on (transport flags, gain, cursor, fade) lives in atomics so
// neither side ever blocks the other.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::engine::mixer::pan_gains;

/// Dense id handed out by the engine, monotonically increasing and never
/// reused for the life of the engine instance.
pub type PlayerId = u64;

/// Atomic f32 cell using bit-cast storage.
#[derive(Debug)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Atomic f64 cell; used for the fractional frame cursor.
#[derive(Debug)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// The cross-thread control surface of one player.
#[derive(Debug)]
pub struct SharedPlayerState {
    pub playing: AtomicBool,
    pub paused: AtomicBool,
    /// Set by the audio thread when the cursor runs off the end of the
    /// region (natural completion, not an explicit stop).
    pub finished: AtomicBool,
    pub gain: AtomicF32,
    pub pan: AtomicF32,
    pub rate: AtomicF32,
    pub looping: AtomicBool,
    pub fading: AtomicBool,
    pub fade_gain: AtomicF32,
    pub fade_step: AtomicF32,
    /// Fractional frame cursor.
    pub position: AtomicF64,
    /// Playback region in frames.
    pub region_start: AtomicF64,
    pub region_end: AtomicF64,
}

impl SharedPlayerState {
    pub fn new(frames: usize) -> Self {
        Self {
            playing: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            gain: AtomicF32::new(1.0),
            pan: AtomicF32::new(0.0),
            rate: AtomicF32::new(1.0),
            looping: AtomicBool::new(false),
            fading: AtomicBool::new(false),
            fade_gain: AtomicF32::new(1.0),
            fade_step: AtomicF32::new(0.0),
            position: AtomicF64::new(0.0),
            region_start: AtomicF64::new(0.0),
            region_end: AtomicF64::new(frames as f64),
        }
    }

    pub fn is_audible(&self) -> bool {
        self.playing.load(Ordering::Relaxed) && !self.paused.load(Ordering::Relaxed)
    }

    /// Halt and rewind to the region start; clears any fade in progress.
    pub fn reset_transport(&self) {
        self.playing.store(false, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);
        self.fading.store(false, Ordering::Relaxed);
        self.fade_gain.set(1.0);
        self.position.set(self.region_start.get());
    }
}

/// One decoded file attached to the live mix.
pub struct Player {
    id: PlayerId,
    /// Interleaved stereo samples at the device rate.
    buffer: Arc<Vec<f32>>,
    frames: usize,
    pub shared: Arc<SharedPlayerState>,
}

impl Player {
    pub fn new(id: PlayerId, buffer: Arc<Vec<f32>>) -> Self {
        let frames = buffer.len() / 2;
        Self {
            id,
            buffer,
            frames,
            shared: Arc::new(SharedPlayerState::new(frames)),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Produce the next stereo sample, or None while silent. Called from the
    /// audio thread once per output frame; advances the cursor and handles
    /// looping, fade-out completion and end-of-region.
    pub fn next_frame(&self) -> Option<(f32, f32)> {
        let shared = &self.shared;
        if !shared.is_audible() || self.frames == 0 {
            return None;
        }

        let start = shared.region_start.get();
        let end = shared.region_end.get().min(self.frames as f64);
        let mut pos = shared.position.get();

        if pos >= end {
            if shared.looping.load(Ordering::Relaxed) {
                pos = start;
            } else {
                shared.playing.store(false, Ordering::Relaxed);
                shared.finished.store(true, Ordering::Relaxed);
                shared.position.set(start);
                return None;
            }
        }

        let (mut left, mut right) = self.sample_at(pos);

        let mut gain = shared.gain.get();
        if shared.fading.load(Ordering::Relaxed) {
            let fade = shared.fade_gain.get() - shared.fade_step.get();
            if fade <= 0.0 {
                // Fade ran out: this is the deferred tail of a stop.
                shared.reset_transport();
                return None;
            }
            shared.fade_gain.set(fade);
            gain *= fade;
        }

        let (pan_l, pan_r) = pan_gains(shared.pan.get());
        left *= gain * pan_l;
        right *= gain * pan_r;

        shared.position.set(pos + shared.rate.get() as f64);
        Some((left, right))
    }

    /// Linear interpolation at a fractional frame position.
    fn sample_at(&self, pos: f64) -> (f32, f32) {
        let index = pos as usize;
        if index >= self.frames {
            return (0.0, 0.0);
        }
        let frac = pos.fract() as f32;
        let next = if index + 1 < self.frames {
            index + 1
        } else {
            index
        };

        let l0 = self.buffer[index * 2];
        let r0 = self.buffer[index * 2 + 1];
        let l1 = self.buffer[next * 2];
        let r1 = self.buffer[next * 2 + 1];

        (l0 + (l1 - l0) * frac, r0 + (r1 - r0) * frac)
    }
}
