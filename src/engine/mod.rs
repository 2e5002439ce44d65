// Audio transport engine - real-time cpal callback plus a per-player
// transport control surface for the control plane.
//
// The callback supports whatever sample format the device prefers (f32,
// i16, u16); all mixing happens in f32 and is converted on write. The
// player map sits behind a mutex the callback only ever `try_lock`s: if the
// control plane holds it for the few instructions of an insert or removal,
// that one block renders silence rather than stalling the device thread.
// Everything else the two threads share is atomics on SharedPlayerState.

pub mod device;
pub mod loader;
pub mod mixer;
pub mod player;

pub use device::{AudioDeviceInfo, list_output_devices};
pub use player::{AtomicF32, Player, PlayerId, SharedPlayerState};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::messaging::{
    Notification, NotificationCategory, NotificationConsumer, NotificationProducer,
    create_notification_channel,
};

const NOTIFICATION_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no audio output device found")]
    NoDevice,

    #[error("audio device {0} not found")]
    DeviceNotFound(String),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("resample error: {0}")]
    Resample(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

type PlayerMap = HashMap<PlayerId, Player>;

pub struct AudioEngine {
    _stream: Stream,
    device_name: String,
    sample_rate: u32,
    players: Arc<Mutex<PlayerMap>>,
    next_player_id: PlayerId,
    notifications: NotificationConsumer,
    master_volume: Arc<AtomicF32>,
}

impl AudioEngine {
    /// Open the default output device and start the stream.
    pub fn new() -> Result<Self, EngineError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(EngineError::NoDevice)?;
        Self::open(device)
    }

    /// Open a named output device and start the stream.
    pub fn with_device(device_name: &str) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = device::output_device_by_name(&host, device_name)
            .ok_or_else(|| EngineError::DeviceNotFound(device_name.to_string()))?;
        Self::open(device)
    }

    fn open(device: Device) -> Result<Self, EngineError> {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_output_config()
            .map_err(|e| EngineError::Stream(e.to_string()))?;
        let sample_format = supported.sample_format();
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: StreamConfig = supported.into();

        let players: Arc<Mutex<PlayerMap>> = Arc::new(Mutex::new(HashMap::new()));
        let master_volume = Arc::new(AtomicF32::new(1.0));
        let (notification_tx, notification_rx) =
            create_notification_channel(NOTIFICATION_CAPACITY);
        let notification_tx = Arc::new(Mutex::new(notification_tx));

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                Arc::clone(&players),
                Arc::clone(&master_volume),
                notification_tx,
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                Arc::clone(&players),
                Arc::clone(&master_volume),
                notification_tx,
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                Arc::clone(&players),
                Arc::clone(&master_volume),
                notification_tx,
            ),
            other => {
                return Err(EngineError::Stream(format!(
                    "unsupported device sample format: {:?}",
                    other
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        log::info!(
            "audio engine started: {} @ {} Hz, {} channels",
            device_name,
            sample_rate,
            channels
        );

        Ok(Self {
            _stream: stream,
            device_name,
            sample_rate,
            players,
            next_player_id: 1,
            notifications: notification_rx,
            master_volume,
        })
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        players: Arc<Mutex<PlayerMap>>,
        master_volume: Arc<AtomicF32>,
        notification_tx: Arc<Mutex<NotificationProducer>>,
    ) -> Result<Stream, EngineError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // Real-time section: no allocations, no I/O, no blocking
                    // locks. If the player map is contended, output silence
                    // for this block.
                    match players.try_lock() {
                        Ok(players) => {
                            let master = master_volume.get();
                            for frame in data.chunks_mut(channels) {
                                let mut left = 0.0f32;
                                let mut right = 0.0f32;
                                for player in players.values() {
                                    if let Some((l, r)) = player.next_frame() {
                                        left += l;
                                        right += r;
                                    }
                                }
                                left = mixer::soft_clip(mixer::flush_denormals_to_zero(
                                    left * master,
                                ));
                                right = mixer::soft_clip(mixer::flush_denormals_to_zero(
                                    right * master,
                                ));
                                mixer::write_stereo_to_interleaved_frame((left, right), frame);
                            }
                        }
                        Err(_) => {
                            for sample in data.iter_mut() {
                                *sample = Sample::from_sample(0.0f32);
                            }
                        }
                    }
                },
                move |err| {
                    // Runs outside the audio callback; forwarding to the
                    // control plane is non-blocking.
                    log::error!("audio stream error: {}", err);
                    if let Ok(mut tx) = notification_tx.try_lock() {
                        let notif = Notification::critical(
                            NotificationCategory::Audio,
                            format!("Audio stream error: {}", err),
                        );
                        let _ = ringbuf::traits::Producer::try_push(&mut *tx, notif);
                    }
                },
                None,
            )
            .map_err(|e| EngineError::Stream(e.to_string()))?;

        Ok(stream)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Drain notifications queued by the audio side (stream errors).
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Some(notif) = ringbuf::traits::Consumer::try_pop(&mut self.notifications) {
            out.push(notif);
        }
        out
    }

    pub fn set_master_volume(&self, volume: f64) {
        self.master_volume
            .set(volume.clamp(0.0, crate::config::MAX_VOLUME) as f32);
    }

    // ---- player management ----

    /// Decode a file and attach a new (stopped) player to the mix.
    pub fn create_player(&mut self, path: &Path) -> Result<PlayerId, EngineError> {
        let decoded = loader::load_file(path, self.sample_rate)?;
        log::debug!(
            "loaded {} ({} frames, {} -> {} Hz)",
            path.display(),
            decoded.frames,
            decoded.source_sample_rate,
            decoded.sample_rate
        );

        let id = self.next_player_id;
        self.next_player_id += 1;

        let player = Player::new(id, decoded.samples);
        self.lock_players().insert(id, player);
        Ok(id)
    }

    /// Detach a player and release its buffer. No-op on unknown ids.
    pub fn remove_player(&mut self, id: PlayerId) {
        self.lock_players().remove(&id);
    }

    pub fn player_count(&self) -> usize {
        self.lock_players().len()
    }

    // ---- transport ----

    pub fn play(&self, id: PlayerId) {
        if let Some(shared) = self.shared(id) {
            shared.finished.store(false, Ordering::Relaxed);
            shared.fading.store(false, Ordering::Relaxed);
            shared.fade_gain.set(1.0);
            shared.paused.store(false, Ordering::Relaxed);
            shared.playing.store(true, Ordering::Relaxed);
        } else {
            log::warn!("play: unknown player {}", id);
        }
    }

    /// Halt and rewind to the region start.
    pub fn stop(&self, id: PlayerId) {
        if let Some(shared) = self.shared(id) {
            shared.reset_transport();
        } else {
            log::warn!("stop: unknown player {}", id);
        }
    }

    /// Halt without moving the cursor.
    pub fn pause(&self, id: PlayerId) {
        if let Some(shared) = self.shared(id) {
            shared.paused.store(true, Ordering::Relaxed);
        } else {
            log::warn!("pause: unknown player {}", id);
        }
    }

    pub fn resume(&self, id: PlayerId) {
        if let Some(shared) = self.shared(id) {
            shared.paused.store(false, Ordering::Relaxed);
        } else {
            log::warn!("resume: unknown player {}", id);
        }
    }

    /// Begin a fade to silence over `seconds`; the player halts on its own
    /// when the ramp bottoms out. Zero or negative fades stop immediately.
    pub fn set_fade_out(&self, id: PlayerId, seconds: f64) {
        if seconds <= 0.0 {
            self.stop(id);
            return;
        }
        if let Some(shared) = self.shared(id) {
            let step = 1.0 / (seconds * self.sample_rate as f64);
            shared.fade_gain.set(1.0);
            shared.fade_step.set(step as f32);
            shared.fading.store(true, Ordering::Relaxed);
        } else {
            log::warn!("fade: unknown player {}", id);
        }
    }

    pub fn is_playing(&self, id: PlayerId) -> bool {
        self.shared(id).map(|s| s.is_audible()).unwrap_or(false)
    }

    pub fn is_paused(&self, id: PlayerId) -> bool {
        self.shared(id)
            .map(|s| s.playing.load(Ordering::Relaxed) && s.paused.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Natural end-of-media flag, set by the audio thread.
    pub fn is_finished(&self, id: PlayerId) -> bool {
        self.shared(id)
            .map(|s| s.finished.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    // ---- per-player properties ----

    pub fn set_volume(&self, id: PlayerId, volume: f64) {
        if let Some(shared) = self.shared(id) {
            shared
                .gain
                .set(volume.clamp(0.0, crate::config::MAX_VOLUME) as f32);
        } else {
            log::warn!("set_volume: unknown player {}", id);
        }
    }

    pub fn volume(&self, id: PlayerId) -> f64 {
        self.shared(id).map(|s| s.gain.get() as f64).unwrap_or(0.0)
    }

    pub fn set_pan(&self, id: PlayerId, pan: f64) {
        if let Some(shared) = self.shared(id) {
            shared.pan.set(pan.clamp(-1.0, 1.0) as f32);
        }
    }

    pub fn set_rate(&self, id: PlayerId, rate: f64) {
        if let Some(shared) = self.shared(id) {
            let (lo, hi) = crate::config::RATE_BOUNDS;
            shared.rate.set(rate.clamp(lo, hi) as f32);
        }
    }

    pub fn set_looping(&self, id: PlayerId, looping: bool) {
        if let Some(shared) = self.shared(id) {
            shared.looping.store(looping, Ordering::Relaxed);
        }
    }

    /// Restrict playback to [start, end) seconds; an end of 0 means the full
    /// file. The cursor moves to the region start.
    pub fn set_region(&self, id: PlayerId, start_seconds: f64, end_seconds: f64) {
        let guard = self.lock_players();
        let Some(player) = guard.get(&id) else {
            log::warn!("set_region: unknown player {}", id);
            return;
        };
        let frames = player.frames() as f64;
        let rate = self.sample_rate as f64;
        let start = (start_seconds.max(0.0) * rate).min(frames);
        let mut end = if end_seconds > 0.0 {
            (end_seconds * rate).min(frames)
        } else {
            frames
        };
        if end <= start {
            end = frames;
        }
        player.shared.region_start.set(start);
        player.shared.region_end.set(end);
        player.shared.position.set(start);
    }

    pub fn set_position(&self, id: PlayerId, seconds: f64) {
        let guard = self.lock_players();
        if let Some(player) = guard.get(&id) {
            let frames = player.frames() as f64;
            let pos = (seconds.max(0.0) * self.sample_rate as f64).min(frames);
            player.shared.position.set(pos);
        } else {
            log::warn!("set_position: unknown player {}", id);
        }
    }

    pub fn position(&self, id: PlayerId) -> f64 {
        self.shared(id)
            .map(|s| s.position.get() / self.sample_rate as f64)
            .unwrap_or(0.0)
    }

    pub fn duration(&self, id: PlayerId) -> f64 {
        self.lock_players()
            .get(&id)
            .map(|p| p.frames() as f64 / self.sample_rate as f64)
            .unwrap_or(0.0)
    }

    // ---- internals ----

    fn shared(&self, id: PlayerId) -> Option<Arc<SharedPlayerState>> {
        self.lock_players().get(&id).map(|p| Arc::clone(&p.shared))
    }

    fn lock_players(&self) -> MutexGuard<'_, PlayerMap> {
        match self.players.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
