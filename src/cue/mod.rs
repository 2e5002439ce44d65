// Cue data model: common lifecycle fields shared by every cue plus a
// type-specific payload. Execution and target resolution are orchestrated
// by the cue manager; a cue only guards its own fields and invariants.

pub mod audio;
pub mod control;
pub mod group;
pub mod wait;

pub use audio::{AudioCue, AudioFileInfo};
pub use control::{ControlCue, ControlType};
pub use group::{GroupCue, GroupMode};
pub use wait::WaitCue;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::DEFAULT_WAIT_DURATION;

/// Full cue-type discriminant. Every name parses so foreign workspaces load,
/// but only Audio, Wait, Group and the control types are constructible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueType {
    Audio,
    Video,
    Midi,
    Group,
    Fade,
    Wait,
    Start,
    Stop,
    Goto,
    Pause,
    Load,
    Reset,
    Arm,
    Disarm,
    Devamp,
    Memo,
    Text,
    Network,
    Light,
}

impl CueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CueType::Audio => "Audio",
            CueType::Video => "Video",
            CueType::Midi => "MIDI",
            CueType::Group => "Group",
            CueType::Fade => "Fade",
            CueType::Wait => "Wait",
            CueType::Start => "Start",
            CueType::Stop => "Stop",
            CueType::Goto => "Goto",
            CueType::Pause => "Pause",
            CueType::Load => "Load",
            CueType::Reset => "Reset",
            CueType::Arm => "Arm",
            CueType::Disarm => "Disarm",
            CueType::Devamp => "Devamp",
            CueType::Memo => "Memo",
            CueType::Text => "Text",
            CueType::Network => "Network",
            CueType::Light => "Light",
        }
    }

    /// Case-insensitive; unrecognized names default to Audio.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "audio" => CueType::Audio,
            "video" => CueType::Video,
            "midi" => CueType::Midi,
            "group" => CueType::Group,
            "fade" => CueType::Fade,
            "wait" => CueType::Wait,
            "start" => CueType::Start,
            "stop" => CueType::Stop,
            "goto" => CueType::Goto,
            "pause" => CueType::Pause,
            "load" => CueType::Load,
            "reset" => CueType::Reset,
            "arm" => CueType::Arm,
            "disarm" => CueType::Disarm,
            "devamp" => CueType::Devamp,
            "memo" => CueType::Memo,
            "text" => CueType::Text,
            "network" => CueType::Network,
            "light" => CueType::Light,
            _ => CueType::Audio,
        }
    }

    pub fn is_control(&self) -> bool {
        ControlType::from_cue_type(*self).is_some()
    }
}

/// Cue lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CueStatus {
    #[default]
    Loaded,
    Running,
    Paused,
    Stopped,
    Finished,
    Broken,
}

impl CueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CueStatus::Loaded => "Loaded",
            CueStatus::Running => "Running",
            CueStatus::Paused => "Paused",
            CueStatus::Stopped => "Stopped",
            CueStatus::Finished => "Finished",
            CueStatus::Broken => "Broken",
        }
    }

    /// Running or Paused: the cue holds live resources.
    pub fn is_active(&self) -> bool {
        matches!(self, CueStatus::Running | CueStatus::Paused)
    }
}

/// Type-specific payload.
#[derive(Debug, Clone)]
pub enum CueKind {
    Audio(AudioCue),
    Wait(WaitCue),
    Control(ControlCue),
    Group(GroupCue),
}

/// One schedulable unit of show action.
#[derive(Debug, Clone)]
pub struct Cue {
    id: Uuid,
    cue_type: CueType,
    number: String,
    name: String,
    duration: f64,
    pre_wait: f64,
    post_wait: f64,
    continue_mode: bool,
    /// Hex color string, e.g. "#64ff96".
    color: String,
    notes: String,
    status: CueStatus,
    armed: bool,
    broken: bool,
    target_cue_id: Option<Uuid>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    /// Runtime generation counter; bumping it invalidates scheduled tasks.
    epoch: u64,
    kind: CueKind,
}

impl Cue {
    /// Build a cue of the given type with its defaults. Returns None for
    /// types this engine does not implement (Video, MIDI, Fade, ...).
    pub fn new(cue_type: CueType) -> Option<Self> {
        let (kind, name, color, duration) = match cue_type {
            CueType::Audio => (
                CueKind::Audio(AudioCue::new()),
                "New Cue".to_string(),
                "#64ff96".to_string(),
                0.0,
            ),
            CueType::Wait => (
                CueKind::Wait(WaitCue::new()),
                "Wait".to_string(),
                "#ffc864".to_string(),
                DEFAULT_WAIT_DURATION,
            ),
            CueType::Group => (
                CueKind::Group(GroupCue::default()),
                "Group".to_string(),
                "#6495ed".to_string(),
                0.0,
            ),
            other => {
                let control_type = ControlType::from_cue_type(other)?;
                (
                    CueKind::Control(ControlCue::new(control_type)),
                    control_type.default_name().to_string(),
                    control_type.default_color().to_string(),
                    0.0,
                )
            }
        };

        let now = Utc::now();
        Some(Self {
            id: Uuid::new_v4(),
            cue_type,
            number: "1".to_string(),
            name,
            duration,
            pre_wait: 0.0,
            post_wait: 0.0,
            continue_mode: false,
            color,
            notes: String::new(),
            status: CueStatus::Loaded,
            armed: true,
            broken: false,
            target_cue_id: None,
            created: now,
            modified: now,
            epoch: 0,
            kind,
        })
    }

    // ---- common properties ----

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    pub fn cue_type(&self) -> CueType {
        self.cue_type
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn set_number(&mut self, number: &str) {
        if self.number != number {
            self.number = number.to_string();
            self.touch();
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        if self.name != name {
            self.name = name.to_string();
            self.touch();
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        if (self.duration - seconds).abs() > 1e-3 {
            self.duration = seconds;
            self.touch();
        }
    }

    pub fn pre_wait(&self) -> f64 {
        self.pre_wait
    }

    pub fn set_pre_wait(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        if (self.pre_wait - seconds).abs() > 1e-3 {
            self.pre_wait = seconds;
            self.touch();
        }
    }

    pub fn post_wait(&self) -> f64 {
        self.post_wait
    }

    pub fn set_post_wait(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        if (self.post_wait - seconds).abs() > 1e-3 {
            self.post_wait = seconds;
            self.touch();
        }
    }

    pub fn continue_mode(&self) -> bool {
        self.continue_mode
    }

    pub fn set_continue_mode(&mut self, enabled: bool) {
        if self.continue_mode != enabled {
            self.continue_mode = enabled;
            self.touch();
        }
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: &str) {
        if self.color != color {
            self.color = color.to_string();
            self.touch();
        }
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: &str) {
        if self.notes != notes {
            self.notes = notes.to_string();
            self.touch();
        }
    }

    pub fn status(&self) -> CueStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: CueStatus) {
        self.status = status;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_armed(&mut self, armed: bool) {
        if self.armed != armed {
            self.armed = armed;
            self.touch();
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub(crate) fn set_broken(&mut self, broken: bool) {
        if self.broken != broken {
            self.broken = broken;
            if broken {
                self.status = CueStatus::Broken;
            } else if self.status == CueStatus::Broken {
                self.status = CueStatus::Loaded;
            }
        }
    }

    // ---- target system ----

    pub fn target_cue_id(&self) -> Option<Uuid> {
        self.target_cue_id
    }

    pub fn set_target_cue_id(&mut self, id: Option<Uuid>) {
        if self.target_cue_id != id {
            self.target_cue_id = id;
            self.touch();
        }
    }

    pub fn has_target(&self) -> bool {
        self.target_cue_id.is_some()
    }

    // ---- timestamps ----

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub(crate) fn set_timestamps(&mut self, created: DateTime<Utc>, modified: DateTime<Utc>) {
        self.created = created;
        self.modified = modified;
    }

    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    // ---- execution support ----

    /// Base execution precondition; type-specific checks (valid file,
    /// resolvable target, executable child) live in the manager.
    pub fn is_ready(&self) -> bool {
        self.armed && !self.broken && self.status != CueStatus::Running
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn bump_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Pre-wait + duration + post-wait; groups derive their duration from
    /// their children, audio cues from their trim points and rate.
    pub fn total_span(&self) -> f64 {
        let body = match &self.kind {
            CueKind::Group(group) => group.derived_duration(),
            CueKind::Audio(audio) => audio.effective_duration(self.duration),
            _ => self.duration,
        };
        self.pre_wait + body + self.post_wait
    }

    // ---- kind access ----

    pub fn kind(&self) -> &CueKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut CueKind {
        &mut self.kind
    }

    pub fn as_audio(&self) -> Option<&AudioCue> {
        match &self.kind {
            CueKind::Audio(audio) => Some(audio),
            _ => None,
        }
    }

    pub(crate) fn as_audio_mut(&mut self) -> Option<&mut AudioCue> {
        match &mut self.kind {
            CueKind::Audio(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn as_wait(&self) -> Option<&WaitCue> {
        match &self.kind {
            CueKind::Wait(wait) => Some(wait),
            _ => None,
        }
    }

    pub(crate) fn as_wait_mut(&mut self) -> Option<&mut WaitCue> {
        match &mut self.kind {
            CueKind::Wait(wait) => Some(wait),
            _ => None,
        }
    }

    pub fn as_control(&self) -> Option<&ControlCue> {
        match &self.kind {
            CueKind::Control(control) => Some(control),
            _ => None,
        }
    }

    pub(crate) fn as_control_mut(&mut self) -> Option<&mut ControlCue> {
        match &mut self.kind {
            CueKind::Control(control) => Some(control),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupCue> {
        match &self.kind {
            CueKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupCue> {
        match &mut self.kind {
            CueKind::Group(group) => Some(group),
            _ => None,
        }
    }

    // ---- forwarding setters that keep `modified` fresh ----

    pub fn set_file_path(&mut self, path: &str) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_file_path(path))
            .unwrap_or(false);
        if changed {
            // Derive a name from the file stem when the cue is unnamed.
            if self.name.is_empty() || self.name == "New Cue" {
                if let Some(stem) = std::path::Path::new(path)
                    .file_stem()
                    .and_then(|s| s.to_str())
                {
                    self.name = stem.to_string();
                }
            }
            self.touch();
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_volume(volume))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_volume_db(&mut self, db: f64) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_volume_db(db))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_pan(&mut self, pan: f64) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_pan(pan))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_rate(&mut self, rate: f64) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_rate(rate))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_start_time(&mut self, seconds: f64) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_start_time(seconds))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_end_time(&mut self, seconds: f64) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_end_time(seconds))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_loop_enabled(&mut self, enabled: bool) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_loop_enabled(enabled))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_routing_level(&mut self, input: u16, output: u16, level_db: f64) {
        if self.as_audio().is_none() {
            return;
        }
        if let Some(audio) = self.as_audio_mut() {
            audio.set_routing_level(input, output, level_db);
        }
        self.touch();
    }

    pub fn set_matrix_routing(&mut self, routing: BTreeMap<(u16, u16), f64>) {
        if self.as_audio().is_none() {
            return;
        }
        if let Some(audio) = self.as_audio_mut() {
            audio.set_matrix_routing(routing);
        }
        self.touch();
    }

    pub fn set_audio_output_patch(&mut self, patch: &str) {
        let changed = self
            .as_audio_mut()
            .map(|a| a.set_audio_output_patch(patch))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_fade_time(&mut self, seconds: f64) {
        let changed = self
            .as_control_mut()
            .map(|c| c.set_fade_time(seconds))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    pub fn set_group_mode(&mut self, mode: GroupMode) {
        let changed = self
            .as_group_mut()
            .map(|g| g.set_mode(mode))
            .unwrap_or(false);
        if changed {
            self.touch();
        }
    }

    // ---- cloning ----

    /// Deep copy with fresh ids, reset runtime state and " Copy" appended to
    /// the name.
    pub fn duplicate(&self) -> Cue {
        let mut copy = self.fresh_copy();
        copy.name = format!("{} Copy", self.name);
        copy
    }

    /// Deep copy with fresh ids (self and all group children) and reset
    /// runtime state. Used for duplicate and clipboard paste.
    pub(crate) fn fresh_copy(&self) -> Cue {
        let kind = match &self.kind {
            CueKind::Audio(audio) => {
                let mut audio = audio.clone();
                audio.clear_runtime();
                CueKind::Audio(audio)
            }
            CueKind::Wait(wait) => {
                let mut wait = wait.clone();
                wait.reset();
                CueKind::Wait(wait)
            }
            CueKind::Control(control) => CueKind::Control(control.clone()),
            CueKind::Group(group) => {
                let mut copy = GroupCue::new(group.mode());
                for child in group.children() {
                    copy.add_child(child.fresh_copy());
                }
                CueKind::Group(copy)
            }
        };

        let now = Utc::now();
        Cue {
            id: Uuid::new_v4(),
            cue_type: self.cue_type,
            number: self.number.clone(),
            name: self.name.clone(),
            duration: self.duration,
            pre_wait: self.pre_wait,
            post_wait: self.post_wait,
            continue_mode: self.continue_mode,
            color: self.color.clone(),
            notes: self.notes.clone(),
            status: CueStatus::Loaded,
            armed: self.armed,
            broken: self.broken,
            target_cue_id: self.target_cue_id,
            created: now,
            modified: now,
            epoch: 0,
            kind,
        }
    }
}
