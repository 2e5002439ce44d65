// Workspace persistence: document structs mirroring the on-disk JSON schema
// plus conversions to and from the runtime cue model. The runtime structs
// carry transient state (player handles, countdowns, group cursors) that
// must never reach disk, so serialization goes through these mirrors rather
// than deriving on the model itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use crate::config::WORKSPACE_VERSION;
use crate::cue::{Cue, CueKind, CueType, GroupMode};

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level workspace document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDoc {
    pub version: String,
    pub cues: Vec<CueDoc>,
    #[serde(default, alias = "standByCueId", skip_serializing_if = "Option::is_none")]
    pub standby_cue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_groups: Option<Vec<String>>,
}

impl WorkspaceDoc {
    pub fn empty() -> Self {
        Self {
            version: WORKSPACE_VERSION.to_string(),
            cues: Vec::new(),
            standby_cue: None,
            expanded_groups: None,
        }
    }
}

fn default_number() -> String {
    "1".to_string()
}

fn default_name() -> String {
    "New Cue".to_string()
}

fn default_type() -> String {
    "Audio".to_string()
}

fn default_color() -> String {
    "#ffffff".to_string()
}

fn default_true() -> bool {
    true
}

/// One cue as persisted. Type-specific fields are optional and omitted for
/// types they do not apply to; group children nest recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueDoc {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "default_type")]
    pub cue_type: String,
    #[serde(default = "default_number")]
    pub number: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub pre_wait: f64,
    #[serde(default)]
    pub post_wait: f64,
    #[serde(default)]
    pub continue_mode: bool,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_true")]
    pub is_armed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    // Audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_routing: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_output_patch: Option<String>,

    // Control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_time: Option<f64>,

    // Group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<CueDoc>>,
}

/// Serialize one cue (and, for groups, its subtree).
pub fn cue_to_doc(cue: &Cue) -> CueDoc {
    let mut doc = CueDoc {
        id: cue.id().to_string(),
        cue_type: cue.cue_type().as_str().to_string(),
        number: cue.number().to_string(),
        name: cue.name().to_string(),
        duration: cue.duration(),
        pre_wait: cue.pre_wait(),
        post_wait: cue.post_wait(),
        continue_mode: cue.continue_mode(),
        color: cue.color().to_string(),
        notes: cue.notes().to_string(),
        is_armed: cue.is_armed(),
        target_cue_id: cue.target_cue_id().map(|id| id.to_string()),
        created_time: Some(cue.created().to_rfc3339()),
        modified_time: Some(cue.modified().to_rfc3339()),
        file_path: None,
        volume: None,
        pan: None,
        rate: None,
        start_time: None,
        end_time: None,
        loop_enabled: None,
        matrix_routing: None,
        audio_output_patch: None,
        fade_time: None,
        mode: None,
        children: None,
    };

    match cue.kind() {
        CueKind::Audio(audio) => {
            doc.file_path = Some(audio.file_path().to_string());
            doc.volume = Some(audio.volume());
            doc.pan = Some(audio.pan());
            doc.rate = Some(audio.rate());
            doc.start_time = Some(audio.start_time());
            doc.end_time = Some(audio.end_time());
            doc.loop_enabled = Some(audio.loop_enabled());
            doc.audio_output_patch = Some(audio.audio_output_patch().to_string());
            if !audio.matrix_routing().is_empty() {
                doc.matrix_routing = Some(
                    audio
                        .matrix_routing()
                        .iter()
                        .map(|((input, output), db)| (format!("{}_{}", input, output), *db))
                        .collect(),
                );
            }
        }
        CueKind::Wait(_) => {}
        CueKind::Control(control) => {
            doc.fade_time = Some(control.fade_time());
        }
        CueKind::Group(group) => {
            doc.mode = Some(group.mode().as_str().to_string());
            doc.children = Some(group.children().iter().map(cue_to_doc).collect());
        }
    }

    doc
}

/// Rebuild a cue from its document. Returns None when the type is not one
/// this engine can construct (the type name itself always parses).
pub fn cue_from_doc(doc: &CueDoc) -> Option<Cue> {
    let cue_type = CueType::parse(&doc.cue_type);
    let mut cue = Cue::new(cue_type)?;

    if let Ok(id) = Uuid::parse_str(&doc.id) {
        cue.set_id(id);
    }
    cue.set_number(&doc.number);
    cue.set_name(&doc.name);
    cue.set_duration(doc.duration);
    cue.set_pre_wait(doc.pre_wait);
    cue.set_post_wait(doc.post_wait);
    cue.set_continue_mode(doc.continue_mode);
    cue.set_color(&doc.color);
    cue.set_notes(&doc.notes);
    cue.set_armed(doc.is_armed);
    cue.set_target_cue_id(
        doc.target_cue_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok()),
    );

    match cue.cue_type() {
        CueType::Audio => {
            if let Some(path) = &doc.file_path {
                cue.set_file_path(path);
            }
            cue.set_volume(doc.volume.unwrap_or(0.8));
            cue.set_pan(doc.pan.unwrap_or(0.0));
            cue.set_rate(doc.rate.unwrap_or(1.0));
            cue.set_start_time(doc.start_time.unwrap_or(0.0));
            cue.set_end_time(doc.end_time.unwrap_or(0.0));
            cue.set_loop_enabled(doc.loop_enabled.unwrap_or(false));
            if let Some(patch) = &doc.audio_output_patch {
                cue.set_audio_output_patch(patch);
            }
            if let Some(routing) = &doc.matrix_routing {
                cue.set_matrix_routing(
                    routing
                        .iter()
                        .filter_map(|(key, db)| parse_routing_key(key).map(|pair| (pair, *db)))
                        .collect(),
                );
            }
        }
        CueType::Wait => {}
        CueType::Group => {
            cue.set_group_mode(GroupMode::parse(doc.mode.as_deref().unwrap_or("")));
            if let Some(children) = &doc.children {
                for child_doc in children {
                    match cue_from_doc(child_doc) {
                        Some(child) => {
                            if let Some(group) = cue.as_group_mut() {
                                group.add_child(child);
                            }
                        }
                        None => log::warn!(
                            "skipping unsupported child cue type: {}",
                            child_doc.cue_type
                        ),
                    }
                }
            }
        }
        // Every remaining constructible type is a control cue.
        _ => {
            cue.set_fade_time(doc.fade_time.unwrap_or(0.0));
        }
    }

    // Restore persisted timestamps after the setters above touched them.
    let created = doc
        .created_time
        .as_deref()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&chrono::Utc));
    let modified = doc
        .modified_time
        .as_deref()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&chrono::Utc));
    if let (Some(created), Some(modified)) = (created, modified) {
        cue.set_timestamps(created, modified);
    }

    Some(cue)
}

fn parse_routing_key(key: &str) -> Option<(u16, u16)> {
    let (input, output) = key.split_once('_')?;
    Some((input.parse().ok()?, output.parse().ok()?))
}

pub fn save_to_file(path: &Path, doc: &WorkspaceDoc) -> Result<(), WorkspaceError> {
    let json = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<WorkspaceDoc, WorkspaceError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
