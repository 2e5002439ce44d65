// Cue manager - central orchestration.
//
// Owns the top-level cue list (group children are owned by their groups),
// the standby pointer, selection, clipboard and the deferred-task scheduler.
// Every structural edit and state transition goes through this type on one
// control-plane thread; cues never mutate their siblings except through the
// manager's target-resolution indirection.
//
// Time is a virtual seconds clock advanced by `tick`. Scheduled tasks are
// dispatched at their exact fire times (the clock jumps to each due entry
// in order), so chained timing - sequential groups, auto-continue - stays
// exact no matter how coarsely the host ticks.

pub mod events;

pub use events::{ManagerEvent, MessageLevel};

use std::collections::VecDeque;
use std::path::Path;
use uuid::Uuid;

use crate::config::DEFAULT_DEVAMP_FADE;
use crate::cue::{ControlType, Cue, CueKind, CueStatus, CueType, GroupMode};
use crate::engine::{AudioEngine, PlayerId};
use crate::messaging::NotificationLevel;
use crate::scheduler::{Scheduler, Task};
use crate::workspace::{self, CueDoc, WorkspaceDoc, WorkspaceError};

pub struct CueManager {
    cues: Vec<Cue>,
    selected: Vec<Uuid>,
    active: Vec<Uuid>,
    standby: Option<Uuid>,
    clipboard: Vec<CueDoc>,
    expanded_groups: Vec<Uuid>,
    unsaved: bool,
    clock: f64,
    scheduler: Scheduler,
    events: VecDeque<ManagerEvent>,
    engine: Option<AudioEngine>,
    global_paused: bool,
}

impl CueManager {
    pub fn new() -> Self {
        Self {
            cues: Vec::new(),
            selected: Vec::new(),
            active: Vec::new(),
            standby: None,
            clipboard: Vec::new(),
            expanded_groups: Vec::new(),
            unsaved: false,
            clock: 0.0,
            scheduler: Scheduler::new(),
            events: VecDeque::new(),
            engine: None,
            global_paused: false,
        }
    }

    // ---- engine attachment ----

    pub fn attach_engine(&mut self, engine: AudioEngine) {
        log::info!("audio engine connected: {}", engine.device_name());
        self.engine = Some(engine);
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&AudioEngine> {
        self.engine.as_ref()
    }

    // ---- event surface ----

    pub fn take_events(&mut self) -> Vec<ManagerEvent> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: ManagerEvent) {
        self.events.push_back(event);
    }

    fn info_msg(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::info!("{}", text);
        self.emit(ManagerEvent::Message {
            level: MessageLevel::Info,
            text,
        });
    }

    fn warn_msg(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::warn!("{}", text);
        self.emit(ManagerEvent::Message {
            level: MessageLevel::Warning,
            text,
        });
    }

    fn error_msg(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::error!("{}", text);
        self.emit(ManagerEvent::Message {
            level: MessageLevel::Error,
            text,
        });
    }

    // ---- queries ----

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn cue_count(&self) -> usize {
        self.cues.len()
    }

    /// Flattened lookup: searches the top level and every group subtree.
    pub fn get_cue(&self, id: Uuid) -> Option<&Cue> {
        find_in(&self.cues, id)
    }

    /// Top-level position of a cue; None for group children.
    pub fn cue_index(&self, id: Uuid) -> Option<usize> {
        self.cues.iter().position(|c| c.id() == id)
    }

    pub fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        let path = path_to(&self.cues, id)?;
        if path.len() < 2 {
            return None;
        }
        cue_at_path(&self.cues, &path[..path.len() - 1]).map(|c| c.id())
    }

    pub(crate) fn with_cue_mut<R>(&mut self, id: Uuid, f: impl FnOnce(&mut Cue) -> R) -> Option<R> {
        let path = path_to(&self.cues, id)?;
        cue_at_path_mut(&mut self.cues, &path).map(f)
    }

    /// Host-facing mutation: applies `f`, marks the workspace dirty and
    /// emits a cue-updated event.
    pub fn update_cue(&mut self, id: Uuid, f: impl FnOnce(&mut Cue)) -> bool {
        if self.with_cue_mut(id, f).is_none() {
            return false;
        }
        self.mark_unsaved();
        self.emit(ManagerEvent::CueUpdated { id });
        true
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    // ---- cue creation and removal ----

    /// Create a cue of the given type, inserted at `index` (appended when
    /// None or out of range). Returns the new cue's id.
    pub fn create_cue(&mut self, cue_type: CueType, index: Option<usize>) -> Option<Uuid> {
        let Some(cue) = Cue::new(cue_type) else {
            self.warn_msg(format!(
                "Cue type {} is not supported",
                cue_type.as_str()
            ));
            return None;
        };
        let id = cue.id();

        let index = match index {
            Some(i) if i < self.cues.len() => i,
            _ => self.cues.len(),
        };
        self.cues.insert(index, cue);

        self.mark_unsaved();
        self.renumber_all();
        self.emit(ManagerEvent::CueAdded { id, index });

        log::debug!("created cue {} at index {}", id, index);
        Some(id)
    }

    /// Remove a cue (top-level or nested). Active cues are stopped first;
    /// standby, selection and the active set never keep the removed id.
    pub fn remove_cue(&mut self, id: Uuid) -> bool {
        let Some(cue) = self.get_cue(id) else {
            return false;
        };
        if cue.status().is_active() {
            self.stop_cue(id, 0.0);
        }

        if let Some(index) = self.cue_index(id) {
            self.emit(ManagerEvent::CueRemoved { id });
            self.cues.remove(index);

            // Standby moves to the next available cue, never a removed id.
            if self.standby == Some(id) {
                let next = self.cues.get(index).map(|c| c.id());
                self.set_standby(next);
            }
        } else {
            let Some(parent) = self.parent_of(id) else {
                return false;
            };
            let parent_running =
                self.get_cue(parent).map(|c| c.status()) == Some(CueStatus::Running);
            let mode = self
                .get_cue(parent)
                .and_then(|c| c.as_group())
                .map(|g| g.mode());

            self.emit(ManagerEvent::CueRemoved { id });
            let child_index = self
                .with_cue_mut(parent, |p| {
                    p.as_group_mut().and_then(|group| {
                        let index = group.child_index(id)?;
                        group.remove_child(index);
                        Some(index)
                    })
                })
                .flatten();
            if self.standby == Some(id) {
                self.set_standby(None);
            }

            // Don't leave a running group waiting on a child that no longer
            // exists: hand the slot to the next child or drain the set.
            if parent_running && let Some(index) = child_index {
                match mode {
                    Some(GroupMode::Sequential) => {
                        self.advance_sequential_from(parent, index);
                    }
                    Some(GroupMode::Simultaneous) => {
                        let empty = self
                            .get_cue(parent)
                            .and_then(|c| c.as_group())
                            .map(|g| g.active_children.is_empty())
                            .unwrap_or(true);
                        if empty {
                            self.finish_cue(parent);
                        }
                    }
                    None => {}
                }
            }
        }

        self.prune_stale_refs();
        self.mark_unsaved();
        self.renumber_all();
        self.emit(ManagerEvent::SelectionChanged);
        true
    }

    pub fn move_cue(&mut self, id: Uuid, new_index: usize) -> bool {
        let Some(old_index) = self.cue_index(id) else {
            return false;
        };
        if new_index >= self.cues.len() {
            return false;
        }
        if old_index == new_index {
            return true;
        }

        let cue = self.cues.remove(old_index);
        let adjusted = if new_index > old_index {
            new_index - 1
        } else {
            new_index
        };
        self.cues.insert(adjusted, cue);

        self.mark_unsaved();
        self.renumber_all();
        self.emit(ManagerEvent::CueMoved {
            id,
            from: old_index,
            to: adjusted,
        });
        true
    }

    pub fn move_cue_up(&mut self, id: Uuid) -> bool {
        match self.cue_index(id) {
            Some(index) if index > 0 => self.move_cue(id, index - 1),
            _ => false,
        }
    }

    pub fn move_cue_down(&mut self, id: Uuid) -> bool {
        match self.cue_index(id) {
            Some(index) if index + 1 < self.cues.len() => self.move_cue(id, index + 1),
            _ => false,
        }
    }

    /// Deep-copy a top-level cue, inserting the copy right after it.
    pub fn duplicate_cue(&mut self, id: Uuid) -> Option<Uuid> {
        let Some(index) = self.cue_index(id) else {
            self.warn_msg("Only top-level cues can be duplicated");
            return None;
        };
        let copy = self.cues[index].duplicate();
        let copy_id = copy.id();
        self.cues.insert(index + 1, copy);

        self.mark_unsaved();
        self.renumber_all();
        self.emit(ManagerEvent::CueAdded {
            id: copy_id,
            index: index + 1,
        });
        Some(copy_id)
    }

    pub fn renumber_all(&mut self) {
        for (i, cue) in self.cues.iter_mut().enumerate() {
            cue.set_number(&(i + 1).to_string());
        }
    }

    // ---- standby ----

    pub fn standby_cue_id(&self) -> Option<Uuid> {
        self.standby
    }

    pub fn set_standby(&mut self, id: Option<Uuid>) {
        let id = id.filter(|i| self.get_cue(*i).is_some());
        if self.standby != id {
            self.standby = id;
            self.emit(ManagerEvent::StandbyChanged { id });
        }
    }

    /// Move the standby pointer one cue later; a missing standby snaps to
    /// the first cue. Clamps at the end of the list.
    pub fn next_cue(&mut self) {
        let current = self.standby.and_then(|id| self.cue_index(id));
        match current {
            None => {
                let first = self.cues.first().map(|c| c.id());
                self.set_standby(first);
            }
            Some(index) if index + 1 < self.cues.len() => {
                let next = self.cues[index + 1].id();
                self.set_standby(Some(next));
            }
            Some(_) => {}
        }
    }

    /// Move the standby pointer one cue earlier; a missing standby snaps to
    /// the last cue. Clamps at the start of the list.
    pub fn previous_cue(&mut self) {
        let current = self.standby.and_then(|id| self.cue_index(id));
        match current {
            None => {
                let last = self.cues.last().map(|c| c.id());
                self.set_standby(last);
            }
            Some(index) if index > 0 => {
                let prev = self.cues[index - 1].id();
                self.set_standby(Some(prev));
            }
            Some(_) => {}
        }
    }

    // ---- selection ----

    pub fn selected_cue_ids(&self) -> &[Uuid] {
        &self.selected
    }

    pub fn select_cue(&mut self, id: Uuid) {
        self.selected.clear();
        if self.get_cue(id).is_some() {
            self.selected.push(id);
        }
        self.emit(ManagerEvent::SelectionChanged);
    }

    pub fn add_to_selection(&mut self, id: Uuid) {
        if self.get_cue(id).is_some() && !self.selected.contains(&id) {
            self.selected.push(id);
            self.emit(ManagerEvent::SelectionChanged);
        }
    }

    pub fn remove_from_selection(&mut self, id: Uuid) {
        let before = self.selected.len();
        self.selected.retain(|s| *s != id);
        if self.selected.len() != before {
            self.emit(ManagerEvent::SelectionChanged);
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.emit(ManagerEvent::SelectionChanged);
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.cues.iter().map(|c| c.id()).collect();
        self.emit(ManagerEvent::SelectionChanged);
    }

    // ---- expanded groups (UI-adjacent, persisted) ----

    pub fn expanded_groups(&self) -> &[Uuid] {
        &self.expanded_groups
    }

    pub fn set_group_expanded(&mut self, id: Uuid, expanded: bool) {
        if expanded {
            if self.get_cue(id).is_some() && !self.expanded_groups.contains(&id) {
                self.expanded_groups.push(id);
                self.mark_unsaved();
            }
        } else {
            let before = self.expanded_groups.len();
            self.expanded_groups.retain(|g| *g != id);
            if self.expanded_groups.len() != before {
                self.mark_unsaved();
            }
        }
    }

    // ---- clipboard ----

    /// Snapshot the selected cues (in list order) as serialized documents.
    pub fn copy(&mut self) {
        self.clipboard.clear();

        let order = self.flat_ids();
        let mut selected: Vec<Uuid> = self
            .selected
            .iter()
            .copied()
            .filter(|id| self.get_cue(*id).is_some())
            .collect();
        selected.sort_by_key(|id| order.iter().position(|o| o == id));

        let mut docs = Vec::new();
        for id in selected {
            if let Some(cue) = self.get_cue(id) {
                docs.push(workspace::cue_to_doc(cue));
            }
        }
        self.clipboard = docs;
        log::debug!("copied {} cues to clipboard", self.clipboard.len());
    }

    pub fn cut(&mut self) {
        self.copy();
        let ids: Vec<Uuid> = self.selected.clone();
        for id in ids {
            self.remove_cue(id);
        }
    }

    /// Recreate clipboard cues at `index` (after the selection, or at the
    /// end, when None). Pasted cues always get fresh ids so a snapshot can
    /// be pasted repeatedly; one bad entry never aborts the batch.
    pub fn paste(&mut self, index: Option<usize>) -> Vec<Uuid> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }

        let mut paste_index = match index {
            Some(i) => i.min(self.cues.len()),
            None => {
                let max_selected = self
                    .selected
                    .iter()
                    .filter_map(|id| self.cue_index(*id))
                    .max();
                match max_selected {
                    Some(i) => i + 1,
                    None => self.cues.len(),
                }
            }
        };

        self.clear_selection();

        let docs = self.clipboard.clone();
        let mut pasted = Vec::new();
        for doc in &docs {
            match workspace::cue_from_doc(doc) {
                Some(cue) => {
                    let cue = cue.fresh_copy();
                    let id = cue.id();
                    self.cues.insert(paste_index, cue);
                    self.emit(ManagerEvent::CueAdded {
                        id,
                        index: paste_index,
                    });
                    pasted.push(id);
                    paste_index += 1;
                }
                None => {
                    self.warn_msg(format!("Could not paste cue of type {}", doc.cue_type));
                }
            }
        }

        for id in &pasted {
            self.add_to_selection(*id);
        }
        if !pasted.is_empty() {
            self.mark_unsaved();
            self.renumber_all();
        }
        pasted
    }

    // ---- group operations ----

    /// Replace the selected top-level cues with a new group containing them
    /// in their original relative order, at the earliest selected position.
    pub fn create_group_from_selection(&mut self, group_name: &str) -> Option<Uuid> {
        if self.selected.is_empty() {
            self.warn_msg("No cues selected to group");
            return None;
        }
        if self.selected.len() < 2 {
            self.warn_msg("Select at least 2 cues to create a group");
            return None;
        }

        let mut indices: Vec<usize> = self
            .selected
            .iter()
            .filter_map(|id| self.cue_index(*id))
            .collect();
        if indices.len() < 2 {
            self.warn_msg("Select at least 2 top-level cues to create a group");
            return None;
        }
        indices.sort_unstable();
        let first_index = indices[0];

        // Stop anything active before it changes owner; a running cue must
        // not keep completion callbacks pointing at the old position.
        let moving_ids: Vec<Uuid> = indices.iter().map(|i| self.cues[*i].id()).collect();
        for id in &moving_ids {
            if self
                .get_cue(*id)
                .map(|c| c.status().is_active())
                .unwrap_or(false)
            {
                self.stop_cue(*id, 0.0);
            }
        }

        let mut moved = Vec::with_capacity(indices.len());
        for i in indices.iter().rev() {
            moved.push(self.cues.remove(*i));
        }
        moved.reverse();

        let mut group = Cue::new(CueType::Group)?;
        group.set_name(group_name);
        let group_id = group.id();
        if let Some(inner) = group.as_group_mut() {
            for cue in moved {
                inner.add_child(cue);
            }
        }
        self.cues.insert(first_index, group);

        self.selected.clear();
        self.selected.push(group_id);
        self.prune_stale_refs();

        self.mark_unsaved();
        self.renumber_all();
        self.emit(ManagerEvent::CueAdded {
            id: group_id,
            index: first_index,
        });
        self.emit(ManagerEvent::SelectionChanged);
        self.emit(ManagerEvent::CueUpdated { id: group_id });

        log::debug!("created group {} with {} children", group_id, indices.len());
        Some(group_id)
    }

    /// Release a group's children back to the top level at the group's
    /// position, in order, and remove the then-empty group.
    pub fn ungroup_cue(&mut self, group_id: Uuid) -> bool {
        let Some(group_index) = self.cue_index(group_id) else {
            return false;
        };
        if self.cues[group_index].as_group().is_none() {
            return false;
        }

        if self.cues[group_index].status().is_active() {
            self.stop_cue(group_id, 0.0);
        }

        self.emit(ManagerEvent::CueRemoved { id: group_id });
        let mut group_cue = self.cues.remove(group_index);
        let children = match group_cue.as_group_mut() {
            Some(group) => group.take_children(),
            None => Vec::new(),
        };

        let mut insert_at = group_index;
        for child in children {
            let child_id = child.id();
            self.cues.insert(insert_at, child);
            self.emit(ManagerEvent::CueAdded {
                id: child_id,
                index: insert_at,
            });
            insert_at += 1;
        }

        if self.standby == Some(group_id) {
            let next = self.cues.get(group_index).map(|c| c.id());
            self.set_standby(next);
        }
        self.prune_stale_refs();

        self.mark_unsaved();
        self.renumber_all();
        self.emit(ManagerEvent::SelectionChanged);
        true
    }

    // ---- workspace ----

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn mark_saved(&mut self) {
        if self.unsaved {
            self.unsaved = false;
            self.emit(ManagerEvent::UnsavedChanged { unsaved: false });
        }
    }

    pub fn mark_unsaved(&mut self) {
        if !self.unsaved {
            self.unsaved = true;
            self.emit(ManagerEvent::UnsavedChanged { unsaved: true });
        }
    }

    pub fn new_workspace(&mut self) {
        self.stop_all();
        self.cues.clear();
        self.selected.clear();
        self.active.clear();
        self.clipboard.clear();
        self.expanded_groups.clear();
        self.standby = None;
        self.scheduler.clear();
        self.global_paused = false;
        self.unsaved = false;

        self.emit(ManagerEvent::WorkspaceCleared);
        self.emit(ManagerEvent::SelectionChanged);
        self.emit(ManagerEvent::StandbyChanged { id: None });
        self.emit(ManagerEvent::UnsavedChanged { unsaved: false });
    }

    pub fn load_workspace(&mut self, doc: &WorkspaceDoc) -> bool {
        self.new_workspace();

        for cue_doc in &doc.cues {
            match workspace::cue_from_doc(cue_doc) {
                Some(cue) => self.cues.push(cue),
                None => {
                    self.warn_msg(format!(
                        "Skipping unsupported cue type: {}",
                        cue_doc.cue_type
                    ));
                }
            }
        }

        if let Some(standby) = doc
            .standby_cue
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            self.set_standby(Some(standby));
        }
        if let Some(expanded) = &doc.expanded_groups {
            self.expanded_groups = expanded
                .iter()
                .filter_map(|s| Uuid::parse_str(s).ok())
                .filter(|id| self.get_cue(*id).is_some())
                .collect();
        }

        self.unsaved = false;
        self.emit(ManagerEvent::WorkspaceLoaded {
            cue_count: self.cues.len(),
        });
        self.info_msg(format!("Loaded workspace with {} cues", self.cues.len()));
        true
    }

    pub fn save_workspace(&self) -> WorkspaceDoc {
        let mut doc = WorkspaceDoc::empty();
        doc.cues = self.cues.iter().map(workspace::cue_to_doc).collect();
        doc.standby_cue = self.standby.map(|id| id.to_string());
        if !self.expanded_groups.is_empty() {
            doc.expanded_groups = Some(
                self.expanded_groups
                    .iter()
                    .map(|id| id.to_string())
                    .collect(),
            );
        }
        doc
    }

    pub fn load_workspace_file(&mut self, path: &Path) -> Result<(), WorkspaceError> {
        let doc = workspace::load_from_file(path)?;
        self.load_workspace(&doc);
        Ok(())
    }

    pub fn save_workspace_file(&mut self, path: &Path) -> Result<(), WorkspaceError> {
        let doc = self.save_workspace();
        workspace::save_to_file(path, &doc)?;
        self.mark_saved();
        Ok(())
    }

    // ---- execution preconditions ----

    /// Full execution precondition: the base cue contract plus per-type
    /// checks. A dangling target id makes a control cue non-executable; it
    /// never faults.
    pub fn can_execute(&self, id: Uuid) -> bool {
        let Some(cue) = self.get_cue(id) else {
            return false;
        };
        if !cue.is_ready() {
            return false;
        }
        match cue.kind() {
            CueKind::Audio(audio) => audio.has_valid_file(),
            CueKind::Wait(_) => true,
            CueKind::Control(control) => {
                !control.control_type().requires_target() || self.target_exists(cue)
            }
            CueKind::Group(group) => group
                .children()
                .iter()
                .any(|child| self.can_execute(child.id())),
        }
    }

    fn target_exists(&self, cue: &Cue) -> bool {
        cue.target_cue_id()
            .map(|t| self.get_cue(t).is_some())
            .unwrap_or(false)
    }

    /// Re-check a cue's type-specific preconditions and set its broken flag
    /// accordingly. Returns whether the cue is valid.
    pub fn validate_cue(&mut self, id: Uuid) -> bool {
        enum Check {
            AudioProbe,
            Settled(bool),
        }
        let check = match self.get_cue(id) {
            Some(cue) => match cue.kind() {
                CueKind::Audio(_) => Check::AudioProbe,
                CueKind::Control(control) => Check::Settled(
                    !control.control_type().requires_target() || self.target_exists(cue),
                ),
                CueKind::Wait(_) | CueKind::Group(_) => Check::Settled(true),
            },
            None => return false,
        };

        let valid = match check {
            Check::AudioProbe => self
                .with_cue_mut(id, |c| {
                    if let Some(audio) = c.as_audio_mut() {
                        audio.refresh_file_info();
                        audio.has_valid_file()
                    } else {
                        false
                    }
                })
                .unwrap_or(false),
            Check::Settled(valid) => valid,
        };
        self.with_cue_mut(id, |c| c.set_broken(!valid));
        valid
    }

    /// Reason a control cue cannot run, for inspector display.
    pub fn validation_error(&self, id: Uuid) -> Option<String> {
        let cue = self.get_cue(id)?;
        match cue.kind() {
            CueKind::Control(control) => {
                control.validation_error(cue.has_target(), self.target_exists(cue))
            }
            _ => {
                if cue.is_broken() {
                    Some("Cue is broken".to_string())
                } else {
                    None
                }
            }
        }
    }

    // ---- transport commands ----

    pub fn active_cue_ids(&self) -> &[Uuid] {
        &self.active
    }

    /// Execute the standby cue (or the first cue when none is set) and
    /// advance the standby pointer unconditionally, wrapping to none past
    /// the end of the list.
    pub fn go(&mut self) -> bool {
        let target = match self.standby.filter(|id| self.get_cue(*id).is_some()) {
            Some(id) => Some(id),
            None => self.cues.first().map(|c| c.id()),
        };
        let Some(id) = target else {
            self.warn_msg("No cues to execute");
            return false;
        };

        let started = self.execute_cue(id);
        if started && !self.active.contains(&id) {
            self.active.push(id);
        }
        self.emit(ManagerEvent::PlaybackStateChanged);

        let next = self
            .cue_index(id)
            .and_then(|i| self.cues.get(i + 1))
            .map(|c| c.id());
        self.set_standby(next);

        log::debug!("GO -> {} (started: {})", id, started);
        started
    }

    /// Stop every active cue and clear the active set.
    pub fn stop_all(&mut self) {
        let active: Vec<Uuid> = self.active.clone();
        for id in active {
            self.stop_cue(id, 0.0);
        }
        self.active.clear();
        self.global_paused = false;
        self.emit(ManagerEvent::PlaybackStateChanged);
    }

    /// Toggle pause/resume across all active cues as a group.
    pub fn pause_all(&mut self) {
        let active: Vec<Uuid> = self.active.clone();
        if !self.global_paused {
            for id in active {
                if self.get_cue(id).map(|c| c.status()) == Some(CueStatus::Running) {
                    self.pause_cue(id);
                }
            }
            self.global_paused = true;
        } else {
            for id in active {
                if self.get_cue(id).map(|c| c.status()) == Some(CueStatus::Paused) {
                    self.resume_cue(id);
                }
            }
            self.global_paused = false;
        }
        self.emit(ManagerEvent::PlaybackStateChanged);
    }

    /// Emergency stop: halt every cue immediately (no fades), drop every
    /// pending timer, clear the active set. Infallible by construction.
    pub fn panic(&mut self) {
        let ids: Vec<Uuid> = self.cues.iter().map(|c| c.id()).collect();
        for id in ids {
            self.stop_cue(id, 0.0);
        }
        self.active.clear();
        self.scheduler.clear();
        self.global_paused = false;
        self.emit(ManagerEvent::PlaybackStateChanged);
        self.error_msg("PANIC STOP");
    }

    // ---- time ----

    /// Advance the virtual clock, dispatching due tasks at their exact fire
    /// times, then poll audio completion and drain engine notifications.
    pub fn tick(&mut self, dt: f64) {
        let target = self.clock + dt.max(0.0);
        while let Some((fire_at, task)) = self.scheduler.pop_due(target) {
            self.clock = fire_at;
            self.dispatch(task);
        }
        self.clock = target;
        self.poll_audio();
        self.drain_engine_notifications();
    }

    fn dispatch(&mut self, task: Task) {
        let id = task.cue_id();
        let Some((epoch, status)) = self.get_cue(id).map(|c| (c.epoch(), c.status())) else {
            return;
        };
        if epoch != task.epoch() {
            // Stale timer from a run that was stopped or re-armed.
            return;
        }

        match task {
            Task::StartBody { .. } => {
                if status == CueStatus::Running && !self.start_cue_body(id) {
                    self.fail_cue(id);
                }
            }
            Task::FinishWait { .. } => {
                if status == CueStatus::Running {
                    self.finish_cue(id);
                }
            }
            Task::AutoContinue { .. } => {
                if let Some(next) = self
                    .cue_index(id)
                    .and_then(|i| self.cues.get(i + 1))
                    .map(|c| c.id())
                {
                    self.set_standby(Some(next));
                    self.go();
                }
            }
        }
    }

    fn poll_audio(&mut self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };

        let mut players = Vec::new();
        collect_audio_players(&self.cues, &mut players);

        let mut finished = Vec::new();
        let mut stale = Vec::new();
        for (cue_id, player_id) in players {
            let status = self.get_cue(cue_id).map(|c| c.status());
            if status == Some(CueStatus::Running) && engine.is_finished(player_id) {
                finished.push(cue_id);
            } else if !status.map(|s| s.is_active()).unwrap_or(false)
                && !engine.is_playing(player_id)
                && !engine.is_paused(player_id)
            {
                // Fade-outs that have gone silent; release the player.
                stale.push((cue_id, player_id));
            }
        }

        for cue_id in finished {
            self.finish_cue(cue_id);
        }
        for (cue_id, player_id) in stale {
            if let Some(engine) = self.engine.as_mut() {
                engine.remove_player(player_id);
            }
            self.with_cue_mut(cue_id, |c| {
                if let Some(audio) = c.as_audio_mut() {
                    audio.player = None;
                }
            });
        }
    }

    fn drain_engine_notifications(&mut self) {
        let notifications = match self.engine.as_mut() {
            Some(engine) => engine.drain_notifications(),
            None => return,
        };
        for notif in notifications {
            let level = match notif.level {
                NotificationLevel::Info => MessageLevel::Info,
                NotificationLevel::Warning => MessageLevel::Warning,
                NotificationLevel::Error | NotificationLevel::Critical => MessageLevel::Error,
            };
            self.emit(ManagerEvent::Message {
                level,
                text: notif.message,
            });
        }
    }

    // ---- execution internals ----

    /// Start a cue: precondition check, transition to Running, then either
    /// run the body now or defer it past the pre-wait.
    pub fn execute_cue(&mut self, id: Uuid) -> bool {
        if !self.can_execute(id) {
            let label = self
                .get_cue(id)
                .map(|c| format!("{} {}", c.number(), c.name()))
                .unwrap_or_else(|| id.to_string());
            self.warn_msg(format!("Cannot execute cue {}", label));
            return false;
        }

        // A wait with nothing to wait for declines rather than running.
        let zero_wait = self
            .get_cue(id)
            .map(|c| matches!(c.kind(), CueKind::Wait(_)) && c.duration() <= 0.0)
            .unwrap_or(false);
        if zero_wait {
            self.warn_msg("Wait cue has zero duration");
            return false;
        }

        let Some((pre_wait, epoch)) = self.with_cue_mut(id, |c| {
            let epoch = c.bump_epoch();
            c.set_status(CueStatus::Running);
            (c.pre_wait(), epoch)
        }) else {
            return false;
        };
        self.emit(ManagerEvent::CueUpdated { id });

        if pre_wait > 0.0 {
            self.scheduler
                .schedule(self.clock + pre_wait, Task::StartBody { cue_id: id, epoch });
            true
        } else {
            let ok = self.start_cue_body(id);
            if !ok {
                self.with_cue_mut(id, |c| c.set_status(CueStatus::Loaded));
            }
            ok
        }
    }

    /// Run the type-specific body once any pre-wait has elapsed.
    fn start_cue_body(&mut self, id: Uuid) -> bool {
        enum Body {
            Wait(f64),
            Control,
            Audio,
            Group,
        }
        let body = match self.get_cue(id) {
            Some(cue) => match cue.kind() {
                CueKind::Wait(_) => Body::Wait(cue.duration()),
                CueKind::Control(_) => Body::Control,
                CueKind::Audio(_) => Body::Audio,
                CueKind::Group(_) => Body::Group,
            },
            None => return false,
        };

        match body {
            Body::Wait(duration) => {
                let now = self.clock;
                let Some(epoch) = self.with_cue_mut(id, |c| {
                    let epoch = c.epoch();
                    if let Some(wait) = c.as_wait_mut() {
                        wait.arm(now, duration);
                    }
                    epoch
                }) else {
                    return false;
                };
                self.scheduler
                    .schedule(now + duration, Task::FinishWait { cue_id: id, epoch });
                true
            }
            Body::Control => {
                self.execute_control(id);
                self.finish_cue(id);
                true
            }
            Body::Audio => self.start_audio(id),
            Body::Group => self.start_group(id),
        }
    }

    fn start_audio(&mut self, id: Uuid) -> bool {
        let params = self.get_cue(id).and_then(|c| {
            c.as_audio().map(|a| {
                (
                    a.file_path().to_string(),
                    a.volume(),
                    a.pan(),
                    a.rate(),
                    a.start_time(),
                    a.end_time(),
                    a.loop_enabled(),
                    a.player,
                )
            })
        });
        let Some((path, volume, pan, rate, start, end, looping, old_player)) = params else {
            return false;
        };

        if path.is_empty() {
            self.error_msg("Audio cue has no file path set");
            return false;
        }
        if self.engine.is_none() {
            self.error_msg("Audio engine not initialized");
            return false;
        }

        let created = {
            let Some(engine) = self.engine.as_mut() else {
                return false;
            };
            if let Some(old) = old_player {
                engine.remove_player(old);
            }
            match engine.create_player(Path::new(&path)) {
                Ok(player_id) => {
                    engine.set_volume(player_id, volume);
                    engine.set_pan(player_id, pan);
                    engine.set_rate(player_id, rate);
                    engine.set_looping(player_id, looping);
                    engine.set_region(player_id, start, end);
                    engine.play(player_id);
                    Ok((player_id, engine.duration(player_id)))
                }
                Err(err) => Err(err),
            }
        };

        match created {
            Ok((player_id, duration)) => {
                self.with_cue_mut(id, |c| {
                    if duration > 0.0 {
                        c.set_duration(duration);
                    }
                    if let Some(audio) = c.as_audio_mut() {
                        audio.player = Some(player_id);
                        let info = audio.file_info_mut();
                        info.duration = duration;
                        info.valid = true;
                    }
                });
                true
            }
            Err(err) => {
                self.error_msg(format!("Failed to start audio cue: {}", err));
                false
            }
        }
    }

    fn start_group(&mut self, id: Uuid) -> bool {
        let Some((mode, child_ids)) = self.get_cue(id).and_then(|c| {
            c.as_group().map(|g| {
                (
                    g.mode(),
                    g.children().iter().map(|c| c.id()).collect::<Vec<_>>(),
                )
            })
        }) else {
            return false;
        };

        match mode {
            GroupMode::Sequential => {
                for (index, child_id) in child_ids.iter().enumerate() {
                    if self.can_execute(*child_id) && self.execute_cue(*child_id) {
                        let started = *child_id;
                        self.with_cue_mut(id, |c| {
                            if let Some(group) = c.as_group_mut() {
                                group.current_index = index;
                                group.active_children = vec![started];
                            }
                        });
                        return true;
                    }
                }
                // Nothing executable: finish immediately.
                self.finish_cue(id);
                true
            }
            GroupMode::Simultaneous => {
                let mut started = Vec::new();
                for child_id in &child_ids {
                    if self.can_execute(*child_id) && self.execute_cue(*child_id) {
                        started.push(*child_id);
                    }
                }
                if started.is_empty() {
                    self.finish_cue(id);
                } else {
                    self.with_cue_mut(id, |c| {
                        if let Some(group) = c.as_group_mut() {
                            group.active_children = started;
                        }
                    });
                }
                true
            }
        }
    }

    /// One targeted operation against the control cue's target, resolved by
    /// id at execution time. Missing targets report and mutate nothing,
    /// except Pause's global fallback.
    fn execute_control(&mut self, id: Uuid) -> bool {
        let Some((control_type, fade_time, target)) = self.get_cue(id).and_then(|c| {
            c.as_control()
                .map(|ctl| (ctl.control_type(), ctl.fade_time(), c.target_cue_id()))
        }) else {
            return false;
        };
        let resolved = target.filter(|t| self.get_cue(*t).is_some());

        match control_type {
            ControlType::Start => {
                let Some(target_id) = resolved else {
                    self.error_msg("Cannot start - target cue not found");
                    return false;
                };
                if !self.can_execute(target_id) {
                    let name = self
                        .get_cue(target_id)
                        .map(|c| c.name().to_string())
                        .unwrap_or_default();
                    self.warn_msg(format!("Cannot start target cue: {}", name));
                    return false;
                }
                let ok = self.execute_cue(target_id);
                if ok && self.cue_index(target_id).is_some() && !self.active.contains(&target_id)
                {
                    self.active.push(target_id);
                    self.emit(ManagerEvent::PlaybackStateChanged);
                }
                ok
            }
            ControlType::Stop => {
                let Some(target_id) = resolved else {
                    self.error_msg("Cannot stop - target cue not found");
                    return false;
                };
                self.stop_cue(target_id, fade_time);
                self.active.retain(|a| *a != target_id);
                self.emit(ManagerEvent::PlaybackStateChanged);
                true
            }
            ControlType::Goto | ControlType::Load => {
                let Some(target_id) = resolved else {
                    self.error_msg("Cannot goto - target cue not found");
                    return false;
                };
                self.set_standby(Some(target_id));
                true
            }
            ControlType::Pause => {
                match resolved {
                    Some(target_id) => {
                        match self.get_cue(target_id).map(|c| c.status()) {
                            Some(CueStatus::Running) => self.pause_cue(target_id),
                            Some(CueStatus::Paused) => self.resume_cue(target_id),
                            _ => {}
                        }
                        self.emit(ManagerEvent::PlaybackStateChanged);
                    }
                    None => self.pause_all(),
                }
                true
            }
            ControlType::Reset => {
                let Some(target_id) = resolved else {
                    self.error_msg("Cannot reset - target cue not found");
                    return false;
                };
                self.stop_cue(target_id, 0.0);
                self.with_cue_mut(target_id, |c| c.set_status(CueStatus::Loaded));
                self.active.retain(|a| *a != target_id);
                true
            }
            ControlType::Arm | ControlType::Disarm => {
                let Some(target_id) = resolved else {
                    self.error_msg("Cannot arm - target cue not found");
                    return false;
                };
                let armed = control_type == ControlType::Arm;
                self.with_cue_mut(target_id, |c| c.set_armed(armed));
                self.emit(ManagerEvent::CueUpdated { id: target_id });
                true
            }
            ControlType::Devamp => {
                let Some(target_id) = resolved else {
                    self.error_msg("Cannot devamp - target cue not found");
                    return false;
                };
                let fade = if fade_time > 0.0 {
                    fade_time
                } else {
                    DEFAULT_DEVAMP_FADE
                };
                self.stop_cue(target_id, fade);
                self.active.retain(|a| *a != target_id);
                self.emit(ManagerEvent::PlaybackStateChanged);
                true
            }
        }
    }

    /// Stop one cue. Always safe; idempotent; fades apply to audio only.
    /// The state flips immediately even when an audio fade-out is still
    /// ringing down.
    pub fn stop_cue(&mut self, id: Uuid, fade_time: f64) {
        let Some(cue) = self.get_cue(id) else {
            return;
        };
        let prev_status = cue.status();

        let plan = match cue.kind() {
            CueKind::Audio(audio) => Plan::Audio(audio.player),
            CueKind::Wait(_) => Plan::Wait,
            CueKind::Control(_) => Plan::Control,
            CueKind::Group(group) => Plan::Group(
                group
                    .children()
                    .iter()
                    .filter(|c| c.status().is_active())
                    .map(|c| c.id())
                    .collect(),
            ),
        };

        let new_status = match plan {
            Plan::Audio(player) => {
                if let Some(player_id) = player {
                    if let Some(engine) = self.engine.as_mut() {
                        if fade_time > 0.0 {
                            engine.set_fade_out(player_id, fade_time);
                        } else {
                            engine.stop(player_id);
                            engine.remove_player(player_id);
                        }
                    }
                    if fade_time <= 0.0 {
                        self.with_cue_mut(id, |c| {
                            if let Some(audio) = c.as_audio_mut() {
                                audio.player = None;
                            }
                        });
                    }
                }
                CueStatus::Stopped
            }
            Plan::Wait => {
                self.with_cue_mut(id, |c| {
                    if let Some(wait) = c.as_wait_mut() {
                        wait.reset();
                    }
                });
                CueStatus::Loaded
            }
            Plan::Control => CueStatus::Loaded,
            // `plan` above is built only from Audio/Wait/Control/Group, so this
            // variant cannot reach here; the arm exists solely for exhaustiveness.
            Plan::WaitRemaining(_) => unreachable!("stop_cue never builds Plan::WaitRemaining"),
            Plan::Group(children) => {
                for child in children {
                    self.stop_cue(child, fade_time);
                }
                self.with_cue_mut(id, |c| {
                    if let Some(group) = c.as_group_mut() {
                        group.clear_runtime();
                    }
                });
                CueStatus::Loaded
            }
        };

        self.with_cue_mut(id, |c| {
            c.bump_epoch();
            c.set_status(new_status);
        });
        self.active.retain(|a| *a != id);

        if prev_status != new_status {
            self.emit(ManagerEvent::CueUpdated { id });
        }
    }

    /// Pause a running cue. No-op from any other state.
    pub fn pause_cue(&mut self, id: Uuid) {
        if self.get_cue(id).map(|c| c.status()) != Some(CueStatus::Running) {
            return;
        }
        let now = self.clock;
        let body_started = self.body_started(id);

        // Cancel pending timers; resume re-schedules from banked time.
        self.with_cue_mut(id, |c| {
            c.bump_epoch();
        });

        if body_started {
            let plan = self.get_cue(id).map(|c| match c.kind() {
                CueKind::Audio(audio) => Plan::Audio(audio.player),
                CueKind::Wait(_) => Plan::Wait,
                CueKind::Control(_) => Plan::Control,
                CueKind::Group(group) => Plan::Group(
                    group
                        .children()
                        .iter()
                        .filter(|c| c.status() == CueStatus::Running)
                        .map(|c| c.id())
                        .collect(),
                ),
            });
            match plan {
                Some(Plan::Audio(Some(player_id))) => {
                    if let Some(engine) = self.engine.as_ref() {
                        engine.pause(player_id);
                    }
                }
                Some(Plan::Wait) => {
                    self.with_cue_mut(id, |c| {
                        if let Some(wait) = c.as_wait_mut() {
                            wait.pause(now);
                        }
                    });
                }
                Some(Plan::Group(children)) => {
                    for child in children {
                        self.pause_cue(child);
                    }
                }
                _ => {}
            }
        }

        self.with_cue_mut(id, |c| c.set_status(CueStatus::Paused));
        self.emit(ManagerEvent::CueUpdated { id });
    }

    /// Resume a paused cue. No-op from any other state. A cue paused during
    /// its pre-wait restarts the full pre-wait.
    pub fn resume_cue(&mut self, id: Uuid) {
        if self.get_cue(id).map(|c| c.status()) != Some(CueStatus::Paused) {
            return;
        }
        let now = self.clock;
        let body_started = self.body_started(id);

        let Some(epoch) = self.with_cue_mut(id, |c| {
            c.set_status(CueStatus::Running);
            c.bump_epoch()
        }) else {
            return;
        };

        if !body_started {
            let pre_wait = self.get_cue(id).map(|c| c.pre_wait()).unwrap_or(0.0);
            self.scheduler
                .schedule(now + pre_wait, Task::StartBody { cue_id: id, epoch });
        } else {
            let plan = self.get_cue(id).map(|c| match c.kind() {
                CueKind::Audio(audio) => Plan::Audio(audio.player),
                CueKind::Wait(wait) => Plan::WaitRemaining(wait.remaining(now)),
                CueKind::Control(_) => Plan::Control,
                CueKind::Group(group) => Plan::Group(
                    group
                        .children()
                        .iter()
                        .filter(|c| c.status() == CueStatus::Paused)
                        .map(|c| c.id())
                        .collect(),
                ),
            });
            match plan {
                Some(Plan::Audio(Some(player_id))) => {
                    if let Some(engine) = self.engine.as_ref() {
                        engine.resume(player_id);
                    }
                }
                Some(Plan::WaitRemaining(remaining)) => {
                    self.with_cue_mut(id, |c| {
                        if let Some(wait) = c.as_wait_mut() {
                            wait.resume(now);
                        }
                    });
                    self.scheduler
                        .schedule(now + remaining, Task::FinishWait { cue_id: id, epoch });
                }
                Some(Plan::Group(children)) => {
                    for child in children {
                        self.resume_cue(child);
                    }
                }
                _ => {}
            }
        }

        self.emit(ManagerEvent::CueUpdated { id });
    }

    /// Natural completion: release resources, mark Finished, propagate to
    /// the owning group or fire post-wait auto-continue at the top level.
    fn finish_cue(&mut self, id: Uuid) {
        // Release any audio player before the status flips.
        let player = self
            .get_cue(id)
            .and_then(|c| c.as_audio())
            .and_then(|a| a.player);
        if let Some(player_id) = player
            && let Some(engine) = self.engine.as_mut()
        {
            engine.remove_player(player_id);
        }

        self.with_cue_mut(id, |c| {
            c.set_status(CueStatus::Finished);
            match c.kind_mut() {
                CueKind::Wait(wait) => wait.reset(),
                CueKind::Audio(audio) => audio.player = None,
                CueKind::Group(group) => group.clear_runtime(),
                CueKind::Control(_) => {}
            }
        });
        self.emit(ManagerEvent::CueUpdated { id });

        self.propagate_completion(id, true);
    }

    /// Deferred start failure: back to Loaded, then propagate like a finish
    /// so sequential groups keep moving, without triggering auto-continue.
    fn fail_cue(&mut self, id: Uuid) {
        self.with_cue_mut(id, |c| c.set_status(CueStatus::Loaded));
        self.emit(ManagerEvent::CueUpdated { id });
        self.propagate_completion(id, false);
    }

    fn propagate_completion(&mut self, id: Uuid, natural: bool) {
        let parent = self.parent_of(id).filter(|p| {
            self.get_cue(*p).map(|c| c.status()) == Some(CueStatus::Running)
        });

        if let Some(group_id) = parent {
            let mode = self
                .get_cue(group_id)
                .and_then(|c| c.as_group())
                .map(|g| g.mode());
            match mode {
                Some(GroupMode::Sequential) => self.advance_sequential(group_id, id),
                Some(GroupMode::Simultaneous) => {
                    let empty = self
                        .with_cue_mut(group_id, |c| {
                            if let Some(group) = c.as_group_mut() {
                                group.active_children.retain(|a| *a != id);
                                group.active_children.is_empty()
                            } else {
                                true
                            }
                        })
                        .unwrap_or(true);
                    if empty {
                        self.finish_cue(group_id);
                    }
                }
                None => {}
            }
        } else {
            self.active.retain(|a| *a != id);
            self.emit(ManagerEvent::PlaybackStateChanged);

            if natural && self.cue_index(id).is_some() {
                let info = self
                    .get_cue(id)
                    .filter(|c| c.continue_mode())
                    .map(|c| (c.post_wait(), c.epoch()));
                if let Some((post_wait, epoch)) = info {
                    self.scheduler.schedule(
                        self.clock + post_wait,
                        Task::AutoContinue { cue_id: id, epoch },
                    );
                }
            }
        }
    }

    /// Sequential scheduling: a finished child hands off to the next
    /// executable child in stored order; exhaustion finishes the group.
    fn advance_sequential(&mut self, group_id: Uuid, finished_child: Uuid) {
        let from = self
            .get_cue(group_id)
            .and_then(|c| c.as_group())
            .and_then(|g| g.child_index(finished_child))
            .map(|i| i + 1)
            .unwrap_or(0);

        self.with_cue_mut(group_id, |c| {
            if let Some(group) = c.as_group_mut() {
                group.active_children.retain(|a| *a != finished_child);
            }
        });

        self.advance_sequential_from(group_id, from);
    }

    /// Start the first executable child at or after `start_index`, or finish
    /// the group when none remains.
    fn advance_sequential_from(&mut self, group_id: Uuid, start_index: usize) {
        let Some(child_ids) = self
            .get_cue(group_id)
            .and_then(|c| c.as_group())
            .map(|g| g.children().iter().map(|c| c.id()).collect::<Vec<_>>())
        else {
            return;
        };

        for index in start_index..child_ids.len() {
            let child_id = child_ids[index];
            if self.can_execute(child_id) && self.execute_cue(child_id) {
                self.with_cue_mut(group_id, |c| {
                    if let Some(group) = c.as_group_mut() {
                        group.current_index = index;
                        group.active_children = vec![child_id];
                    }
                });
                return;
            }
        }

        self.finish_cue(group_id);
    }

    /// Whether the cue's body (as opposed to its pre-wait) has begun.
    fn body_started(&self, id: Uuid) -> bool {
        match self.get_cue(id).map(|c| c.kind()) {
            Some(CueKind::Audio(audio)) => audio.player.is_some(),
            Some(CueKind::Wait(wait)) => wait.is_engaged(),
            Some(CueKind::Group(group)) => !group.active_children.is_empty(),
            Some(CueKind::Control(_)) | None => false,
        }
    }

    // ---- internal bookkeeping ----

    fn flat_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::new();
        collect_ids(&self.cues, &mut ids);
        ids
    }

    /// Drop references to ids that no longer resolve anywhere in the tree.
    fn prune_stale_refs(&mut self) {
        let ids = self.flat_ids();
        self.selected.retain(|id| ids.contains(id));
        self.active.retain(|id| ids.contains(id));
        self.expanded_groups.retain(|id| ids.contains(id));
        if let Some(standby) = self.standby
            && !ids.contains(&standby)
        {
            self.standby = None;
            self.emit(ManagerEvent::StandbyChanged { id: None });
        }
    }
}

/// Per-kind action plans gathered before mutation, so reads of the cue tree
/// never overlap writes.
enum Plan {
    Audio(Option<PlayerId>),
    Wait,
    WaitRemaining(f64),
    Control,
    Group(Vec<Uuid>),
}

impl Default for CueManager {
    fn default() -> Self {
        Self::new()
    }
}

// ---- tree helpers ----

fn find_in(cues: &[Cue], id: Uuid) -> Option<&Cue> {
    for cue in cues {
        if cue.id() == id {
            return Some(cue);
        }
        if let Some(group) = cue.as_group()
            && let Some(found) = find_in(group.children(), id)
        {
            return Some(found);
        }
    }
    None
}

fn path_to(cues: &[Cue], id: Uuid) -> Option<Vec<usize>> {
    for (i, cue) in cues.iter().enumerate() {
        if cue.id() == id {
            return Some(vec![i]);
        }
        if let Some(group) = cue.as_group()
            && let Some(mut rest) = path_to(group.children(), id)
        {
            let mut path = vec![i];
            path.append(&mut rest);
            return Some(path);
        }
    }
    None
}

fn cue_at_path<'a>(cues: &'a [Cue], path: &[usize]) -> Option<&'a Cue> {
    let (&first, rest) = path.split_first()?;
    let cue = cues.get(first)?;
    if rest.is_empty() {
        Some(cue)
    } else {
        cue.as_group()
            .and_then(|group| cue_at_path(group.children(), rest))
    }
}

fn cue_at_path_mut<'a>(cues: &'a mut [Cue], path: &[usize]) -> Option<&'a mut Cue> {
    let (&first, rest) = path.split_first()?;
    let cue = cues.get_mut(first)?;
    if rest.is_empty() {
        Some(cue)
    } else {
        cue.as_group_mut()
            .and_then(|group| cue_at_path_mut(group.children_mut(), rest))
    }
}

fn collect_ids(cues: &[Cue], out: &mut Vec<Uuid>) {
    for cue in cues {
        out.push(cue.id());
        if let Some(group) = cue.as_group() {
            collect_ids(group.children(), out);
        }
    }
}

fn collect_audio_players(cues: &[Cue], out: &mut Vec<(Uuid, PlayerId)>) {
    for cue in cues {
        if let Some(audio) = cue.as_audio()
            && let Some(player) = audio.player
        {
            out.push((cue.id(), player));
        }
        if let Some(group) = cue.as_group() {
            collect_audio_players(group.children(), out);
        }
    }
}
