// Group cue: an ordered, owned sequence of child cues executed either one
// after another or all at once. The group's duration is always derived from
// its children, never stored.

use uuid::Uuid;

use crate::cue::Cue;

/// Child execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupMode {
    #[default]
    Sequential,
    Simultaneous,
}

impl GroupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupMode::Sequential => "Sequential",
            GroupMode::Simultaneous => "Simultaneous",
        }
    }

    /// Unknown strings fall back to Sequential.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("simultaneous") || s.eq_ignore_ascii_case("parallel") {
            GroupMode::Simultaneous
        } else {
            GroupMode::Sequential
        }
    }
}

/// Type-specific payload of a group cue.
#[derive(Debug, Clone, Default)]
pub struct GroupCue {
    children: Vec<Cue>,
    mode: GroupMode,
    /// Ids of children currently executing (transient).
    pub(crate) active_children: Vec<Uuid>,
    /// Sequential cursor: index of the child last started (transient).
    pub(crate) current_index: usize,
}

impl GroupCue {
    pub fn new(mode: GroupMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> GroupMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: GroupMode) -> bool {
        if self.mode != mode {
            self.mode = mode;
            true
        } else {
            false
        }
    }

    pub fn children(&self) -> &[Cue] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Cue> {
        &mut self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child_index(&self, id: Uuid) -> Option<usize> {
        self.children.iter().position(|c| c.id() == id)
    }

    pub(crate) fn add_child(&mut self, child: Cue) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Option<Cue> {
        if index < self.children.len() {
            let child = self.children.remove(index);
            self.active_children.retain(|id| *id != child.id());
            Some(child)
        } else {
            None
        }
    }

    /// Move every child out, leaving the group empty.
    pub(crate) fn take_children(&mut self) -> Vec<Cue> {
        self.active_children.clear();
        self.current_index = 0;
        std::mem::take(&mut self.children)
    }

    /// Derived duration: children's pre-wait + duration + post-wait summed
    /// for Sequential, maxed for Simultaneous.
    pub fn derived_duration(&self) -> f64 {
        match self.mode {
            GroupMode::Sequential => self.children.iter().map(Cue::total_span).sum(),
            GroupMode::Simultaneous => self
                .children
                .iter()
                .map(Cue::total_span)
                .fold(0.0, f64::max),
        }
    }

    pub(crate) fn clear_runtime(&mut self) {
        self.active_children.clear();
        self.current_index = 0;
    }
}
