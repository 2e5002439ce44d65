// Control cue: one targeted operation against another cue.

use crate::cue::CueType;

/// The operation a control cue performs on its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    Start,
    Stop,
    Goto,
    Pause,
    Load,
    Reset,
    Arm,
    Disarm,
    Devamp,
}

impl ControlType {
    pub fn from_cue_type(cue_type: CueType) -> Option<Self> {
        match cue_type {
            CueType::Start => Some(ControlType::Start),
            CueType::Stop => Some(ControlType::Stop),
            CueType::Goto => Some(ControlType::Goto),
            CueType::Pause => Some(ControlType::Pause),
            CueType::Load => Some(ControlType::Load),
            CueType::Reset => Some(ControlType::Reset),
            CueType::Arm => Some(ControlType::Arm),
            CueType::Disarm => Some(ControlType::Disarm),
            CueType::Devamp => Some(ControlType::Devamp),
            _ => None,
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            ControlType::Start => "Start",
            ControlType::Stop => "Stop",
            ControlType::Goto => "Goto",
            ControlType::Pause => "Pause",
            ControlType::Load => "Load",
            ControlType::Reset => "Reset",
            ControlType::Arm => "Arm",
            ControlType::Disarm => "Disarm",
            ControlType::Devamp => "Devamp",
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            ControlType::Start => "#64ff64",
            ControlType::Stop => "#ff6464",
            ControlType::Goto => "#6496ff",
            ControlType::Pause => "#ffff64",
            ControlType::Load => "#c8c864",
            ControlType::Reset => "#ff9664",
            ControlType::Arm => "#64ffc8",
            ControlType::Disarm => "#c864ff",
            ControlType::Devamp => "#c83232",
        }
    }

    /// Pause without a target falls back to the manager's global toggle;
    /// every other operation needs a resolvable target.
    pub fn requires_target(&self) -> bool {
        !matches!(self, ControlType::Pause)
    }
}

/// Type-specific payload of a control cue.
#[derive(Debug, Clone)]
pub struct ControlCue {
    control_type: ControlType,
    fade_time: f64,
}

impl ControlCue {
    pub fn new(control_type: ControlType) -> Self {
        Self {
            control_type,
            fade_time: 0.0,
        }
    }

    pub fn control_type(&self) -> ControlType {
        self.control_type
    }

    pub fn fade_time(&self) -> f64 {
        self.fade_time
    }

    pub(crate) fn set_fade_time(&mut self, seconds: f64) -> bool {
        let seconds = seconds.max(0.0);
        if (self.fade_time - seconds).abs() > 1e-3 {
            self.fade_time = seconds;
            true
        } else {
            false
        }
    }

    /// Human-readable reason the cue cannot run, if any.
    pub fn validation_error(&self, has_target_id: bool, target_found: bool) -> Option<String> {
        if !self.control_type.requires_target() || target_found {
            return None;
        }
        if !has_target_id {
            Some("No target cue assigned".to_string())
        } else {
            Some("Target cue not found".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cue_type() {
        assert_eq!(
            ControlType::from_cue_type(CueType::Devamp),
            Some(ControlType::Devamp)
        );
        assert_eq!(ControlType::from_cue_type(CueType::Audio), None);
        assert_eq!(ControlType::from_cue_type(CueType::Group), None);
    }

    #[test]
    fn test_fade_time_clamps_negative() {
        let mut cue = ControlCue::new(ControlType::Stop);
        cue.set_fade_time(-2.0);
        assert_eq!(cue.fade_time(), 0.0);

        cue.set_fade_time(1.5);
        assert_eq!(cue.fade_time(), 1.5);
    }

    #[test]
    fn test_validation_error_messages() {
        let cue = ControlCue::new(ControlType::Start);
        assert_eq!(
            cue.validation_error(false, false).as_deref(),
            Some("No target cue assigned")
        );
        assert_eq!(
            cue.validation_error(true, false).as_deref(),
            Some("Target cue not found")
        );
        assert_eq!(cue.validation_error(true, true), None);

        // Pause tolerates a missing target
        let pause = ControlCue::new(ControlType::Pause);
        assert_eq!(pause.validation_error(false, false), None);
    }
}
