//! Edge case tests and robustness validation
//!
//! Extreme and degenerate scenarios the engine must absorb without
//! crashing or corrupting state: dangling targets, repeated stops,
//! panic under load, out-of-range parameters.

use uuid::Uuid;

use cuedeck::{CueManager, CueStatus, CueType, ManagerEvent, MessageLevel};

fn wait_manager(count: usize) -> (CueManager, Vec<Uuid>) {
    let mut manager = CueManager::new();
    let mut ids = Vec::new();
    for _ in 0..count {
        let id = manager.create_cue(CueType::Wait, None).unwrap();
        manager.update_cue(id, |c| c.set_duration(1.0));
        ids.push(id);
    }
    manager.take_events();
    (manager, ids)
}

/// A control cue whose target id resolves to nothing must decline, not fault.
#[test]
fn test_dangling_target_is_safe() {
    let mut manager = CueManager::new();
    let start = manager.create_cue(CueType::Start, None).unwrap();
    manager.update_cue(start, |c| c.set_target_cue_id(Some(Uuid::new_v4())));

    assert!(!manager.can_execute(start));
    assert!(!manager.execute_cue(start));
    assert_eq!(
        manager.get_cue(start).unwrap().status(),
        CueStatus::Loaded
    );
}

/// The target dangles after its cue is removed; the control cue notices.
#[test]
fn test_target_dangles_after_removal() {
    let (mut manager, ids) = wait_manager(1);
    let stop = manager.create_cue(CueType::Stop, None).unwrap();
    manager.update_cue(stop, |c| c.set_target_cue_id(Some(ids[0])));
    assert!(manager.can_execute(stop));

    manager.remove_cue(ids[0]);
    assert!(!manager.can_execute(stop));
    assert!(!manager.execute_cue(stop));
}

/// Stop is idempotent for every cue type: repeated calls land in the same
/// terminal state and never fault.
#[test]
fn test_stop_is_idempotent() {
    let mut manager = CueManager::new();

    let wait = manager.create_cue(CueType::Wait, None).unwrap();
    let audio = manager.create_cue(CueType::Audio, None).unwrap();
    let goto = manager.create_cue(CueType::Goto, None).unwrap();

    for _ in 0..2 {
        manager.stop_cue(wait, 0.0);
        assert_eq!(manager.get_cue(wait).unwrap().status(), CueStatus::Loaded);
    }
    for _ in 0..2 {
        manager.stop_cue(audio, 0.0);
        assert_eq!(
            manager.get_cue(audio).unwrap().status(),
            CueStatus::Stopped
        );
    }
    for _ in 0..2 {
        manager.stop_cue(goto, 1.5);
        assert_eq!(manager.get_cue(goto).unwrap().status(), CueStatus::Loaded);
    }

    // Stopping a running wait twice
    manager.update_cue(wait, |c| c.set_duration(5.0));
    assert!(manager.execute_cue(wait));
    manager.stop_cue(wait, 0.0);
    manager.stop_cue(wait, 0.0);
    assert_eq!(manager.get_cue(wait).unwrap().status(), CueStatus::Loaded);
}

/// Panic always succeeds: with nothing active, with many active cues, and
/// immediately after a prior panic.
#[test]
fn test_panic_never_fails() {
    let mut manager = CueManager::new();
    manager.panic();
    assert!(manager.active_cue_ids().is_empty());

    let (mut manager, ids) = wait_manager(50);
    manager.update_cue(ids[0], |c| c.set_duration(60.0));
    for _ in 0..50 {
        manager.go();
    }
    assert_eq!(manager.active_cue_ids().len(), 50);

    manager.panic();
    assert!(manager.active_cue_ids().is_empty());
    for id in &ids {
        assert!(!manager.get_cue(*id).unwrap().status().is_active());
    }

    manager.panic();
    assert!(manager.active_cue_ids().is_empty());

    // The panic surfaced as an error-severity message
    let events = manager.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ManagerEvent::Message {
            level: MessageLevel::Error,
            ..
        }
    )));
}

/// Volume assignments outside the documented bounds always clamp.
#[test]
fn test_volume_clamps() {
    let mut manager = CueManager::new();
    let audio = manager.create_cue(CueType::Audio, None).unwrap();

    manager.update_cue(audio, |c| c.set_volume(-0.5));
    assert_eq!(
        manager.get_cue(audio).unwrap().as_audio().unwrap().volume(),
        0.0
    );

    manager.update_cue(audio, |c| c.set_volume(10.0));
    assert_eq!(
        manager.get_cue(audio).unwrap().as_audio().unwrap().volume(),
        cuedeck::config::MAX_VOLUME
    );
}

/// Disarmed and broken cues refuse execution until restored.
#[test]
fn test_disarmed_and_broken_refuse_execution() {
    let (mut manager, ids) = wait_manager(1);

    manager.update_cue(ids[0], |c| c.set_armed(false));
    assert!(!manager.execute_cue(ids[0]));

    manager.update_cue(ids[0], |c| c.set_armed(true));
    assert!(manager.can_execute(ids[0]));

    // A control cue validated against a missing target goes broken
    let start = manager.create_cue(CueType::Start, None).unwrap();
    assert!(!manager.validate_cue(start));
    assert_eq!(
        manager.get_cue(start).unwrap().status(),
        CueStatus::Broken
    );
    assert!(!manager.execute_cue(start));

    // Re-target and revalidate to clear the flag
    manager.update_cue(start, |c| c.set_target_cue_id(Some(ids[0])));
    assert!(manager.validate_cue(start));
    assert!(manager.can_execute(start));
}

/// A wait cue with zero duration declines instead of finishing instantly.
#[test]
fn test_zero_duration_wait_declines() {
    let mut manager = CueManager::new();
    let wait = manager.create_cue(CueType::Wait, None).unwrap();
    manager.update_cue(wait, |c| c.set_duration(0.0));
    manager.take_events();

    assert!(!manager.execute_cue(wait));
    assert_eq!(manager.get_cue(wait).unwrap().status(), CueStatus::Loaded);

    let events = manager.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ManagerEvent::Message {
            level: MessageLevel::Warning,
            ..
        }
    )));
}

/// Removing the executing child of a running group stops it first and hands
/// the slot onward instead of leaving the group hung.
#[test]
fn test_remove_running_child_from_sequential_group() {
    let (mut manager, ids) = wait_manager(2);
    manager.select_cue(ids[0]);
    manager.add_to_selection(ids[1]);
    let group = manager.create_group_from_selection("G").unwrap();

    manager.set_standby(Some(group));
    assert!(manager.go());
    assert_eq!(manager.get_cue(ids[0]).unwrap().status(), CueStatus::Running);

    assert!(manager.remove_cue(ids[0]));
    assert!(manager.get_cue(ids[0]).is_none());
    // The group moved on to the second child
    assert_eq!(manager.get_cue(group).unwrap().status(), CueStatus::Running);
    assert_eq!(manager.get_cue(ids[1]).unwrap().status(), CueStatus::Running);

    // Removing the last child finishes the group
    assert!(manager.remove_cue(ids[1]));
    assert_eq!(
        manager.get_cue(group).unwrap().status(),
        CueStatus::Finished
    );
}

/// Stopping an already-removed cue, or operating on unknown ids generally,
/// is a quiet no-op.
#[test]
fn test_unknown_ids_are_noops() {
    let mut manager = CueManager::new();
    let ghost = Uuid::new_v4();

    manager.stop_cue(ghost, 0.0);
    manager.pause_cue(ghost);
    manager.resume_cue(ghost);
    assert!(!manager.remove_cue(ghost));
    assert!(!manager.move_cue(ghost, 0));
    assert!(manager.duplicate_cue(ghost).is_none());
    assert!(!manager.execute_cue(ghost));
    assert!(manager.get_cue(ghost).is_none());
}

/// Batch paste keeps going past entries that cannot be constructed.
#[test]
fn test_paste_skips_bad_entries_without_aborting() {
    let (mut manager, ids) = wait_manager(2);
    manager.select_cue(ids[0]);
    manager.add_to_selection(ids[1]);
    manager.copy();

    // Pasting twice after deleting the originals still works
    manager.cut();
    assert_eq!(manager.cue_count(), 0);
    let pasted = manager.paste(None);
    assert_eq!(pasted.len(), 2);
    let pasted_again = manager.paste(None);
    assert_eq!(pasted_again.len(), 2);
    assert_eq!(manager.cue_count(), 4);
}
