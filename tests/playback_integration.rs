//! Playback integration tests
//!
//! Drives the manager's virtual clock through GO, group scheduling,
//! auto-continue and pause/resume scenarios. No wall-clock sleeps: the
//! scheduler dispatches at exact fire times, so every assertion below is
//! deterministic.

use uuid::Uuid;

use cuedeck::{CueManager, CueStatus, CueType, GroupMode};

fn status_of(manager: &CueManager, id: Uuid) -> CueStatus {
    manager.get_cue(id).unwrap().status()
}

fn wait_cues(manager: &mut CueManager, durations: &[f64]) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for d in durations {
        let id = manager.create_cue(CueType::Wait, None).unwrap();
        let duration = *d;
        manager.update_cue(id, |c| c.set_duration(duration));
        ids.push(id);
    }
    ids
}

fn group_of(manager: &mut CueManager, ids: &[Uuid], mode: GroupMode) -> Uuid {
    manager.clear_selection();
    for id in ids {
        manager.add_to_selection(*id);
    }
    let group = manager.create_group_from_selection("Group").unwrap();
    manager.update_cue(group, |c| c.set_group_mode(mode));
    group
}

/// A running wait finishes exactly when its duration elapses.
#[test]
fn test_wait_cue_finishes_on_time() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0]);

    assert!(manager.go());
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);
    assert_eq!(manager.active_cue_ids(), &[ids[0]]);

    manager.tick(0.999);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);

    manager.tick(0.002);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
    assert!(manager.active_cue_ids().is_empty());
}

/// Sequential group: children run strictly one after another, in stored
/// order, and the group finishes after the last child.
#[test]
fn test_sequential_group_chains_children() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 1.0, 1.0]);
    let group = group_of(&mut manager, &ids, GroupMode::Sequential);

    manager.set_standby(Some(group));
    assert!(manager.go());

    // Only the first child starts
    assert_eq!(status_of(&manager, group), CueStatus::Running);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Loaded);
    assert_eq!(status_of(&manager, ids[2]), CueStatus::Loaded);

    manager.tick(0.5);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Loaded);

    // Crossing t=1.0 hands off to the second child
    manager.tick(0.6);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Running);
    assert_eq!(status_of(&manager, ids[2]), CueStatus::Loaded);
    assert_eq!(status_of(&manager, group), CueStatus::Running);

    // Chained timing is exact: child 2 finishes at t=2.0, child 3 at t=3.0
    manager.tick(1.0);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Finished);
    assert_eq!(status_of(&manager, ids[2]), CueStatus::Running);

    manager.tick(0.95);
    assert_eq!(status_of(&manager, group), CueStatus::Finished);
    assert_eq!(status_of(&manager, ids[2]), CueStatus::Finished);
}

/// Sequential group skips children that cannot execute, without reordering.
#[test]
fn test_sequential_group_skips_non_executable() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 1.0, 1.0]);
    let group = group_of(&mut manager, &ids, GroupMode::Sequential);
    manager.update_cue(ids[1], |c| c.set_armed(false));

    manager.set_standby(Some(group));
    assert!(manager.go());
    manager.tick(1.1);

    // The disarmed middle child was skipped straight to the third
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Loaded);
    assert_eq!(status_of(&manager, ids[2]), CueStatus::Running);

    manager.tick(1.0);
    assert_eq!(status_of(&manager, group), CueStatus::Finished);
}

/// Parallel group: all children start together; the group finishes only
/// when the last child reports finished.
#[test]
fn test_parallel_group_waits_for_last_child() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 2.0]);
    let group = group_of(&mut manager, &ids, GroupMode::Simultaneous);

    manager.set_standby(Some(group));
    assert!(manager.go());

    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Running);

    // After ~1s the short child is done but the group is not
    manager.tick(1.05);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Running);
    assert_eq!(status_of(&manager, group), CueStatus::Running);

    // Only after ~2s does the group finish
    manager.tick(1.0);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Finished);
    assert_eq!(status_of(&manager, group), CueStatus::Finished);
}

/// A parallel group whose children are all non-executable finishes at once.
#[test]
fn test_parallel_group_with_no_executable_children() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 1.0]);
    let group = group_of(&mut manager, &ids, GroupMode::Simultaneous);
    for id in &ids {
        manager.update_cue(*id, |c| c.set_armed(false));
    }

    // The group itself refuses to run: no executable child
    assert!(!manager.can_execute(group));
    assert!(!manager.execute_cue(group));
    assert_eq!(status_of(&manager, group), CueStatus::Loaded);
}

/// Pre-wait delays the body; the cue reads as Running throughout.
#[test]
fn test_pre_wait_defers_the_body() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0]);
    manager.update_cue(ids[0], |c| c.set_pre_wait(0.5));

    assert!(manager.go());
    manager.tick(0.4);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);

    // Body starts at 0.5 and runs one second
    manager.tick(1.0);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);
    manager.tick(0.2);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
}

/// Auto-continue: a finished continue-mode cue fires a GO on the next cue
/// after its post-wait.
#[test]
fn test_auto_continue_fires_next_cue() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 1.0]);
    manager.update_cue(ids[0], |c| {
        c.set_continue_mode(true);
        c.set_post_wait(0.5);
    });

    assert!(manager.go());
    assert_eq!(manager.standby_cue_id(), Some(ids[1]));

    // Cue 1 finishes at t=1.0; the follow-on GO lands at t=1.5
    manager.tick(1.2);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Loaded);

    manager.tick(0.4);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Running);
    // The follow-on GO advanced standby past the end of the list
    assert_eq!(manager.standby_cue_id(), None);

    // And the chained cue finishes at t=2.5
    manager.tick(1.0);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Finished);
}

/// Stopping a continue-mode cue cancels its pending auto-continue.
#[test]
fn test_stop_cancels_auto_continue() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 1.0]);
    manager.update_cue(ids[0], |c| {
        c.set_continue_mode(true);
        c.set_post_wait(1.0);
    });

    assert!(manager.go());
    manager.tick(1.1); // finished; auto-continue pending at t=2.0
    manager.stop_cue(ids[0], 0.0);

    manager.tick(2.0);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Loaded);
}

/// Global pause toggles all active cues and banks their remaining time.
#[test]
fn test_global_pause_toggle() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[2.0]);

    assert!(manager.go());
    manager.tick(1.0);
    manager.pause_all();
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Paused);

    // Time passing while paused changes nothing
    manager.tick(5.0);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Paused);

    // Second toggle resumes; one second of countdown remains
    manager.pause_all();
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);
    manager.tick(0.9);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);
    manager.tick(0.2);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
}

/// Pause propagates into running group children and resume restores them.
#[test]
fn test_group_pause_propagates() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 2.0]);
    let group = group_of(&mut manager, &ids, GroupMode::Simultaneous);

    manager.set_standby(Some(group));
    assert!(manager.go());
    manager.tick(0.5);

    manager.pause_all();
    assert_eq!(status_of(&manager, group), CueStatus::Paused);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Paused);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Paused);

    manager.pause_all();
    assert_eq!(status_of(&manager, group), CueStatus::Running);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);

    // Remaining times picked up where they left off
    manager.tick(0.6);
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Finished);
    assert_eq!(status_of(&manager, ids[1]), CueStatus::Running);
    manager.tick(1.0);
    assert_eq!(status_of(&manager, group), CueStatus::Finished);
}

/// Goto and Load set the standby pointer without executing the target.
#[test]
fn test_goto_sets_standby_without_executing() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0, 1.0, 1.0]);
    let goto = manager.create_cue(CueType::Goto, None).unwrap();
    manager.update_cue(goto, |c| c.set_target_cue_id(Some(ids[2])));

    assert!(manager.execute_cue(goto));
    assert_eq!(manager.standby_cue_id(), Some(ids[2]));
    assert_eq!(status_of(&manager, ids[2]), CueStatus::Loaded);
    assert_eq!(status_of(&manager, goto), CueStatus::Finished);
}

/// Start and Stop control cues act on their target through the manager.
#[test]
fn test_start_and_stop_controls() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[5.0]);

    let start = manager.create_cue(CueType::Start, None).unwrap();
    manager.update_cue(start, |c| c.set_target_cue_id(Some(ids[0])));
    let stop = manager.create_cue(CueType::Stop, None).unwrap();
    manager.update_cue(stop, |c| c.set_target_cue_id(Some(ids[0])));

    assert!(manager.execute_cue(start));
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);
    // Control-started top-level targets join the active set
    assert!(manager.active_cue_ids().contains(&ids[0]));

    assert!(manager.execute_cue(stop));
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Loaded);
    assert!(!manager.active_cue_ids().contains(&ids[0]));
}

/// Pause control with a target toggles it; without one it falls back to the
/// global toggle.
#[test]
fn test_pause_control_variants() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[5.0]);
    let pause = manager.create_cue(CueType::Pause, None).unwrap();
    manager.update_cue(pause, |c| c.set_target_cue_id(Some(ids[0])));

    assert!(manager.go()); // starts the wait
    assert!(manager.execute_cue(pause));
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Paused);

    // A paused control cue re-executes (it finished instantly)
    assert!(manager.execute_cue(pause));
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Running);

    // Untargeted pause drives the global toggle
    let global_pause = manager.create_cue(CueType::Pause, None).unwrap();
    assert!(manager.execute_cue(global_pause));
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Paused);
}

/// Reset forces a stopped target back to Loaded.
#[test]
fn test_reset_control() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[5.0]);
    let reset = manager.create_cue(CueType::Reset, None).unwrap();
    manager.update_cue(reset, |c| c.set_target_cue_id(Some(ids[0])));

    assert!(manager.go());
    manager.tick(1.0);
    assert!(manager.execute_cue(reset));
    assert_eq!(status_of(&manager, ids[0]), CueStatus::Loaded);
    assert!(!manager.active_cue_ids().contains(&ids[0]));
}

/// Arm and Disarm flip the target's armed flag.
#[test]
fn test_arm_disarm_controls() {
    let mut manager = CueManager::new();
    let ids = wait_cues(&mut manager, &[1.0]);

    let disarm = manager.create_cue(CueType::Disarm, None).unwrap();
    manager.update_cue(disarm, |c| c.set_target_cue_id(Some(ids[0])));
    let arm = manager.create_cue(CueType::Arm, None).unwrap();
    manager.update_cue(arm, |c| c.set_target_cue_id(Some(ids[0])));

    assert!(manager.execute_cue(disarm));
    assert!(!manager.get_cue(ids[0]).unwrap().is_armed());
    assert!(!manager.can_execute(ids[0]));

    assert!(manager.execute_cue(arm));
    assert!(manager.get_cue(ids[0]).unwrap().is_armed());
    assert!(manager.can_execute(ids[0]));
}

/// Nested groups: a sequential group inside a parallel group completes
/// bottom-up.
#[test]
fn test_nested_group_completion() {
    let mut manager = CueManager::new();
    let inner_ids = wait_cues(&mut manager, &[1.0, 1.0]);
    let inner = group_of(&mut manager, &inner_ids, GroupMode::Sequential);
    let outer_peer = wait_cues(&mut manager, &[0.5]);
    let outer = group_of(&mut manager, &[inner, outer_peer[0]], GroupMode::Simultaneous);

    manager.set_standby(Some(outer));
    assert!(manager.go());

    assert_eq!(status_of(&manager, inner), CueStatus::Running);
    assert_eq!(status_of(&manager, inner_ids[0]), CueStatus::Running);
    assert_eq!(status_of(&manager, outer_peer[0]), CueStatus::Running);

    manager.tick(0.6);
    assert_eq!(status_of(&manager, outer_peer[0]), CueStatus::Finished);
    assert_eq!(status_of(&manager, outer), CueStatus::Running);

    manager.tick(1.5); // inner chain: 1.0 + 1.0
    assert_eq!(status_of(&manager, inner_ids[1]), CueStatus::Finished);
    assert_eq!(status_of(&manager, inner), CueStatus::Finished);
    assert_eq!(status_of(&manager, outer), CueStatus::Finished);
}
