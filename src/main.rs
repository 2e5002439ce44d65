// Headless operator console. Loads a workspace, attaches the audio engine
// when a device is available, and drives the cue manager from stdin
// commands while ticking its clock in the background.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use cuedeck::{AudioEngine, CueManager, CueStatus, HealthMonitor, ManagerEvent, MessageLevel};

const TICK_PERIOD: Duration = Duration::from_millis(20);

fn main() {
    env_logger::init();

    let mut manager = CueManager::new();
    let mut health = HealthMonitor::new();
    match AudioEngine::new() {
        Ok(engine) => manager.attach_engine(engine),
        Err(err) => {
            health.report_warning(&format!("no audio engine: {}", err), "engine");
            eprintln!("warning: no audio engine ({}); audio cues will not play", err);
        }
    }

    if let Some(path) = std::env::args().nth(1) {
        let path = PathBuf::from(path);
        match manager.load_workspace_file(&path) {
            Ok(()) => println!("Loaded {} ({} cues)", path.display(), manager.cue_count()),
            Err(err) => eprintln!("Failed to load {}: {}", path.display(), err),
        }
    }

    // stdin reader thread; the main loop stays free to tick the manager.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    println!("cuedeck console - go/stop/pause/panic/next/prev/list/health/load <f>/save <f>/quit");
    print_prompt(&manager);

    let mut last_tick = Instant::now();
    loop {
        let dt = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        manager.tick(dt);
        drain_events(&mut manager, &mut health);

        match line_rx.recv_timeout(TICK_PERIOD) {
            Ok(line) => {
                if !handle_command(&mut manager, &health, line.trim()) {
                    break;
                }
                drain_events(&mut manager, &mut health);
                print_prompt(&manager);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    manager.panic();
}

fn handle_command(manager: &mut CueManager, health: &HealthMonitor, line: &str) -> bool {
    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).unwrap_or("");

    match command {
        "" => {}
        "go" | "g" => {
            manager.go();
        }
        "stop" | "s" => manager.stop_all(),
        "pause" | "p" => manager.pause_all(),
        "panic" => manager.panic(),
        "next" | "n" => manager.next_cue(),
        "prev" => manager.previous_cue(),
        "list" | "l" => print_cue_list(manager),
        "health" => {
            println!(
                "{} | {} warnings, {} errors, {} critical",
                if health.is_healthy() { "healthy" } else { "UNHEALTHY" },
                health.warning_count(),
                health.error_count(),
                health.critical_count(),
            );
            for entry in health.unresolved() {
                println!("  [{}] {}: {}", entry.severity.as_str(), entry.source, entry.message);
            }
        }
        "load" => {
            if arg.is_empty() {
                println!("usage: load <file>");
            } else if let Err(err) = manager.load_workspace_file(Path::new(arg)) {
                println!("load failed: {}", err);
            }
        }
        "save" => {
            if arg.is_empty() {
                println!("usage: save <file>");
            } else if let Err(err) = manager.save_workspace_file(Path::new(arg)) {
                println!("save failed: {}", err);
            }
        }
        "quit" | "q" | "exit" => return false,
        other => println!("unknown command: {}", other),
    }
    true
}

fn print_cue_list(manager: &CueManager) {
    for cue in manager.cues() {
        let standby = if manager.standby_cue_id() == Some(cue.id()) {
            ">"
        } else {
            " "
        };
        let status = match cue.status() {
            CueStatus::Running => "*",
            CueStatus::Paused => "=",
            CueStatus::Broken => "!",
            _ => " ",
        };
        println!(
            "{}{} {:>3}  {:<24} {:>8} {:>6.1}s",
            standby,
            status,
            cue.number(),
            cue.name(),
            cue.cue_type().as_str(),
            cue.total_span(),
        );
        if let Some(group) = cue.as_group() {
            for child in group.children() {
                println!(
                    "       - {:<22} {:>8} {:>6.1}s",
                    child.name(),
                    child.cue_type().as_str(),
                    child.total_span(),
                );
            }
        }
    }
}

fn drain_events(manager: &mut CueManager, health: &mut HealthMonitor) {
    for event in manager.take_events() {
        match event {
            ManagerEvent::Message { level, text } => {
                let tag = match level {
                    MessageLevel::Info => "info",
                    MessageLevel::Warning => "warn",
                    MessageLevel::Error => "error",
                };
                match level {
                    MessageLevel::Info => health.report_info(&text, "manager"),
                    MessageLevel::Warning => health.report_warning(&text, "manager"),
                    MessageLevel::Error => health.report_error(&text, "manager"),
                };
                println!("[{}] {}", tag, text);
            }
            ManagerEvent::StandbyChanged { id } => {
                if let Some(cue) = id.and_then(|id| manager.get_cue(id)) {
                    println!("standby: {} {}", cue.number(), cue.name());
                }
            }
            _ => {}
        }
    }
}

fn print_prompt(manager: &CueManager) {
    let standby = manager
        .standby_cue_id()
        .and_then(|id| manager.get_cue(id))
        .map(|c| format!("{} {}", c.number(), c.name()))
        .unwrap_or_else(|| "-".to_string());
    print!(
        "[{} cues | {} active | standby: {}] ",
        manager.cue_count(),
        manager.active_cue_ids().len(),
        standby
    );
    let _ = std::io::stdout().flush();
}
