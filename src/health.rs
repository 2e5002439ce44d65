// Health monitor - diagnostic sink for error events
//
// Collects error reports from the cue manager and the audio engine, keeps a
// bounded history, and exposes an aggregate health signal. The monitor never
// participates in execution; it only observes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Severity of a reported problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "Info",
            ErrorSeverity::Warning => "Warning",
            ErrorSeverity::Error => "Error",
            ErrorSeverity::Critical => "Critical",
        }
    }
}

/// One reported problem
#[derive(Debug, Clone)]
pub struct ErrorEntry {
    pub id: Uuid,
    pub severity: ErrorSeverity,
    pub message: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

const DEFAULT_MAX_HISTORY: usize = 500;

/// Bounded error history with an aggregate health signal.
///
/// A system is healthy while no unresolved entry at Error severity or above
/// exists. `auto_recovery` is a host-consumed flag: when set, the host may
/// retry critical audio failures (best-effort, see the error-handling design).
pub struct HealthMonitor {
    entries: Vec<ErrorEntry>,
    max_history: usize,
    auto_recovery: bool,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_history: max_history.max(1),
            auto_recovery: false,
        }
    }

    /// Record a problem and return its entry id.
    pub fn report(&mut self, severity: ErrorSeverity, message: &str, source: &str) -> Uuid {
        let entry = ErrorEntry {
            id: Uuid::new_v4(),
            severity,
            message: message.to_string(),
            source: source.to_string(),
            timestamp: Utc::now(),
            resolved: false,
        };
        let id = entry.id;

        match severity {
            ErrorSeverity::Info => log::info!("[{}] {}", source, message),
            ErrorSeverity::Warning => log::warn!("[{}] {}", source, message),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                log::error!("[{}] {}", source, message)
            }
        }

        self.entries.push(entry);
        self.prune();
        id
    }

    pub fn report_info(&mut self, message: &str, source: &str) -> Uuid {
        self.report(ErrorSeverity::Info, message, source)
    }

    pub fn report_warning(&mut self, message: &str, source: &str) -> Uuid {
        self.report(ErrorSeverity::Warning, message, source)
    }

    pub fn report_error(&mut self, message: &str, source: &str) -> Uuid {
        self.report(ErrorSeverity::Error, message, source)
    }

    pub fn report_critical(&mut self, message: &str, source: &str) -> Uuid {
        self.report(ErrorSeverity::Critical, message, source)
    }

    /// Mark an entry resolved. Unknown ids are ignored.
    pub fn resolve(&mut self, id: Uuid) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.resolved = true;
        }
    }

    pub fn clear_resolved(&mut self) {
        self.entries.retain(|e| !e.resolved);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn unresolved(&self) -> Vec<&ErrorEntry> {
        self.entries.iter().filter(|e| !e.resolved).collect()
    }

    pub fn by_severity(&self, severity: ErrorSeverity) -> Vec<&ErrorEntry> {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.count_at(ErrorSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_at(ErrorSeverity::Warning)
    }

    pub fn critical_count(&self) -> usize {
        self.count_at(ErrorSeverity::Critical)
    }

    /// Healthy while nothing at Error severity or above is unresolved.
    pub fn is_healthy(&self) -> bool {
        !self
            .entries
            .iter()
            .any(|e| !e.resolved && e.severity >= ErrorSeverity::Error)
    }

    pub fn set_auto_recovery(&mut self, enabled: bool) {
        self.auto_recovery = enabled;
    }

    pub fn auto_recovery(&self) -> bool {
        self.auto_recovery
    }

    fn count_at(&self, severity: ErrorSeverity) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.resolved && e.severity == severity)
            .count()
    }

    fn prune(&mut self) {
        if self.entries.len() > self.max_history {
            let excess = self.entries.len() - self.max_history;
            self.entries.drain(..excess);
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_and_counts() {
        let mut monitor = HealthMonitor::new();

        monitor.report_info("started", "engine");
        monitor.report_warning("late buffer", "engine");
        let err = monitor.report_error("device lost", "engine");

        assert_eq!(monitor.warning_count(), 1);
        assert_eq!(monitor.error_count(), 1);
        assert_eq!(monitor.critical_count(), 0);
        assert!(!monitor.is_healthy());

        monitor.resolve(err);
        assert!(monitor.is_healthy());
        assert_eq!(monitor.error_count(), 0);
    }

    #[test]
    fn test_warnings_do_not_break_health() {
        let mut monitor = HealthMonitor::new();
        monitor.report_warning("select at least 2 cues to group", "manager");
        assert!(monitor.is_healthy());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut monitor = HealthMonitor::with_capacity(10);
        for i in 0..25 {
            monitor.report_info(&format!("event {}", i), "test");
        }
        assert_eq!(monitor.entries().len(), 10);
        // Oldest entries were pruned first
        assert_eq!(monitor.entries()[0].message, "event 15");
    }

    #[test]
    fn test_clear_resolved() {
        let mut monitor = HealthMonitor::new();
        let a = monitor.report_error("a", "test");
        monitor.report_error("b", "test");

        monitor.resolve(a);
        monitor.clear_resolved();

        assert_eq!(monitor.entries().len(), 1);
        assert_eq!(monitor.entries()[0].message, "b");
    }

    #[test]
    fn test_resolve_unknown_id_is_noop() {
        let mut monitor = HealthMonitor::new();
        monitor.report_error("a", "test");
        monitor.resolve(Uuid::new_v4());
        assert!(!monitor.is_healthy());
    }
}
