use anyhow::Result;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::utils::preview_text;

/// Append-only record of every change made through the console.
pub struct AuditLog {
    log_file: PathBuf,
    metrics: Mutex<ActivityMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityMetrics {
    pub total_actions: usize,
    pub applied: usize,
    pub rejected: usize,
}

impl ActivityMetrics {
    pub fn rejection_rate(&self) -> f64 {
        if self.total_actions == 0 {
            return 0.0;
        }
        (self.rejected as f64 / self.total_actions as f64) * 100.0
    }
}

impl AuditLog {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(log_dir);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = dir.join(format!("audit_{}.log", timestamp));

        Ok(Self {
            log_file,
            metrics: Mutex::new(ActivityMetrics::default()),
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_file
    }

    fn write_line(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    fn bump(&self, applied: bool) {
        if let Ok(mut m) = self.metrics.lock() {
            m.total_actions += 1;
            if applied {
                m.applied += 1;
            } else {
                m.rejected += 1;
            }
        }
    }

    /// A change that took effect. Write failures are reported, never fatal.
    pub fn applied(&self, action: &str, detail: &str) {
        self.bump(true);
        if let Err(e) = self.write_line(&format!("APPLIED {}: {}", action, preview_text(detail, 200))) {
            tracing::warn!(error = %e, "failed to write audit log");
        }
    }

    /// A change refused by validation or a missing target.
    pub fn rejected(&self, action: &str, reason: &str) {
        self.bump(false);
        if let Err(e) = self.write_line(&format!("REJECTED {}: {}", action, preview_text(reason, 200))) {
            tracing::warn!(error = %e, "failed to write audit log");
        }
    }

    pub fn metrics(&self) -> ActivityMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_rate_zero_actions() {
        assert_eq!(ActivityMetrics::default().rejection_rate(), 0.0);
    }

    #[test]
    fn test_rejection_rate_calculation() {
        let metrics = ActivityMetrics {
            total_actions: 8,
            applied: 6,
            rejected: 2,
        };
        assert_eq!(metrics.rejection_rate(), 25.0);
    }

    #[test]
    fn test_audit_log_creation() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested");
        let log = AuditLog::new(log_dir.to_str().unwrap()).unwrap();
        assert!(log.path().parent().unwrap().exists());
    }

    #[test]
    fn test_audit_entries_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().to_str().unwrap()).unwrap();

        log.applied("bot.create", "Helper");
        log.rejected("bot.create", "Bot name is required");
        log.applied("bot.toggle", "coding-bot-01 -> inactive");

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("APPLIED bot.create: Helper"));
        assert!(content.contains("REJECTED bot.create: Bot name is required"));
        assert_eq!(content.lines().count(), 3);

        let metrics = log.metrics();
        assert_eq!(metrics.total_actions, 3);
        assert_eq!(metrics.applied, 2);
        assert_eq!(metrics.rejected, 1);
    }
}
