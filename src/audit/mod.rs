// file: src/audit/mod.rs
// version: 1.0.0
// guid: e8b4a6d0-3c72-4f18-95ae-6d09c8e21b47

//! Append-only security and execution audit log
//!
//! Every authorization decision and every execution attempt produces one
//! record here, persisted as one JSON line per record. The running process
//! never truncates or rewrites the active log; oversized logs are rotated
//! aside at startup and aged rotations are cleaned up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Audit event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AuthorizationGranted,
    AuthorizationDenied,
    AuthenticationFailed,
    SessionOpened,
    SessionClosed,
    TargetAuthorized,
    TargetPermitted,
    ExecutionCompleted,
    ExecutionFailed,
}

/// One audit log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_secs: Option<f64>,
}

impl AuditRecord {
    pub fn new(
        event_type: AuditEventType,
        user_id: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            user_id: user_id.into(),
            intent: None,
            tool: None,
            detail: detail.into(),
            execution_time_secs: None,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_execution_time(mut self, secs: f64) -> Self {
        self.execution_time_secs = Some(secs);
        self
    }
}

/// Rotate the active log once it exceeds this size
const ROTATE_BYTES: u64 = 10 * 1024 * 1024;

/// Keep rotated logs for this many days
const RETENTION_DAYS: i64 = 30;

const LOG_FILE_NAME: &str = "security_audit.jsonl";

/// Append-only audit log backed by a JSONL file
pub struct AuditLog {
    log_file: PathBuf,
    // Concurrent pipeline runs share one log; appends must not interleave.
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Open (creating if necessary) the audit log in the given directory
    pub fn new<P: AsRef<Path>>(dir: P) -> crate::Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let log_file = dir.join(LOG_FILE_NAME);
        rotate_if_needed(&log_file)?;
        cleanup_old_rotations(dir)?;

        info!("Audit log initialized: {}", log_file.display());

        Ok(Self {
            log_file,
            write_lock: Mutex::new(()),
        })
    }

    /// Append a record. Failures are logged, never propagated; a record that
    /// cannot reach the file is echoed to stderr so it is not silently lost.
    pub fn append(&self, record: &AuditRecord) {
        if let Err(e) = self.append_impl(record) {
            error!("Failed to write audit record: {}", e);
            eprintln!("AUDIT FALLBACK: {:?}", record);
        }

        match record.event_type {
            AuditEventType::AuthorizationDenied | AuditEventType::AuthenticationFailed => {
                warn!(
                    "AUDIT: {:?} user={} detail={}",
                    record.event_type, record.user_id, record.detail
                );
            }
            _ => {
                info!(
                    "AUDIT: {:?} user={} detail={}",
                    record.event_type, record.user_id, record.detail
                );
            }
        }
    }

    fn append_impl(&self, record: &AuditRecord) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        let json_line = serde_json::to_string(record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        writeln!(file, "{}", json_line)?;
        file.flush()?;

        Ok(())
    }

    /// Path of the active log file
    pub fn path(&self) -> &Path {
        &self.log_file
    }
}

/// Rotate the log aside if it has grown past the size ceiling
fn rotate_if_needed(log_file: &Path) -> std::io::Result<()> {
    if !log_file.exists() {
        return Ok(());
    }

    let size = std::fs::metadata(log_file)?.len();
    if size > ROTATE_BYTES {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let rotated = log_file.with_file_name(format!("security_audit_{}.jsonl", timestamp));
        std::fs::rename(log_file, rotated)?;
        info!("Rotated audit log ({} bytes)", size);
    }

    Ok(())
}

/// Remove rotated logs older than the retention window
fn cleanup_old_rotations(dir: &Path) -> std::io::Result<()> {
    let cutoff = Utc::now() - chrono::Duration::days(RETENTION_DAYS);
    let mut removed = 0usize;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(name.starts_with("security_audit_") && name.ends_with(".jsonl")) {
            continue;
        }
        if let Ok(modified) = std::fs::metadata(&path).and_then(|m| m.modified()) {
            let modified: DateTime<Utc> = modified.into();
            if modified < cutoff && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
    }

    if removed > 0 {
        info!("Cleaned up {} rotated audit logs", removed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_lines(log: &AuditLog) -> Vec<String> {
        std::fs::read_to_string(log.path())
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_append_writes_one_json_line() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path()).unwrap();

        log.append(
            &AuditRecord::new(
                AuditEventType::AuthorizationDenied,
                "alice",
                "malicious pattern: destructive_delete",
            )
            .with_intent("network_scanning"),
        );

        let lines = read_lines(&log);
        assert_eq!(lines.len(), 1);

        let parsed: AuditRecord = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(parsed.event_type, AuditEventType::AuthorizationDenied);
        assert_eq!(parsed.user_id, "alice");
        assert_eq!(parsed.intent.as_deref(), Some("network_scanning"));
    }

    #[test]
    fn test_appends_accumulate() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path()).unwrap();

        for i in 0..5 {
            log.append(&AuditRecord::new(
                AuditEventType::ExecutionCompleted,
                "bob",
                format!("run {}", i),
            ));
        }

        assert_eq!(read_lines(&log).len(), 5);
    }

    #[test]
    fn test_record_builder_fields() {
        let record = AuditRecord::new(AuditEventType::ExecutionCompleted, "carol", "ok")
            .with_tool("nmap")
            .with_intent("network_scanning")
            .with_execution_time(1.25);

        assert_eq!(record.tool.as_deref(), Some("nmap"));
        assert_eq!(record.execution_time_secs, Some(1.25));
    }
}
