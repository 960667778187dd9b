// file: src/config/mod.rs
// version: 1.0.0
// guid: 9e07b3c8-61fa-4d25-8b94-37c50d1ea462

//! Configuration module for the security assistant agent
//!
//! Handles loading and validation of runtime settings: output locations,
//! execution limits, target authorization policy and local user accounts.

pub mod loader;

pub use loader::ConfigLoader;

use crate::policy::Role;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Target authorization policy mode.
///
/// Under `permissive_log`, targets that are neither allow-listed nor
/// recognized practice domains are accepted with a logged warning.
/// `strict_allowlist` rejects them instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicyMode {
    StrictAllowlist,
    PermissiveLog,
}

/// A locally configured user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub name: String,
    pub role: Role,
    /// Hex-encoded SHA-256 digest of the account password
    pub password_sha256: String,
}

/// Runtime settings for the agent
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    /// Directory for per-invocation tool output files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for the append-only audit log
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,

    /// Optional YAML tool catalogue overlaying the builtin table
    #[serde(default)]
    pub tool_catalog: Option<PathBuf>,

    /// Hard wall-clock timeout for a single tool invocation
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 86400))]
    pub timeout_seconds: u64,

    /// Ceiling on captured stdout/stderr per invocation, in bytes
    #[serde(default = "default_max_output_bytes")]
    #[validate(range(min = 1024))]
    pub max_output_bytes: usize,

    /// Target authorization mode (see [`TargetPolicyMode`])
    #[serde(default = "default_target_policy")]
    pub target_policy: TargetPolicyMode,

    /// Explicitly authorized scan targets
    #[serde(default)]
    pub allowed_targets: Vec<String>,

    /// Wordlist used for directory brute-forcing
    #[serde(default = "default_wordlist")]
    pub gobuster_wordlist: PathBuf,

    /// Session lifetime
    #[serde(default = "default_session_timeout")]
    #[validate(range(min = 60, max = 604800))]
    pub session_timeout_seconds: u64,

    /// Failed authentication attempts before an account locks
    #[serde(default = "default_max_failed_attempts")]
    #[validate(range(min = 1, max = 100))]
    pub max_failed_attempts: u32,

    /// Local user accounts
    #[serde(default)]
    pub users: Vec<UserAccount>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from("logs/security")
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_max_output_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_target_policy() -> TargetPolicyMode {
    TargetPolicyMode::PermissiveLog
}

fn default_wordlist() -> PathBuf {
    PathBuf::from("/usr/share/wordlists/dirb/common.txt")
}

fn default_session_timeout() -> u64 {
    3600
}

fn default_max_failed_attempts() -> u32 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            audit_dir: default_audit_dir(),
            tool_catalog: None,
            timeout_seconds: default_timeout_seconds(),
            max_output_bytes: default_max_output_bytes(),
            target_policy: default_target_policy(),
            allowed_targets: Vec::new(),
            gobuster_wordlist: default_wordlist(),
            session_timeout_seconds: default_session_timeout(),
            max_failed_attempts: default_max_failed_attempts(),
            users: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.timeout_seconds, 300);
        assert_eq!(settings.max_output_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.target_policy, TargetPolicyMode::PermissiveLog);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let settings = Settings {
            timeout_seconds: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_policy_mode_serde_names() {
        let yaml = "target_policy: strict_allowlist\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.target_policy, TargetPolicyMode::StrictAllowlist);
    }
}
