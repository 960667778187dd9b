// file: src/config/loader.rs
// version: 1.0.0
// guid: 5c48d2f1-0a9b-4e67-93c5-8b21f6d4a0e9

//! Settings file loading with environment variable substitution

use super::Settings;
use crate::{AgentError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use validator::Validate;

/// Configuration loader with `${VAR}` environment substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load settings from a YAML file
    pub fn load_settings<P: AsRef<Path>>(&self, path: P) -> Result<Settings> {
        let content = fs::read_to_string(&path).map_err(|e| {
            AgentError::config(format!(
                "Failed to read settings file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;
        let settings: Settings = serde_yaml::from_str(&expanded)?;

        settings
            .validate()
            .map_err(|e| AgentError::config(format!("Invalid settings: {}", e)))?;

        Ok(settings)
    }

    /// Load settings from an optional path. Without one, the per-user config
    /// file is used when present, otherwise builtin defaults.
    pub fn load_or_default(&self, path: Option<&Path>) -> Result<Settings> {
        if let Some(p) = path {
            return self.load_settings(p);
        }
        if let Some(default_path) = Self::default_config_path() {
            if default_path.exists() {
                return self.load_settings(default_path);
            }
        }
        Ok(Settings::default())
    }

    /// The per-user configuration file location
    pub fn default_config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join("secops-agent").join("config.yaml"))
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| AgentError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(AgentError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_var_expansion() {
        let mut loader = ConfigLoader::new();
        loader.set_env_var("AGENT_OUT".to_string(), "/tmp/agent-out".to_string());

        let content = "output_dir: ${AGENT_OUT}";
        let result = loader.expand_env_vars(content).unwrap();
        assert_eq!(result, "output_dir: /tmp/agent-out");
    }

    #[test]
    fn test_missing_env_var() {
        let loader = ConfigLoader::new();
        let result = loader.expand_env_vars("key: ${DEFINITELY_NOT_SET_12345}");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_settings_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
output_dir: /tmp/scans
timeout_seconds: 120
target_policy: strict_allowlist
allowed_targets:
  - 203.0.113.5
users:
  - name: admin
    role: admin
    password_sha256: "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
"#
        )
        .unwrap();

        let loader = ConfigLoader::new();
        let settings = loader.load_settings(file.path()).unwrap();

        assert_eq!(settings.timeout_seconds, 120);
        assert_eq!(settings.allowed_targets, vec!["203.0.113.5".to_string()]);
        assert_eq!(settings.users.len(), 1);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timeout_seconds: 0").unwrap();

        let loader = ConfigLoader::new();
        assert!(loader.load_settings(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let loader = ConfigLoader::new();
        let settings = loader.load_or_default(None).unwrap();
        assert_eq!(settings.timeout_seconds, 300);
    }
}
