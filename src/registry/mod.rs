// file: src/registry/mod.rs
// version: 1.0.0
// guid: 4b90e7c5-2d13-4f86-a7b0-c85e1f36d924

//! Tool registry: the catalogue of external security tools
//!
//! Descriptors are loaded once at startup (builtin table plus an optional
//! YAML overlay) and never mutated afterwards; availability status is probed
//! once and shared read-only across requests.

pub mod catalog;

use crate::{AgentError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tool categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    NetworkScanning,
    WebScanning,
    WebExploitation,
    InformationGathering,
    Exploitation,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::NetworkScanning => "network_scanning",
            ToolCategory::WebScanning => "web_scanning",
            ToolCategory::WebExploitation => "web_exploitation",
            ToolCategory::InformationGathering => "information_gathering",
            ToolCategory::Exploitation => "exploitation",
        }
    }
}

/// Danger classification for a tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Immutable description of one external tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub path: String,
    pub category: ToolCategory,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub danger_level: DangerLevel,
    #[serde(default)]
    pub requires_confirmation: bool,
    #[serde(default)]
    pub requires_root: bool,
    #[serde(default)]
    pub common_args: Vec<String>,
    #[serde(default)]
    pub output_format_flags: Vec<String>,
}

/// Probed availability of one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Registry of known tools with probed availability
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
    status: HashMap<String, ToolStatus>,
}

impl ToolRegistry {
    /// Build the registry from the builtin catalogue
    pub fn builtin() -> Result<Self> {
        Self::from_descriptors(catalog::builtin_descriptors())
    }

    /// Build the registry from the builtin catalogue plus an optional YAML
    /// overlay file. A catalogue entry missing required fields is a fatal
    /// startup error, not a runtime one.
    pub fn load(catalog_path: Option<&Path>) -> Result<Self> {
        let mut descriptors = catalog::builtin_descriptors();

        if let Some(path) = catalog_path {
            let content = std::fs::read_to_string(path).map_err(|e| {
                AgentError::config(format!(
                    "Failed to read tool catalogue {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let overlay: Vec<ToolDescriptor> = serde_yaml::from_str(&content).map_err(|e| {
                AgentError::config(format!("Invalid tool catalogue {}: {}", path.display(), e))
            })?;

            for entry in overlay {
                descriptors.retain(|d| d.name != entry.name);
                descriptors.push(entry);
            }
        }

        Self::from_descriptors(descriptors)
    }

    /// Build the registry from explicit descriptors (validated)
    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Result<Self> {
        let mut tools = HashMap::new();

        for desc in descriptors {
            validate_descriptor(&desc)?;
            tools.insert(desc.name.clone(), desc);
        }

        Ok(Self {
            tools,
            status: HashMap::new(),
        })
    }

    /// Probe every catalogued tool for availability and version
    pub async fn probe(&mut self) {
        info!("Probing {} catalogued tools", self.tools.len());

        let names: Vec<String> = self.tools.keys().cloned().collect();
        for name in names {
            let path = self.tools[&name].path.clone();
            match which::which(&path) {
                Ok(resolved) => {
                    let version = probe_version(&resolved).await;
                    self.mark_available(&name, resolved, version);
                }
                Err(_) => {
                    self.mark_unavailable(&name, "not found in PATH");
                }
            }
        }

        let available = self.available_count();
        info!(
            "Tool probe complete: {}/{} tools available",
            available,
            self.tools.len()
        );

        let missing: Vec<&str> = self
            .status
            .iter()
            .filter(|(_, s)| !s.available)
            .map(|(n, _)| n.as_str())
            .collect();
        if !missing.is_empty() {
            warn!("Missing tools: {}", missing.join(", "));
        }
    }

    /// Record a tool as available at a resolved path
    pub fn mark_available(&mut self, name: &str, resolved: PathBuf, version: Option<String>) {
        debug!("Tool available: {} -> {}", name, resolved.display());
        self.status.insert(
            name.to_string(),
            ToolStatus {
                available: true,
                resolved_path: Some(resolved),
                version,
                error: None,
            },
        );
    }

    /// Record a tool as unavailable
    pub fn mark_unavailable(&mut self, name: &str, reason: &str) {
        self.status.insert(
            name.to_string(),
            ToolStatus {
                available: false,
                resolved_path: None,
                version: None,
                error: Some(reason.to_string()),
            },
        );
    }

    /// Whether a tool is catalogued and probed available
    pub fn is_available(&self, name: &str) -> bool {
        self.status.get(name).map(|s| s.available).unwrap_or(false)
    }

    /// Look up a descriptor by name
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Program to execute for a tool: the probed path when known, else the
    /// catalogued path
    pub fn program(&self, name: &str) -> Option<String> {
        let desc = self.tools.get(name)?;
        let resolved = self
            .status
            .get(name)
            .and_then(|s| s.resolved_path.as_ref())
            .map(|p| p.to_string_lossy().to_string());
        Some(resolved.unwrap_or_else(|| desc.path.clone()))
    }

    /// Probe status for one tool
    pub fn status(&self, name: &str) -> Option<&ToolStatus> {
        self.status.get(name)
    }

    /// Available tools relevant to an intent, in preference order
    pub fn suggestions_for_intent(&self, intent: &str) -> Vec<&ToolDescriptor> {
        catalog::tools_for_intent(intent)
            .iter()
            .filter(|name| self.is_available(name))
            .filter_map(|name| self.tools.get(*name))
            .collect()
    }

    /// All descriptors with their status, sorted by name
    pub fn report(&self) -> Vec<(&ToolDescriptor, Option<&ToolStatus>)> {
        let mut entries: Vec<_> = self
            .tools
            .values()
            .map(|d| (d, self.status.get(&d.name)))
            .collect();
        entries.sort_by(|a, b| a.0.name.cmp(&b.0.name));
        entries
    }

    pub fn available_count(&self) -> usize {
        self.status.values().filter(|s| s.available).count()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn validate_descriptor(desc: &ToolDescriptor) -> Result<()> {
    if desc.name.trim().is_empty() {
        return Err(AgentError::config("Tool descriptor with empty name"));
    }
    if desc.path.trim().is_empty() {
        return Err(AgentError::config(format!(
            "Tool '{}' has an empty path",
            desc.name
        )));
    }
    // High-danger tools must never be selectable without confirmation.
    if desc.danger_level == DangerLevel::High && !desc.requires_confirmation {
        return Err(AgentError::config(format!(
            "Tool '{}' is danger_level=high but requires_confirmation=false",
            desc.name
        )));
    }
    Ok(())
}

/// Run `<tool> --version` with a short timeout and extract a version string
async fn probe_version(program: &Path) -> Option<String> {
    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        tokio::process::Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    extract_version(&combined)
}

/// Pull a dotted version number out of arbitrary `--version` output
fn extract_version(output: &str) -> Option<String> {
    let patterns = [
        r"(?i)version\s+(\d+\.\d+(?:\.\d+)?)",
        r"(?i)v(\d+\.\d+(?:\.\d+)?)",
        r"(\d+\.\d+(?:\.\d+)?)",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(cap) = re.captures(output) {
            return Some(cap[1].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_registry_loads() {
        let registry = ToolRegistry::builtin().unwrap();
        assert!(registry.descriptor("nmap").is_some());
        assert!(registry.descriptor("nonexistent").is_none());
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_unprobed_tools_are_unavailable() {
        let registry = ToolRegistry::builtin().unwrap();
        assert!(!registry.is_available("nmap"));
    }

    #[test]
    fn test_mark_available() {
        let mut registry = ToolRegistry::builtin().unwrap();
        registry.mark_available("nmap", PathBuf::from("/usr/bin/nmap"), Some("7.94".into()));

        assert!(registry.is_available("nmap"));
        assert_eq!(registry.program("nmap").unwrap(), "/usr/bin/nmap");
        assert_eq!(registry.available_count(), 1);
    }

    #[test]
    fn test_high_danger_without_confirmation_is_fatal() {
        let bad = ToolDescriptor {
            name: "rogue".into(),
            path: "rogue".into(),
            category: ToolCategory::Exploitation,
            description: String::new(),
            danger_level: DangerLevel::High,
            requires_confirmation: false,
            requires_root: false,
            common_args: Vec::new(),
            output_format_flags: Vec::new(),
        };

        assert!(ToolRegistry::from_descriptors(vec![bad]).is_err());
    }

    #[test]
    fn test_catalog_overlay_missing_field_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // No `path` field: required, so loading must fail.
        writeln!(file, "- name: mytool\n  category: web_scanning").unwrap();

        assert!(ToolRegistry::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_catalog_overlay_replaces_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "- name: nmap\n  path: /opt/nmap/bin/nmap\n  category: network_scanning"
        )
        .unwrap();

        let registry = ToolRegistry::load(Some(file.path())).unwrap();
        assert_eq!(registry.descriptor("nmap").unwrap().path, "/opt/nmap/bin/nmap");
    }

    #[test]
    fn test_suggestions_only_include_available_tools() {
        let mut registry = ToolRegistry::builtin().unwrap();
        assert!(registry.suggestions_for_intent("network_scanning").is_empty());

        registry.mark_available("nmap", PathBuf::from("/usr/bin/nmap"), None);
        let suggestions = registry.suggestions_for_intent("network_scanning");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "nmap");
    }

    #[test]
    fn test_version_extraction() {
        assert_eq!(
            extract_version("Nmap version 7.94 ( https://nmap.org )").as_deref(),
            Some("7.94")
        );
        assert_eq!(extract_version("gobuster v3.6.0").as_deref(), Some("3.6.0"));
        assert_eq!(extract_version("no digits here"), None);
    }
}
