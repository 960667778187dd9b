// file: src/policy/target.rs
// version: 1.0.0
// guid: a2c74e09-58b1-4d63-9f20-e47b3a86c5d1

//! Target validation and authorization
//!
//! Classifies a target string (IP, domain or URL), refuses targets inside
//! blocked network ranges, and recognizes the deliberately-vulnerable
//! practice domains that are always fair game. Everything else depends on
//! the configured [`TargetPolicyMode`].

use crate::config::TargetPolicyMode;
use crate::{AgentError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Syntactic classification of a target string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Ip,
    Domain,
    Url,
    Invalid,
}

/// Outcome of target authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetDecision {
    /// Allow-listed or a recognized practice domain
    Authorized,
    /// Accepted under permissive mode; callers must log and audit this
    PermittedWithWarning,
    /// Inside a blocked network range or on the literal blocklist
    Blocked,
    /// Rejected under strict mode
    Unauthorized,
}

/// Validates and authorizes scan targets
pub struct TargetValidator {
    mode: TargetPolicyMode,
    authorized: RwLock<HashSet<String>>,
    safe_patterns: Vec<Regex>,
    domain_re: Regex,
    ipv4_re: Regex,
}

/// Hostnames that are always refused regardless of mode
const LITERAL_BLOCKLIST: &[&str] = &["localhost", "0.0.0.0"];

impl TargetValidator {
    pub fn new(mode: TargetPolicyMode, allowed_targets: &[String]) -> Self {
        let safe_patterns = [
            r"(?i).*\.testfire\.net$",
            r"(?i).*\.dvwa\..*$",
            r"(?i).*\.hackthebox\..*$",
            r"(?i).*\.vulnhub\..*$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern"))
        .collect();

        Self {
            mode,
            authorized: RwLock::new(allowed_targets.iter().cloned().collect()),
            safe_patterns,
            domain_re: Regex::new(
                r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
            )
            .expect("static pattern"),
            ipv4_re: Regex::new(r"^(?:[0-9]{1,3}\.){3}[0-9]{1,3}$").expect("static pattern"),
        }
    }

    /// Classify a target string, testing IP first, then domain, then URL
    pub fn classify(&self, target: &str) -> TargetKind {
        if self.ipv4_re.is_match(target) && target.parse::<Ipv4Addr>().is_ok() {
            return TargetKind::Ip;
        }
        if target.parse::<Ipv6Addr>().is_ok() {
            return TargetKind::Ip;
        }
        if self.domain_re.is_match(target) {
            return TargetKind::Domain;
        }
        if let Ok(url) = Url::parse(target) {
            if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
                return TargetKind::Url;
            }
        }
        TargetKind::Invalid
    }

    /// Whether the target has a recognized format
    pub fn is_format_valid(&self, target: &str) -> bool {
        self.classify(target) != TargetKind::Invalid
    }

    /// Whether the target falls in a blocked network range or on the
    /// literal blocklist. URL targets are judged by their host.
    pub fn is_blocked(&self, target: &str) -> bool {
        let host = match self.classify(target) {
            TargetKind::Url => match Url::parse(target) {
                Ok(url) => match url.host_str() {
                    Some(h) => h.to_string(),
                    None => return true,
                },
                Err(_) => return true,
            },
            _ => target.to_string(),
        };

        if LITERAL_BLOCKLIST.contains(&host.to_lowercase().as_str()) {
            return true;
        }

        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => is_blocked_v4(ip),
            Ok(IpAddr::V6(ip)) => is_blocked_v6(ip),
            Err(_) => false,
        }
    }

    /// Whether the target matches a known safe-practice domain pattern
    pub fn is_safe_practice(&self, target: &str) -> bool {
        self.safe_patterns.iter().any(|p| p.is_match(target))
    }

    /// Whether the target is on the explicit allow-list
    pub fn is_allow_listed(&self, target: &str) -> bool {
        self.authorized
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains(target)
    }

    /// Authorize a target under the configured policy mode
    pub fn authorize(&self, target: &str) -> TargetDecision {
        if self.is_blocked(target) {
            return TargetDecision::Blocked;
        }
        if self.is_allow_listed(target) || self.is_safe_practice(target) {
            debug!("Target pre-authorized: {}", target);
            return TargetDecision::Authorized;
        }

        match self.mode {
            TargetPolicyMode::StrictAllowlist => TargetDecision::Unauthorized,
            TargetPolicyMode::PermissiveLog => {
                warn!("Target not on allow-list, permitted under permissive policy: {}", target);
                TargetDecision::PermittedWithWarning
            }
        }
    }

    /// Add a target to the allow-list after format validation
    pub fn add_authorized(&self, target: &str) -> Result<()> {
        if !self.is_format_valid(target) {
            return Err(AgentError::validation(format!(
                "Invalid target format: {}",
                target
            )));
        }
        self.authorized
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(target.to_string());
        Ok(())
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    // fc00::/7 unique-local addresses plus loopback/unspecified
    ip.is_loopback() || ip.is_unspecified() || (ip.segments()[0] & 0xfe00) == 0xfc00
}
