// file: src/policy/mod.rs
// version: 1.0.0
// guid: 08d5f7a3-94cb-42e6-81d0-3b6a29e4c817

//! Security policy engine
//!
//! The authorization gate every execution request must pass before any
//! process is spawned. Checks run in a fixed order with the first failure
//! winning: session validity, malicious patterns, restricted paths,
//! dangerous command categories (role check), then target authorization.
//! Denials are typed results, never errors; every decision is audited.

pub mod rules;
pub mod target;

use crate::audit::{AuditEventType, AuditLog, AuditRecord};
use crate::config::Settings;
use crate::pipeline::ExecutionRequest;
use crate::{AgentError, Result};
use chrono::{DateTime, Duration, Utc};
use rules::{CommandCategory, RuleSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use target::{TargetDecision, TargetValidator};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Analyst,
    PentestLead,
    Admin,
}

impl Role {
    /// Whether this role may run commands in the given dangerous category
    pub fn can_execute(&self, category: CommandCategory) -> bool {
        match category {
            CommandCategory::Exploitation => {
                matches!(self, Role::PentestLead | Role::Admin)
            }
            _ => true,
        }
    }
}

/// Reason codes for authorization decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    Ok,
    DangerousCommand,
    RestrictedPath,
    MaliciousPattern,
    TargetBlocked,
    TargetUnauthorized,
    RoleInsufficient,
    AccountLocked,
}

/// Verdict on whether a request may proceed to execution
#[derive(Debug, Clone)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub reason: ReasonCode,
    pub detail: String,
}

impl AuthorizationDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: ReasonCode::Ok,
            detail: String::new(),
        }
    }

    fn deny(reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason,
            detail: detail.into(),
        }
    }
}

/// An authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// The policy engine: rule tables, target validator and session store
pub struct PolicyEngine {
    rules: RuleSet,
    targets: TargetValidator,
    sessions: Mutex<HashMap<String, Session>>,
    failed_attempts: Mutex<HashMap<String, u32>>,
    users: HashMap<String, crate::config::UserAccount>,
    session_timeout: Duration,
    max_failed_attempts: u32,
    audit: Arc<AuditLog>,
}

impl PolicyEngine {
    pub fn new(settings: &Settings, audit: Arc<AuditLog>) -> Self {
        let users = settings
            .users
            .iter()
            .map(|u| (u.name.clone(), u.clone()))
            .collect();

        Self {
            rules: RuleSet::default_rules(),
            targets: TargetValidator::new(settings.target_policy, &settings.allowed_targets),
            sessions: Mutex::new(HashMap::new()),
            failed_attempts: Mutex::new(HashMap::new()),
            users,
            session_timeout: Duration::seconds(settings.session_timeout_seconds as i64),
            max_failed_attempts: settings.max_failed_attempts,
            audit,
        }
    }

    /// Authenticate against the configured accounts. Repeated failures lock
    /// the account for the lifetime of the process.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        ip_address: Option<&str>,
    ) -> Result<Session> {
        if self.is_account_locked(username) {
            self.audit.append(&AuditRecord::new(
                AuditEventType::AuthenticationFailed,
                username,
                "account temporarily locked",
            ));
            return Err(AgentError::policy("Account temporarily locked"));
        }

        let valid = self
            .users
            .get(username)
            .map(|account| account.password_sha256.eq_ignore_ascii_case(&sha256_hex(password)))
            .unwrap_or(false);

        if !valid {
            self.record_failed_attempt(username);
            self.audit.append(&AuditRecord::new(
                AuditEventType::AuthenticationFailed,
                username,
                "invalid credentials",
            ));
            warn!("Authentication failed for user: {}", username);
            return Err(AgentError::policy("Invalid credentials"));
        }

        self.failed_attempts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(username);

        let role = self.users[username].role;
        let session = self.insert_session(username, role, ip_address);
        info!("User authenticated: {}", username);
        Ok(session)
    }

    /// Open a session for a local trusted operator (CLI use), bypassing
    /// credential checks but still subject to every authorization rule.
    pub fn open_session(&self, user_id: &str, role: Role) -> Session {
        self.insert_session(user_id, role, None)
    }

    fn insert_session(&self, user_id: &str, role: Role, ip_address: Option<&str>) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            role,
            ip_address: ip_address.map(String::from),
            created_at: now,
            expires_at: now + self.session_timeout,
        };

        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(session.id.clone(), session.clone());

        self.audit.append(&AuditRecord::new(
            AuditEventType::SessionOpened,
            user_id,
            format!("session {}", session.id),
        ));

        session
    }

    /// End a session explicitly
    pub fn logout(&self, session_id: &str) {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(session_id);

        if let Some(session) = removed {
            self.audit.append(&AuditRecord::new(
                AuditEventType::SessionClosed,
                &session.user_id,
                format!("session {}", session_id),
            ));
        }
    }

    /// Authorize an execution request. Never errors: denial is a value.
    /// Every decision, pass or fail, is appended to the audit log.
    pub fn authorize(&self, request: &ExecutionRequest, session: &Session) -> AuthorizationDecision {
        let decision = self.decide(request, session);

        let event_type = if decision.allowed {
            AuditEventType::AuthorizationGranted
        } else {
            AuditEventType::AuthorizationDenied
        };
        let detail = if decision.allowed {
            "authorized".to_string()
        } else {
            format!("{:?}: {}", decision.reason, decision.detail)
        };
        self.audit.append(
            &AuditRecord::new(event_type, &request.user_id, detail).with_intent(&request.intent),
        );

        decision
    }

    fn decide(&self, request: &ExecutionRequest, session: &Session) -> AuthorizationDecision {
        // 1. Session validity
        let known = self
            .sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(&session.id);
        if !known || session.is_expired() {
            return AuthorizationDecision::deny(
                ReasonCode::AccountLocked,
                "session unknown or expired",
            );
        }

        // 2. Malicious pattern scan on the raw command text
        if let Some(label) = self.rules.malicious_match(&request.raw_command_text) {
            warn!(
                "Malicious pattern in command from {}: {}",
                request.user_id, label
            );
            return AuthorizationDecision::deny(
                ReasonCode::MaliciousPattern,
                format!("command matches blocked pattern class '{}'", label),
            );
        }

        // 3. Restricted path scan
        if let Some(path) = self.rules.restricted_path_match(&request.raw_command_text) {
            return AuthorizationDecision::deny(
                ReasonCode::RestrictedPath,
                format!("command references restricted path '{}'", path),
            );
        }

        // 4. Dangerous command categories and explicit exploitation intent
        if request.intent == "exploitation" && !session.role.can_execute(CommandCategory::Exploitation)
        {
            return AuthorizationDecision::deny(
                ReasonCode::RoleInsufficient,
                "role not authorized for exploitation",
            );
        }
        if let Some(category) = self.rules.dangerous_category_match(&request.raw_command_text) {
            if !session.role.can_execute(category) {
                return AuthorizationDecision::deny(
                    ReasonCode::DangerousCommand,
                    format!("category '{}' requires elevated authorization", category.as_str()),
                );
            }
            debug!(
                "Dangerous category '{}' permitted for role {:?}",
                category.as_str(),
                session.role
            );
        }

        // 5. Target authorization
        if let Some(target) = request.primary_target() {
            match self.targets.authorize(target) {
                TargetDecision::Blocked => {
                    return AuthorizationDecision::deny(
                        ReasonCode::TargetBlocked,
                        format!("target '{}' is in a blocked range", target),
                    );
                }
                TargetDecision::Unauthorized => {
                    return AuthorizationDecision::deny(
                        ReasonCode::TargetUnauthorized,
                        format!("target '{}' is not on the allow-list", target),
                    );
                }
                TargetDecision::Authorized => {
                    self.audit.append(
                        &AuditRecord::new(
                            AuditEventType::TargetAuthorized,
                            &request.user_id,
                            format!("target '{}'", target),
                        )
                        .with_intent(&request.intent),
                    );
                }
                TargetDecision::PermittedWithWarning => {
                    self.audit.append(
                        &AuditRecord::new(
                            AuditEventType::TargetPermitted,
                            &request.user_id,
                            format!("target '{}' permitted under permissive policy", target),
                        )
                        .with_intent(&request.intent),
                    );
                }
            }
        }

        AuthorizationDecision::allow()
    }

    /// Add a target to the allow-list after format validation
    pub fn add_authorized_target(&self, target: &str, user_id: &str) -> Result<()> {
        self.targets.add_authorized(target)?;
        self.audit.append(&AuditRecord::new(
            AuditEventType::TargetAuthorized,
            user_id,
            format!("target '{}' added to allow-list", target),
        ));
        Ok(())
    }

    /// Target validator accessor (read-only checks)
    pub fn targets(&self) -> &TargetValidator {
        &self.targets
    }

    /// Count of unexpired sessions
    pub fn active_session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .filter(|s| !s.is_expired())
            .count()
    }

    fn is_account_locked(&self, username: &str) -> bool {
        self.failed_attempts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(username)
            .map(|count| *count >= self.max_failed_attempts)
            .unwrap_or(false)
    }

    fn record_failed_attempt(&self, username: &str) {
        let mut attempts = self.failed_attempts.lock().unwrap_or_else(|p| p.into_inner());
        *attempts.entry(username.to_string()).or_insert(0) += 1;
    }
}

/// Hex-encoded SHA-256 of the input
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TargetPolicyMode, UserAccount};
    use crate::nlu::{Entity, EntityType};
    use tempfile::tempdir;

    fn engine_with(settings: Settings) -> (PolicyEngine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let audit = Arc::new(AuditLog::new(dir.path()).unwrap());
        (PolicyEngine::new(&settings, audit), dir)
    }

    fn engine() -> (PolicyEngine, tempfile::TempDir) {
        engine_with(Settings::default())
    }

    fn request(intent: &str, raw: &str, entities: Vec<Entity>) -> ExecutionRequest {
        ExecutionRequest {
            intent: intent.to_string(),
            entities,
            user_id: "tester".to_string(),
            raw_command_text: raw.to_string(),
        }
    }

    fn ip_entity(value: &str) -> Entity {
        Entity::new(EntityType::IpAddress, value, 0, value.len())
    }

    #[test]
    fn test_clean_request_is_allowed() {
        let (engine, _dir) = engine();
        let session = engine.open_session("tester", Role::Analyst);

        let req = request(
            "network_scanning",
            "scan 203.0.113.5",
            vec![ip_entity("203.0.113.5")],
        );
        let decision = engine.authorize(&req, &session);

        assert!(decision.allowed);
        assert_eq!(decision.reason, ReasonCode::Ok);
    }

    #[test]
    fn test_malicious_pattern_beats_admin_role() {
        let (engine, _dir) = engine();
        let session = engine.open_session("root-user", Role::Admin);

        let req = request(
            "network_scanning",
            "scan host; rm -rf / > /dev/null 2>&1",
            vec![],
        );
        let decision = engine.authorize(&req, &session);

        assert!(!decision.allowed);
        assert_eq!(decision.reason, ReasonCode::MaliciousPattern);
        // The denial names the rule class, never the regex itself.
        assert!(!decision.detail.contains("rm\\s"));
    }

    #[test]
    fn test_restricted_path_denied() {
        let (engine, _dir) = engine();
        let session = engine.open_session("tester", Role::Analyst);

        let req = request("information_gathering", "show me /etc/shadow", vec![]);
        let decision = engine.authorize(&req, &session);

        assert!(!decision.allowed);
        assert_eq!(decision.reason, ReasonCode::RestrictedPath);
    }

    #[test]
    fn test_exploitation_keywords_denied_for_analyst() {
        let (engine, _dir) = engine();
        let session = engine.open_session("tester", Role::Analyst);

        let req = request("network_scanning", "run msfconsole for me", vec![]);
        let decision = engine.authorize(&req, &session);

        assert!(!decision.allowed);
        assert_eq!(decision.reason, ReasonCode::DangerousCommand);
        assert!(decision.detail.contains("exploitation"));
    }

    #[test]
    fn test_exploitation_keywords_permitted_for_pentest_lead() {
        let (engine, _dir) = engine();
        let session = engine.open_session("lead", Role::PentestLead);

        let req = request("network_scanning", "run msfconsole for me", vec![]);
        assert!(engine.authorize(&req, &session).allowed);
    }

    #[test]
    fn test_exploitation_intent_requires_role() {
        let (engine, _dir) = engine();
        let session = engine.open_session("tester", Role::Analyst);

        let req = request("exploitation", "go after the box", vec![]);
        let decision = engine.authorize(&req, &session);

        assert!(!decision.allowed);
        assert_eq!(decision.reason, ReasonCode::RoleInsufficient);
    }

    #[test]
    fn test_blocked_target_denied() {
        let (engine, _dir) = engine();
        let session = engine.open_session("tester", Role::Analyst);

        let req = request(
            "network_scanning",
            "scan 192.168.1.5",
            vec![ip_entity("192.168.1.5")],
        );
        let decision = engine.authorize(&req, &session);

        assert!(!decision.allowed);
        assert_eq!(decision.reason, ReasonCode::TargetBlocked);
    }

    #[test]
    fn test_strict_mode_unlisted_target_unauthorized() {
        let settings = Settings {
            target_policy: TargetPolicyMode::StrictAllowlist,
            ..Settings::default()
        };
        let (engine, _dir) = engine_with(settings);
        let session = engine.open_session("tester", Role::Analyst);

        let req = request(
            "network_scanning",
            "scan 203.0.113.5",
            vec![ip_entity("203.0.113.5")],
        );
        let decision = engine.authorize(&req, &session);

        assert!(!decision.allowed);
        assert_eq!(decision.reason, ReasonCode::TargetUnauthorized);
    }

    #[test]
    fn test_adding_a_target_authorizes_it_in_strict_mode() {
        let settings = Settings {
            target_policy: TargetPolicyMode::StrictAllowlist,
            ..Settings::default()
        };
        let (engine, _dir) = engine_with(settings);
        let session = engine.open_session("lead", Role::PentestLead);

        let req = request(
            "network_scanning",
            "scan 198.51.100.7",
            vec![ip_entity("198.51.100.7")],
        );
        assert!(!engine.authorize(&req, &session).allowed);

        engine.add_authorized_target("198.51.100.7", "lead").unwrap();
        assert!(engine.authorize(&req, &session).allowed);
    }

    #[test]
    fn test_unknown_session_denied() {
        let (engine, _dir) = engine();
        let session = Session {
            id: "not-registered".to_string(),
            user_id: "ghost".to_string(),
            role: Role::Admin,
            ip_address: None,
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(1),
        };

        let req = request("network_scanning", "scan example.com", vec![]);
        let decision = engine.authorize(&req, &session);

        assert!(!decision.allowed);
        assert_eq!(decision.reason, ReasonCode::AccountLocked);
    }

    #[test]
    fn test_authentication_and_lockout() {
        let password = "hunter2";
        let settings = Settings {
            max_failed_attempts: 2,
            users: vec![UserAccount {
                name: "alice".to_string(),
                role: Role::Admin,
                password_sha256: sha256_hex(password),
            }],
            ..Settings::default()
        };
        let (engine, _dir) = engine_with(settings);

        assert!(engine.authenticate("alice", "wrong", None).is_err());
        assert!(engine.authenticate("alice", "wrong", None).is_err());
        // Locked now, even with the right password.
        assert!(engine.authenticate("alice", password, None).is_err());
    }

    #[test]
    fn test_successful_authentication_opens_session() {
        let password = "correct horse";
        let settings = Settings {
            users: vec![UserAccount {
                name: "bob".to_string(),
                role: Role::PentestLead,
                password_sha256: sha256_hex(password),
            }],
            ..Settings::default()
        };
        let (engine, _dir) = engine_with(settings);

        let session = engine.authenticate("bob", password, Some("198.51.100.1")).unwrap();
        assert_eq!(session.user_id, "bob");
        assert_eq!(session.role, Role::PentestLead);
        assert!(!session.is_expired());
        assert_eq!(engine.active_session_count(), 1);

        engine.logout(&session.id);
        assert_eq!(engine.active_session_count(), 0);
    }

    #[test]
    fn test_denial_writes_audit_record() {
        let (engine, dir) = engine();
        let session = engine.open_session("tester", Role::Analyst);

        let before = std::fs::read_to_string(dir.path().join("security_audit.jsonl"))
            .unwrap_or_default()
            .lines()
            .count();

        let req = request("network_scanning", "x; rm -rf /tmp; rm -rf /", vec![]);
        let decision = engine.authorize(&req, &session);
        assert!(!decision.allowed);

        let after = std::fs::read_to_string(dir.path().join("security_audit.jsonl"))
            .unwrap()
            .lines()
            .count();
        assert_eq!(after, before + 1);
    }
}
