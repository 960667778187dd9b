// file: src/nlu/mod.rs
// version: 1.0.0
// guid: 7d3e9f12-4a85-4c06-b1d9-2e6f80a4c753

//! NLU contract types and a minimal keyword-based resolver.
//!
//! The execution pipeline treats intent classification as an external
//! collaborator: it consumes an [`IntentResolution`] and performs no
//! independent NLU validation. [`KeywordIntentResolver`] is the thin default
//! implementation used by the CLI so the agent is usable stand-alone; a real
//! deployment can plug any [`IntentResolver`] in its place.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Entity types recognized in user text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    IpAddress,
    Domain,
    Url,
    Port,
    Cve,
}

/// A typed span extracted from user text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn new(entity_type: EntityType, value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            entity_type,
            value: value.into(),
            start,
            end,
        }
    }
}

/// Result of intent processing for one user utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResolution {
    pub intent: String,
    pub confidence: f64,
    pub entities: Vec<Entity>,
    pub requires_execution: bool,
}

/// Contract for the external NLU component
pub trait IntentResolver: Send + Sync {
    fn process_intent(&self, text: &str) -> IntentResolution;
}

/// Intents that map to an execution strategy
const EXECUTABLE_INTENTS: &[&str] = &[
    "network_scanning",
    "vulnerability_assessment",
    "information_gathering",
    "web_scanning",
    "exploitation",
];

/// Keyword-pattern intent resolver.
///
/// Scores each known intent by the number of matching patterns and picks the
/// highest scorer. Deliberately simple; the pipeline does not depend on the
/// quality of this classification.
pub struct KeywordIntentResolver {
    intent_patterns: Vec<(&'static str, Vec<Regex>)>,
    ipv4_re: Regex,
    url_re: Regex,
    domain_re: Regex,
    port_re: Regex,
    cve_re: Regex,
}

impl KeywordIntentResolver {
    pub fn new() -> Self {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){}", p)).expect("static pattern"))
                .collect::<Vec<_>>()
        };

        Self {
            intent_patterns: vec![
                (
                    "network_scanning",
                    compile(&[r"\bscan\b", r"\bnmap\b", r"\bport", r"open ports"]),
                ),
                (
                    "vulnerability_assessment",
                    compile(&[r"vulnerab", r"\bcve\b", r"\bassess", r"weakness"]),
                ),
                (
                    "information_gathering",
                    compile(&[r"\bwhois\b", r"subdomain", r"\bdns\b", r"\brecon", r"gather"]),
                ),
                (
                    "web_scanning",
                    compile(&[r"\bweb\b", r"director", r"gobuster", r"nikto", r"dirb"]),
                ),
                (
                    "exploitation",
                    compile(&[r"exploit", r"metasploit", r"payload"]),
                ),
            ],
            ipv4_re: Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("static pattern"),
            url_re: Regex::new(r"https?://[^\s]+").expect("static pattern"),
            domain_re: Regex::new(r"\b[a-zA-Z0-9][a-zA-Z0-9-]*(?:\.[a-zA-Z][a-zA-Z0-9-]*)+\b")
                .expect("static pattern"),
            port_re: Regex::new(r"(?i)\bports?\s+([0-9][0-9,\-]*)").expect("static pattern"),
            cve_re: Regex::new(r"(?i)\bCVE-\d{4}-\d{4,}\b").expect("static pattern"),
        }
    }

    fn extract_entities(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut claimed: Vec<(usize, usize)> = Vec::new();

        let mut claim = |start: usize, end: usize, claimed: &mut Vec<(usize, usize)>| -> bool {
            if claimed.iter().any(|&(s, e)| start < e && s < end) {
                return false;
            }
            claimed.push((start, end));
            true
        };

        for m in self.url_re.find_iter(text) {
            if claim(m.start(), m.end(), &mut claimed) {
                entities.push(Entity::new(EntityType::Url, m.as_str(), m.start(), m.end()));
            }
        }

        for m in self.ipv4_re.find_iter(text) {
            if claim(m.start(), m.end(), &mut claimed) {
                entities.push(Entity::new(
                    EntityType::IpAddress,
                    m.as_str(),
                    m.start(),
                    m.end(),
                ));
            }
        }

        for m in self.cve_re.find_iter(text) {
            if claim(m.start(), m.end(), &mut claimed) {
                entities.push(Entity::new(EntityType::Cve, m.as_str(), m.start(), m.end()));
            }
        }

        for cap in self.port_re.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                if claim(m.start(), m.end(), &mut claimed) {
                    entities.push(Entity::new(EntityType::Port, m.as_str(), m.start(), m.end()));
                }
            }
        }

        for m in self.domain_re.find_iter(text) {
            if claim(m.start(), m.end(), &mut claimed) {
                entities.push(Entity::new(EntityType::Domain, m.as_str(), m.start(), m.end()));
            }
        }

        entities
    }
}

impl Default for KeywordIntentResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentResolver for KeywordIntentResolver {
    fn process_intent(&self, text: &str) -> IntentResolution {
        let mut best: Option<(&str, usize, usize)> = None;

        for (intent, patterns) in &self.intent_patterns {
            let score = patterns.iter().filter(|p| p.is_match(text)).count();
            if score == 0 {
                continue;
            }
            match best {
                Some((_, best_score, _)) if best_score >= score => {}
                _ => best = Some((intent, score, patterns.len())),
            }
        }

        let entities = self.extract_entities(text);

        match best {
            Some((intent, score, total)) => {
                let confidence = (score as f64 / total as f64).min(1.0);
                IntentResolution {
                    intent: intent.to_string(),
                    confidence,
                    entities,
                    requires_execution: EXECUTABLE_INTENTS.contains(&intent),
                }
            }
            None => IntentResolution {
                intent: "unknown".to_string(),
                confidence: 0.0,
                entities,
                requires_execution: false,
            },
        }
    }
}
