// file: src/pipeline/strategy.rs
// version: 1.0.0
// guid: 4e97c2b0-8d15-4f6a-b3e8-72c0d9a51f36

//! Execution strategy selection and planning
//!
//! Maps an executable intent to a strategy, then builds the concrete
//! [`ExecutionPlan`] of tool invocations for it against the tool registry.
//! Plans are pure data; nothing here touches a process.

use super::ExecutionRequest;
use crate::registry::{DangerLevel, ToolRegistry};
use crate::runner::ToolInvocation;
use crate::{AgentError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// The execution strategies the pipeline knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    NetworkScan,
    VulnerabilityScan,
    InformationGathering,
    WebScan,
    /// Exploitation is never auto-executed, whatever the role
    ExploitationBlocked,
}

/// How sub-results combine into overall success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Every required invocation must succeed
    AllRequired,
    /// One success is enough; failures become breakdown entries
    PartialTolerant,
}

/// A fully resolved plan, ready for the runner
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub strategy: StrategyKind,
    pub invocations: Vec<ToolInvocation>,
    pub aggregation: AggregationMode,
    pub requires_confirmation: bool,
}

/// Map an intent to its strategy. `None` means the intent is conversational
/// and has no execution side.
pub fn select_strategy(intent: &str) -> Option<StrategyKind> {
    match intent {
        "network_scanning" => Some(StrategyKind::NetworkScan),
        "vulnerability_assessment" => Some(StrategyKind::VulnerabilityScan),
        "information_gathering" => Some(StrategyKind::InformationGathering),
        "web_scanning" => Some(StrategyKind::WebScan),
        "exploitation" => Some(StrategyKind::ExploitationBlocked),
        _ => None,
    }
}

/// Builds execution plans against the probed tool registry
pub struct StrategyPlanner<'a> {
    registry: &'a ToolRegistry,
    output_dir: PathBuf,
    gobuster_wordlist: String,
}

impl<'a> StrategyPlanner<'a> {
    pub fn new(registry: &'a ToolRegistry, output_dir: &Path, gobuster_wordlist: &str) -> Self {
        Self {
            registry,
            output_dir: output_dir.to_path_buf(),
            gobuster_wordlist: gobuster_wordlist.to_string(),
        }
    }

    /// Build the plan for a strategy. Fails with [`AgentError::NoTarget`]
    /// when the strategy needs a target the request lacks, and with
    /// [`AgentError::NoToolAvailable`] when no usable tool is installed.
    pub fn plan(&self, strategy: StrategyKind, request: &ExecutionRequest) -> Result<ExecutionPlan> {
        match strategy {
            StrategyKind::NetworkScan => self.plan_network_scan(request),
            StrategyKind::VulnerabilityScan => self.plan_vulnerability_scan(request),
            StrategyKind::InformationGathering => self.plan_information_gathering(request),
            StrategyKind::WebScan => self.plan_web_scan(request),
            StrategyKind::ExploitationBlocked => Err(AgentError::policy(
                "Exploitation tools require manual confirmation and are not auto-executed",
            )),
        }
    }

    fn plan_network_scan(&self, request: &ExecutionRequest) -> Result<ExecutionPlan> {
        let target = required_target(request, "network scan")?;
        let program = self.available_program("nmap")?;

        let output_file = self.output_filename("nmap", target, &request.user_id, Utc::now());
        let mut args = vec!["-sS".to_string()];
        if let Some(ports) = request.port_spec() {
            args.push("-p".to_string());
            args.push(ports.to_string());
        }
        args.push("-sV".to_string());
        args.push(target.to_string());
        args.push("-oN".to_string());
        args.push(output_file.to_string_lossy().into_owned());

        Ok(ExecutionPlan {
            strategy: StrategyKind::NetworkScan,
            invocations: vec![ToolInvocation {
                tool: "nmap".to_string(),
                program,
                args,
                output_file: Some(output_file),
                required: true,
                label: "port_scan".to_string(),
            }],
            aggregation: AggregationMode::AllRequired,
            requires_confirmation: self.needs_confirmation(&["nmap"]),
        })
    }

    fn plan_vulnerability_scan(&self, request: &ExecutionRequest) -> Result<ExecutionPlan> {
        let target = required_target(request, "vulnerability scan")?;

        // Web targets get nikto; everything else gets nmap's vuln scripts.
        if target.starts_with("http://") || target.starts_with("https://") {
            let program = self.available_program("nikto")?;
            let output_file = self.output_filename("nikto", target, &request.user_id, Utc::now());
            let args = vec![
                "-h".to_string(),
                target.to_string(),
                "-Format".to_string(),
                "htm".to_string(),
                "-output".to_string(),
                output_file.to_string_lossy().into_owned(),
            ];

            Ok(ExecutionPlan {
                strategy: StrategyKind::VulnerabilityScan,
                invocations: vec![ToolInvocation {
                    tool: "nikto".to_string(),
                    program,
                    args,
                    output_file: Some(output_file),
                    required: true,
                    label: "web_vuln_scan".to_string(),
                }],
                aggregation: AggregationMode::AllRequired,
                requires_confirmation: self.needs_confirmation(&["nikto"]),
            })
        } else {
            let program = self.available_program("nmap")?;
            let output_file = self.output_filename("nmap", target, &request.user_id, Utc::now());
            let args = vec![
                "-sV".to_string(),
                "--script".to_string(),
                "vuln".to_string(),
                target.to_string(),
                "-oN".to_string(),
                output_file.to_string_lossy().into_owned(),
            ];

            Ok(ExecutionPlan {
                strategy: StrategyKind::VulnerabilityScan,
                invocations: vec![ToolInvocation {
                    tool: "nmap".to_string(),
                    program,
                    args,
                    output_file: Some(output_file),
                    required: true,
                    label: "vuln_scripts".to_string(),
                }],
                aggregation: AggregationMode::AllRequired,
                requires_confirmation: self.needs_confirmation(&["nmap"]),
            })
        }
    }

    fn plan_information_gathering(&self, request: &ExecutionRequest) -> Result<ExecutionPlan> {
        let target = required_target(request, "information gathering")?;
        let mut invocations = Vec::new();

        if let Ok(program) = self.available_program("whois") {
            invocations.push(ToolInvocation {
                tool: "whois".to_string(),
                program,
                args: vec![target.to_string()],
                output_file: None,
                required: false,
                label: "whois".to_string(),
            });
        }
        if let Ok(program) = self.available_program("subfinder") {
            let output_file =
                self.output_filename("subfinder", target, &request.user_id, Utc::now());
            invocations.push(ToolInvocation {
                tool: "subfinder".to_string(),
                program,
                args: vec![
                    "-d".to_string(),
                    target.to_string(),
                    "-o".to_string(),
                    output_file.to_string_lossy().into_owned(),
                ],
                output_file: Some(output_file),
                required: false,
                label: "subdomains".to_string(),
            });
        }
        if let Ok(program) = self.available_program("dig") {
            invocations.push(ToolInvocation {
                tool: "dig".to_string(),
                program,
                args: vec![target.to_string(), "ANY".to_string()],
                output_file: None,
                required: false,
                label: "dns".to_string(),
            });
        }

        if invocations.is_empty() {
            return Err(AgentError::no_tool(
                "No information gathering tools are installed (whois, subfinder, dig)",
            ));
        }

        let tools: Vec<&str> = invocations.iter().map(|i| i.tool.as_str()).collect();
        Ok(ExecutionPlan {
            strategy: StrategyKind::InformationGathering,
            requires_confirmation: self.needs_confirmation(&tools),
            invocations,
            aggregation: AggregationMode::PartialTolerant,
        })
    }

    fn plan_web_scan(&self, request: &ExecutionRequest) -> Result<ExecutionPlan> {
        let raw = required_target(request, "web scan")?;
        let target = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };

        let gobuster = self.available_program("gobuster")?;
        let nikto = self.available_program("nikto")?;

        let invocations = vec![
            ToolInvocation {
                tool: "gobuster".to_string(),
                program: gobuster,
                args: vec![
                    "dir".to_string(),
                    "-u".to_string(),
                    target.clone(),
                    "-w".to_string(),
                    self.gobuster_wordlist.clone(),
                    "-t".to_string(),
                    "50".to_string(),
                ],
                output_file: None,
                required: true,
                label: "directory_bust".to_string(),
            },
            ToolInvocation {
                tool: "nikto".to_string(),
                program: nikto,
                args: vec!["-h".to_string(), target],
                output_file: None,
                required: true,
                label: "web_vuln_scan".to_string(),
            },
        ];

        Ok(ExecutionPlan {
            strategy: StrategyKind::WebScan,
            requires_confirmation: self.needs_confirmation(&["gobuster", "nikto"]),
            invocations,
            aggregation: AggregationMode::AllRequired,
        })
    }

    fn available_program(&self, tool: &str) -> Result<String> {
        if !self.registry.is_available(tool) {
            return Err(AgentError::no_tool(format!("{} is not installed", tool)));
        }
        self.registry
            .program(tool)
            .ok_or_else(|| AgentError::no_tool(format!("{} is not catalogued", tool)))
    }

    fn needs_confirmation(&self, tools: &[&str]) -> bool {
        tools.iter().any(|t| {
            self.registry
                .descriptor(t)
                .map(|d| d.requires_confirmation || d.danger_level >= DangerLevel::High)
                .unwrap_or(false)
        })
    }

    /// Unique output path for a tool run. Besides tool, target, user and a
    /// UTC timestamp, a process-wide sequence number keeps two runs in the
    /// same second from colliding.
    pub fn output_filename(
        &self,
        tool: &str,
        target: &str,
        user: &str,
        when: DateTime<Utc>,
    ) -> PathBuf {
        static SEQUENCE: AtomicU64 = AtomicU64::new(0);
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);

        let safe_target: String = target
            .chars()
            .map(|c| match c {
                '.' | '/' | ':' => '_',
                other => other,
            })
            .collect();

        self.output_dir.join(format!(
            "{}_{}_{}_{}_{}.txt",
            tool,
            safe_target,
            when.format("%Y%m%d_%H%M%S"),
            seq,
            user
        ))
    }
}

fn required_target<'r>(request: &'r ExecutionRequest, what: &str) -> Result<&'r str> {
    request
        .primary_target()
        .ok_or_else(|| AgentError::no_target(format!("a {} needs a target", what)))
}
