// file: src/pipeline/mod.rs
// version: 1.0.0
// guid: c3f01a87-65d2-4e4b-9b76-0ad85e21c943

//! Command execution pipeline
//!
//! Drives a request from intent to result: authorization first, then
//! strategy selection, planning, process execution and result aggregation.
//! [`ExecutionPipeline::execute`] is infallible by design: policy denials,
//! missing tools and child failures all come back as an [`ExecutionResult`]
//! with `success: false`, never as an error the caller must interpret.

pub mod strategy;

use crate::audit::{AuditEventType, AuditLog, AuditRecord};
use crate::config::Settings;
use crate::nlu::{Entity, EntityType};
use crate::policy::{PolicyEngine, Session};
use crate::registry::ToolRegistry;
use crate::runner::parsers::{parse_findings, Findings};
use crate::runner::{ToolInvocation, ToolRunner};
use crate::AgentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use strategy::{select_strategy, AggregationMode, StrategyKind, StrategyPlanner};
use tracing::{info, warn};

/// An execution request distilled from a conversational query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub intent: String,
    pub entities: Vec<Entity>,
    pub user_id: String,
    /// The user's raw text, scanned by the policy engine for hostile patterns
    pub raw_command_text: String,
}

impl ExecutionRequest {
    /// First target-like entity: IP, then domain, then URL
    pub fn primary_target(&self) -> Option<&str> {
        for wanted in [EntityType::IpAddress, EntityType::Domain, EntityType::Url] {
            if let Some(entity) = self.entities.iter().find(|e| e.entity_type == wanted) {
                return Some(&entity.value);
            }
        }
        None
    }

    /// Port specification, when one was extracted
    pub fn port_spec(&self) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.entity_type == EntityType::Port)
            .map(|e| e.value.as_str())
    }
}

/// Outcome of one invocation inside a multi-tool plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubResult {
    pub label: String,
    pub tool: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

/// The uniform result envelope every request produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub tool: String,
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_secs: f64,
    pub findings: Option<Findings>,
    pub sub_results: Vec<SubResult>,
    pub requires_confirmation: bool,
    pub error: Option<String>,
}

impl ExecutionResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tool: String::new(),
            command: String::new(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            execution_time_secs: 0.0,
            findings: None,
            sub_results: Vec::new(),
            requires_confirmation: false,
            error: Some(error.into()),
        }
    }
}

/// The full pipeline: policy gate, planner, runner and audit trail
pub struct ExecutionPipeline {
    policy: Arc<PolicyEngine>,
    registry: Arc<ToolRegistry>,
    runner: Arc<dyn ToolRunner>,
    audit: Arc<AuditLog>,
    output_dir: PathBuf,
    gobuster_wordlist: String,
    timeout: Duration,
}

impl ExecutionPipeline {
    pub fn new(
        policy: Arc<PolicyEngine>,
        registry: Arc<ToolRegistry>,
        runner: Arc<dyn ToolRunner>,
        audit: Arc<AuditLog>,
        settings: &Settings,
    ) -> Self {
        Self {
            policy,
            registry,
            runner,
            audit,
            output_dir: PathBuf::from(&settings.output_dir),
            gobuster_wordlist: settings.gobuster_wordlist.to_string_lossy().into_owned(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }

    /// Execute a request end to end. Authorization runs before anything
    /// else; a denied request never reaches the planner or the runner.
    pub async fn execute(&self, request: &ExecutionRequest, session: &Session) -> ExecutionResult {
        let decision = self.policy.authorize(request, session);
        if !decision.allowed {
            info!(
                "Request denied for {}: {:?}",
                request.user_id, decision.reason
            );
            return ExecutionResult::failure(format!(
                "Authorization denied ({:?}): {}",
                decision.reason, decision.detail
            ));
        }

        let started = Instant::now();
        let result = self.execute_authorized(request).await;
        let elapsed = started.elapsed().as_secs_f64();

        let event_type = if result.success {
            AuditEventType::ExecutionCompleted
        } else {
            AuditEventType::ExecutionFailed
        };
        let detail = result
            .error
            .clone()
            .unwrap_or_else(|| "completed".to_string());
        let mut record = AuditRecord::new(event_type, &request.user_id, detail)
            .with_intent(&request.intent)
            .with_execution_time(elapsed);
        if !result.tool.is_empty() {
            record = record.with_tool(&result.tool);
        }
        self.audit.append(&record);

        result
    }

    async fn execute_authorized(&self, request: &ExecutionRequest) -> ExecutionResult {
        let Some(strategy) = select_strategy(&request.intent) else {
            return ExecutionResult::failure(format!(
                "No execution strategy for intent '{}'",
                request.intent
            ));
        };

        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            warn!("Could not create output directory: {}", e);
            return ExecutionResult::failure("Internal error preparing execution");
        }

        let planner =
            StrategyPlanner::new(&self.registry, &self.output_dir, &self.gobuster_wordlist);
        let plan = match planner.plan(strategy, request) {
            Ok(plan) => plan,
            Err(e @ (AgentError::NoTarget(_) | AgentError::NoToolAvailable(_) | AgentError::Policy(_))) => {
                return ExecutionResult::failure(e.to_string());
            }
            Err(e) => {
                warn!("Planning failed: {}", e);
                return ExecutionResult::failure("Internal error preparing execution");
            }
        };

        if plan.requires_confirmation {
            let mut result =
                ExecutionResult::failure("This action requires manual confirmation and was not executed");
            result.requires_confirmation = true;
            return result;
        }

        self.run_plan(strategy, plan.invocations, plan.aggregation, plan.requires_confirmation)
            .await
    }

    async fn run_plan(
        &self,
        strategy: StrategyKind,
        invocations: Vec<ToolInvocation>,
        aggregation: AggregationMode,
        requires_confirmation: bool,
    ) -> ExecutionResult {
        let started = Instant::now();
        let single = invocations.len() == 1;
        let mut sub_results = Vec::new();
        let mut combined_stdout = String::new();
        let mut combined_stderr = String::new();
        let mut last_exit = None;
        let mut findings = None;
        let mut first_error: Option<String> = None;

        for invocation in &invocations {
            info!("Running {} ({:?})", invocation.command_line(), strategy);
            let outcome = self
                .runner
                .run(
                    &invocation.program,
                    &invocation.args,
                    std::path::Path::new("."),
                    self.timeout,
                )
                .await;

            let (success, exit_code, error) = match outcome {
                Ok(out) => {
                    let clean = out.success();
                    let code = out.exit_code;
                    if single {
                        findings = parse_findings(&invocation.tool, &out.stdout);
                        combined_stdout = out.stdout;
                        combined_stderr = out.stderr;
                        last_exit = code;
                    } else {
                        combined_stdout
                            .push_str(&format!("=== {} ===\n{}\n", invocation.label, out.stdout));
                        if !out.stderr.is_empty() {
                            combined_stderr.push_str(&format!(
                                "=== {} ===\n{}\n",
                                invocation.label, out.stderr
                            ));
                        }
                    }
                    let error = if clean {
                        None
                    } else {
                        Some(format!("{} exited with {:?}", invocation.tool, code))
                    };
                    (clean, code, error)
                }
                Err(AgentError::Timeout(msg)) => (false, None, Some(msg)),
                Err(e) => {
                    warn!("{} failed to run: {}", invocation.tool, e);
                    (false, None, Some(format!("{} could not be run", invocation.tool)))
                }
            };

            if !success && first_error.is_none() && (invocation.required || single) {
                first_error = error.clone();
            }
            sub_results.push(SubResult {
                label: invocation.label.clone(),
                tool: invocation.tool.clone(),
                success,
                exit_code,
                error,
            });
        }

        let success = match aggregation {
            AggregationMode::AllRequired => sub_results
                .iter()
                .zip(&invocations)
                .filter(|(_, inv)| inv.required)
                .all(|(sub, _)| sub.success),
            AggregationMode::PartialTolerant => sub_results.iter().any(|s| s.success),
        };

        let tool = invocations
            .iter()
            .map(|i| i.tool.as_str())
            .collect::<Vec<_>>()
            .join("+");
        let command = invocations
            .iter()
            .map(|i| i.command_line())
            .collect::<Vec<_>>()
            .join(" && ");

        let error = if success {
            None
        } else if let Some(e) = first_error {
            Some(e)
        } else {
            Some("All invocations failed".to_string())
        };

        ExecutionResult {
            success,
            tool,
            command,
            exit_code: last_exit,
            stdout: combined_stdout,
            stderr: combined_stderr,
            execution_time_secs: started.elapsed().as_secs_f64(),
            findings,
            sub_results: if single { Vec::new() } else { sub_results },
            requires_confirmation,
            error,
        }
    }
}
