// file: src/cli/commands.rs
// version: 1.0.0
// guid: b85c30f4-9d27-4a61-8e5b-f1490a72d6c8

//! Command implementations for the CLI

use crate::{
    audit::AuditLog,
    config::{loader::ConfigLoader, Settings},
    nlu::{Entity, EntityType, IntentResolver, KeywordIntentResolver},
    pipeline::{ExecutionPipeline, ExecutionRequest},
    policy::{PolicyEngine, Role},
    registry::ToolRegistry,
    runner::parsers::Findings,
    runner::ProcessRunner,
    AgentError, Result,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn load_settings(config: Option<&str>) -> Result<Settings> {
    let loader = ConfigLoader::new();
    loader.load_or_default(config.map(Path::new))
}

/// Interpret a query, authorize it and run the matching tools
pub async fn query_command(
    query: &str,
    explicit_target: Option<String>,
    user: &str,
    role: Role,
    config: Option<String>,
) -> Result<()> {
    let settings = load_settings(config.as_deref())?;
    let audit = Arc::new(AuditLog::new(&settings.audit_dir)?);

    let mut registry = ToolRegistry::load(settings.tool_catalog.as_deref())?;
    registry.probe().await;
    let registry = Arc::new(registry);

    let policy = Arc::new(PolicyEngine::new(&settings, audit.clone()));
    let runner = Arc::new(ProcessRunner::new(settings.max_output_bytes));
    let pipeline = ExecutionPipeline::new(
        policy.clone(),
        registry.clone(),
        runner,
        audit,
        &settings,
    );

    let resolution = KeywordIntentResolver::new().process_intent(query);
    info!(
        "Resolved intent '{}' (confidence {:.2})",
        resolution.intent, resolution.confidence
    );

    let mut entities = resolution.entities;
    if let Some(target) = explicit_target {
        inject_target(&policy, &mut entities, &target)?;
    }

    if !resolution.requires_execution {
        println!("No executable action recognized (intent: {}).", resolution.intent);
        let suggestions = registry.suggestions_for_intent(&resolution.intent);
        if !suggestions.is_empty() {
            println!("Related tools:");
            for desc in suggestions {
                println!("  {} - {}", desc.name, desc.description);
            }
        }
        return Ok(());
    }

    let request = ExecutionRequest {
        intent: resolution.intent,
        entities,
        user_id: user.to_string(),
        raw_command_text: query.to_string(),
    };
    let session = policy.open_session(user, role);

    let result = pipeline.execute(&request, &session).await;
    policy.logout(&session.id);

    if result.success {
        println!("Command: {}", result.command);
        println!(
            "Completed in {:.1}s (exit code {:?})",
            result.execution_time_secs, result.exit_code
        );
        print_findings(result.findings.as_ref());
        for sub in &result.sub_results {
            let status = if sub.success { "ok" } else { "failed" };
            println!("  [{}] {} ({})", status, sub.label, sub.tool);
        }
        if !result.stdout.trim().is_empty() {
            println!("\n{}", result.stdout.trim_end());
        }
    } else {
        let reason = result.error.as_deref().unwrap_or("execution failed");
        println!("Request refused or failed: {}", reason);
        if !result.stderr.trim().is_empty() {
            println!("\n{}", result.stderr.trim_end());
        }
    }

    Ok(())
}

/// Merge an explicitly provided target into the extracted entities
fn inject_target(policy: &PolicyEngine, entities: &mut Vec<Entity>, target: &str) -> Result<()> {
    use crate::policy::target::TargetKind;

    let entity_type = match policy.targets().classify(target) {
        TargetKind::Ip => EntityType::IpAddress,
        TargetKind::Domain => EntityType::Domain,
        TargetKind::Url => EntityType::Url,
        TargetKind::Invalid => {
            return Err(AgentError::validation(format!(
                "Invalid target format: {}",
                target
            )));
        }
    };

    // The explicit target takes precedence over anything extracted.
    entities.retain(|e| {
        !matches!(
            e.entity_type,
            EntityType::IpAddress | EntityType::Domain | EntityType::Url
        )
    });
    entities.insert(0, Entity::new(entity_type, target, 0, target.len()));
    Ok(())
}

fn print_findings(findings: Option<&Findings>) {
    match findings {
        Some(Findings::OpenPorts { ports, total }) => {
            println!("Open ports: {}", total);
            for port in ports {
                println!("  {}/tcp {}", port.port, port.service);
            }
        }
        Some(Findings::WebVulnerabilities { entries, total }) => {
            println!("Web findings: {}", total);
            for entry in entries {
                println!("  {}", entry);
            }
        }
        None => {}
    }
}

/// Report catalogued tools and their installation status
pub async fn tools_command(json: bool, config: Option<String>) -> Result<()> {
    let settings = load_settings(config.as_deref())?;
    let mut registry = ToolRegistry::load(settings.tool_catalog.as_deref())?;
    registry.probe().await;

    if json {
        let report: Vec<serde_json::Value> = registry
            .report()
            .into_iter()
            .map(|(desc, status)| {
                serde_json::json!({
                    "name": desc.name,
                    "category": desc.category.as_str(),
                    "danger_level": desc.danger_level,
                    "requires_confirmation": desc.requires_confirmation,
                    "available": status.map(|s| s.available).unwrap_or(false),
                    "path": status.and_then(|s| s.resolved_path.clone()),
                    "version": status.and_then(|s| s.version.clone()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}/{} catalogued tools installed",
        registry.available_count(),
        registry.len()
    );
    for (desc, status) in registry.report() {
        let available = status.map(|s| s.available).unwrap_or(false);
        let marker = if available { "+" } else { "-" };
        let version = status
            .and_then(|s| s.version.as_deref())
            .unwrap_or("unknown");
        println!(
            "{} {:<14} {:<22} {}",
            marker,
            desc.name,
            desc.category.as_str(),
            if available { version } else { "not installed" }
        );
    }

    Ok(())
}

/// Check how the target policy would treat a target
pub async fn check_target_command(target: &str, config: Option<String>) -> Result<()> {
    use crate::policy::target::TargetDecision;

    let settings = load_settings(config.as_deref())?;
    let audit = Arc::new(AuditLog::new(&settings.audit_dir)?);
    let policy = PolicyEngine::new(&settings, audit);

    match policy.targets().authorize(target) {
        TargetDecision::Authorized => println!("{}: authorized", target),
        TargetDecision::PermittedWithWarning => {
            println!("{}: permitted (not on the allow-list; runs would be audited)", target)
        }
        TargetDecision::Blocked => println!("{}: blocked (protected network range)", target),
        TargetDecision::Unauthorized => {
            println!("{}: unauthorized (strict policy, not on the allow-list)", target)
        }
    }

    Ok(())
}
