//! `wayfarer status`: configuration and worker health.

use wayfarer_config::{AppConfig, WorkerKind};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Wayfarer Status");
    println!("===============");
    println!("  Config file:   {}", AppConfig::config_path().display());
    println!("  Call timeout:  {}s", config.transport.call_timeout_secs);
    println!("  Discovery:     {}s", config.transport.discovery_timeout_secs);
    println!("  Divider width: {}", config.response.divider_width);
    println!();

    let (agent, report) = wayfarer_engine::TravelAgent::start(&config).await?;
    println!("  Workers:");
    for worker in &config.workers {
        let kind = match &worker.kind {
            WorkerKind::Builtin { worker } => format!("builtin {worker}"),
            WorkerKind::Process { command, args, .. } => format!("process {command} {}", args.join(" ")),
        };
        let state = if !worker.enabled {
            "disabled".to_string()
        } else if let Some((_, n)) = report.discovered.iter().find(|(id, _)| id.as_str() == worker.name) {
            format!("ok, {n} capabilities")
        } else if let Some((_, reason)) = report.unavailable.iter().find(|(id, _)| id.as_str() == worker.name) {
            format!("unavailable: {reason}")
        } else {
            "unknown".to_string()
        };
        println!("    {:<16} {:<32} {state}", worker.name, kind.trim_end());
    }

    if AppConfig::config_path().exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, using defaults. Run `wayfarer init` to create one");
    }

    agent.shutdown().await;
    Ok(())
}
