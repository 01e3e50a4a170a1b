pub mod capabilities;
pub mod chat;
pub mod init;
pub mod status;
pub mod suggest;
pub mod worker;

use wayfarer_config::AppConfig;
use wayfarer_engine::{DiscoveryReport, TravelAgent};

/// Load configuration and start an agent, reporting unreachable workers on stderr.
pub async fn start_agent() -> Result<(TravelAgent, DiscoveryReport), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let (agent, report) = TravelAgent::start(&config).await?;
    for (worker, reason) in &report.unavailable {
        eprintln!("  [warn] worker '{worker}' unavailable: {reason}");
    }
    Ok((agent, report))
}
