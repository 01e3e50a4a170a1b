//! `wayfarer suggest`: example requests, as JSON.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (agent, _) = super::start_agent().await?;
    let groups = agent.get_suggestions().await;
    println!("{}", serde_json::to_string_pretty(&groups)?);
    agent.shutdown().await;
    Ok(())
}
