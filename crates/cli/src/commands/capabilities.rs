//! `wayfarer capabilities`: what the connected workers offer.

use wayfarer_core::DataSource;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (agent, report) = super::start_agent().await?;
    let snapshot = agent.orchestrator().snapshot().await;

    println!("Wayfarer Capabilities");
    println!("=====================");
    for (worker, descriptors) in snapshot.workers() {
        println!();
        println!("  {worker}");
        for d in descriptors {
            let source = match d.source {
                DataSource::Live => " [live]",
                DataSource::Demo => " [demo]",
                DataSource::Unspecified => "",
            };
            println!("    {}{source}", d.qualified_name());
            println!("        {}", d.description);
            if !d.argument_names.is_empty() {
                let args: Vec<String> = d
                    .argument_names
                    .iter()
                    .map(|a| if d.is_required(a) { format!("{a}*") } else { a.clone() })
                    .collect();
                println!("        args: {}", args.join(", "));
            }
        }
    }

    println!();
    println!(
        "  {} capabilities from {} workers",
        report.total_capabilities(),
        report.discovered.len()
    );

    agent.shutdown().await;
    Ok(())
}
