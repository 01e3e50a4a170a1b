//! `wayfarer chat`: interactive or single-message mode.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use wayfarer_engine::TravelAgent;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let (agent, report) = super::start_agent().await?;

    // Domain events surface under --verbose
    let mut events = agent.orchestrator().events().subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(?event, "Domain event"),
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "Event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Some(msg) = message {
        println!("{}", agent.process(&msg).await);
        agent.shutdown().await;
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Wayfarer Travel Agent, Interactive     ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!(
        "  Workers:      {} connected, {} unavailable",
        report.discovered.len(),
        report.unavailable.len()
    );
    println!("  Capabilities: {}", report.total_capabilities());
    println!();
    println!("  Type a request and press Enter.");
    println!("  'help' for examples, 'history' for this session, 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "help" => print_suggestions(&agent).await,
            "history" => print_history(&agent).await,
            _ => {
                let response = agent.process(input).await;
                println!();
                for line in response.lines() {
                    println!("  {line}");
                }
                println!();
            }
        }
        prompt()?;
    }

    agent.shutdown().await;
    println!();
    println!("  Safe travels!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

async fn print_suggestions(agent: &TravelAgent) {
    let groups = agent.get_suggestions().await;
    if groups.is_empty() {
        println!("  No workers are connected, so there is nothing to suggest.");
        return;
    }
    for group in groups {
        println!("  {}:", group.category);
        for example in group.prompts {
            println!("    • {example}");
        }
    }
}

async fn print_history(agent: &TravelAgent) {
    let turns = agent.get_history().await;
    if turns.is_empty() {
        println!("  No turns yet.");
        return;
    }
    for (i, turn) in turns.iter().enumerate() {
        let tools = if turn.tools_used.is_empty() {
            "-".to_string()
        } else {
            turn.tools_used.join(", ")
        };
        println!(
            "  {:>3}. [{}] ({}) {}  → {}",
            i + 1,
            turn.timestamp.format("%H:%M:%S"),
            turn.intent,
            turn.input,
            tools
        );
    }
}
