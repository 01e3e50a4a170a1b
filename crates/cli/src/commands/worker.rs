//! `wayfarer worker <kind>`: host a built-in worker as a child process.

use wayfarer_config::BuiltinWorker;

pub async fn run(kind: BuiltinWorker, name: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let name = name.unwrap_or_else(|| kind.as_str().to_string());
    wayfarer_workers::serve_stdio(wayfarer_workers::builtin_worker(kind, &name)).await?;
    Ok(())
}
