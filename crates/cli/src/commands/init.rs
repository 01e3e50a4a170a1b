//! `wayfarer init`: write a default configuration file.

use wayfarer_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("Edit it manually or delete it and re-run init.");
        return Ok(());
    }

    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Created config at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add or disable workers under [[workers]]");
    println!("  2. Run: wayfarer chat");
    Ok(())
}
