//! `statebench config`: Configuration management commands.

use statebench_config::BenchConfig;
use tracing::info;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = BenchConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = BenchConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if config_path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    tokio::fs::create_dir_all(&config_dir).await?;
    tokio::fs::write(&config_path, BenchConfig::default_toml()).await?;
    info!(path = %config_path.display(), "Wrote default config");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = BenchConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
