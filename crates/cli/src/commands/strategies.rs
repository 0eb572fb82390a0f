//! `statebench strategies`: List registered memory strategies.

use statebench_config::BenchConfig;
use statebench_memory::available_strategies;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let configured = BenchConfig::load()
        .map(|c| c.strategy.name)
        .unwrap_or_default();

    println!("Memory strategies:");
    for name in available_strategies() {
        let marker = if name == configured { " (configured)" } else { "" };
        println!("  {name}{marker}");
    }
    Ok(())
}
