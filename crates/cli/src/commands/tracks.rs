//! `statebench tracks`: List benchmark tracks.

use statebench_core::timeline::Track;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Benchmark tracks:");
    for track in Track::ALL {
        println!("  {track}");
    }
    Ok(())
}
