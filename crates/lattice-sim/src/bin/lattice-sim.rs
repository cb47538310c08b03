//! Lattice scenario binary
//!
//! Usage: `lattice-sim [scenario.json]`. Without a path the default
//! scenario runs.

use lattice_sim::{Scenario, ScenarioConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lattice_sim=info,lattice_pipenet=info,lattice_plane=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(%path, "loading scenario");
            ScenarioConfig::from_file(&path)?
        }
        None => ScenarioConfig::default(),
    };

    let report = Scenario::new(config).run()?;
    tracing::info!(
        tier = %report.tier,
        ticks = report.ticks,
        completed = report.completed,
        "scenario finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
