#![doc = include_str!("../README.md")]

mod sim;

use clap::Parser;
use sim::config::{CliArgs, SimConfig};
use sim::telemetry::init_telemetry;

// mimalloc holds up better than the system allocator once many worker
// threads churn queue items concurrently.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = SimConfig::try_from(args)?;

    init_telemetry()?;

    tracing::info!(
        capacity = config.capacity,
        orders = config.orders,
        "starting fulfillment simulation"
    );
    sim::runner::run(&config)
}
