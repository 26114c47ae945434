use anyhow::ensure;
use clap::Parser;
use packflow::FaultRates;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments. Every flag also reads an environment fallback so
/// runs can be parameterized from a `.env` file.
#[derive(Parser, Debug)]
#[command(name = "packflow-sim", version, about = "Warehouse order-fulfillment pipeline simulator")]
pub struct CliArgs {
    /// Number of lockers in the storage pool.
    #[arg(long, env = "PACKFLOW_CAPACITY", default_value_t = 200)]
    pub capacity: usize,

    /// Total orders to push through the pipeline.
    #[arg(long, env = "PACKFLOW_ORDERS", default_value_t = 500)]
    pub orders: u64,

    /// Preparer threads.
    #[arg(long, env = "PACKFLOW_PREPARERS", default_value_t = 3)]
    pub preparers: usize,

    /// Dispatcher threads.
    #[arg(long, env = "PACKFLOW_DISPATCHERS", default_value_t = 2)]
    pub dispatchers: usize,

    /// Deliverer threads.
    #[arg(long, env = "PACKFLOW_DELIVERERS", default_value_t = 3)]
    pub deliverers: usize,

    /// Verifier threads.
    #[arg(long, env = "PACKFLOW_VERIFIERS", default_value_t = 2)]
    pub verifiers: usize,

    /// Percent of dispatches that fault their locker.
    #[arg(long, env = "PACKFLOW_DISPATCH_FAULT_PCT", default_value_t = 15)]
    pub dispatch_fault_pct: u32,

    /// Percent of deliveries that fail.
    #[arg(long, env = "PACKFLOW_DELIVERY_FAULT_PCT", default_value_t = 10)]
    pub delivery_fault_pct: u32,

    /// Percent of final verifications that fail.
    #[arg(long, env = "PACKFLOW_VERIFY_FAULT_PCT", default_value_t = 5)]
    pub verify_fault_pct: u32,

    /// File the periodic status snapshots and closing report are written to.
    #[arg(long, env = "PACKFLOW_STATUS_FILE", default_value = "status.log")]
    pub status_file: PathBuf,

    /// Milliseconds between status snapshots.
    #[arg(long, env = "PACKFLOW_POLL_INTERVAL_MS", default_value_t = 200)]
    pub poll_interval_ms: u64,
}

/// Validated simulation parameters.
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub capacity: usize,
    pub orders: u64,
    pub preparers: usize,
    pub dispatchers: usize,
    pub deliverers: usize,
    pub verifiers: usize,
    pub fault_rates: FaultRates,
    pub status_file: PathBuf,
    pub poll_interval: Duration,
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        ensure!(args.capacity > 0, "--capacity must be at least 1");
        ensure!(args.orders > 0, "--orders must be at least 1");
        ensure!(
            args.preparers > 0 && args.dispatchers > 0 && args.deliverers > 0 && args.verifiers > 0,
            "every worker role needs at least one thread"
        );
        for (flag, pct) in [
            ("--dispatch-fault-pct", args.dispatch_fault_pct),
            ("--delivery-fault-pct", args.delivery_fault_pct),
            ("--verify-fault-pct", args.verify_fault_pct),
        ] {
            ensure!(pct <= 100, "{flag} must be at most 100 (got {pct})");
        }
        ensure!(args.poll_interval_ms > 0, "--poll-interval-ms must be nonzero");

        Ok(Self {
            capacity: args.capacity,
            orders: args.orders,
            preparers: args.preparers,
            dispatchers: args.dispatchers,
            deliverers: args.deliverers,
            verifiers: args.verifiers,
            fault_rates: FaultRates {
                dispatch_pct: args.dispatch_fault_pct,
                delivery_pct: args.delivery_fault_pct,
                verification_pct: args.verify_fault_pct,
            },
            status_file: args.status_file,
            poll_interval: Duration::from_millis(args.poll_interval_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs::parse_from(["packflow-sim"])
    }

    #[test]
    fn defaults_are_the_canonical_run() {
        let config = SimConfig::try_from(args()).unwrap();
        assert_eq!(config.capacity, 200);
        assert_eq!(config.orders, 500);
        assert_eq!(
            (config.preparers, config.dispatchers, config.deliverers, config.verifiers),
            (3, 2, 3, 2)
        );
        assert_eq!(config.fault_rates, FaultRates::default());
        assert_eq!(config.poll_interval, Duration::from_millis(200));
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        let mut bad = args();
        bad.delivery_fault_pct = 101;
        assert!(SimConfig::try_from(bad).is_err());
    }

    #[test]
    fn rejects_an_empty_worker_role() {
        let mut bad = args();
        bad.verifiers = 0;
        assert!(SimConfig::try_from(bad).is_err());
    }
}
