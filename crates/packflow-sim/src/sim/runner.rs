use crate::sim::config::SimConfig;
use crate::sim::report::StatusWriter;
use anyhow::{Context, anyhow};
use packflow::{
    Deliverer, Dispatcher, LockerPool, OrderRegistry, Pacing, Preparer, RandomFaults, Verifier,
};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::info;

type WorkerHandle = (String, JoinHandle<packflow::Result<()>>);

/// Runs one full simulation: spawn the workers, poll liveness while
/// snapshotting queue depths, then join everything and write the closing
/// report.
///
/// The poll loop is the *only* observer; it reads lock-light snapshot
/// accessors and never participates in the pipeline's synchronization.
pub fn run(config: &SimConfig) -> anyhow::Result<()> {
    let started = Instant::now();
    let pool = Arc::new(LockerPool::new(config.capacity, config.orders));
    let registry = Arc::new(OrderRegistry::new());
    let faults = RandomFaults::new(config.fault_rates);

    // One value per role, shared by all of that role's threads: the claim
    // counters inside must span instances.
    let preparer = Arc::new(Preparer::new(
        Arc::clone(&pool),
        Arc::clone(&registry),
        Pacing::PREPARER,
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&pool),
        Arc::clone(&registry),
        faults,
        Pacing::DISPATCHER,
    ));
    let deliverer = Arc::new(Deliverer::new(
        Arc::clone(&registry),
        faults,
        Pacing::DELIVERER,
    ));
    let verifier = Arc::new(Verifier::new(
        Arc::clone(&registry),
        faults,
        Pacing::VERIFIER,
    ));

    let mut workers: Vec<WorkerHandle> = Vec::new();
    for i in 0..config.preparers {
        let preparer = Arc::clone(&preparer);
        workers.push(spawn(format!("preparer-{i}"), move || preparer.run())?);
    }
    for i in 0..config.dispatchers {
        let dispatcher = Arc::clone(&dispatcher);
        workers.push(spawn(format!("dispatcher-{i}"), move || dispatcher.run())?);
    }
    for i in 0..config.deliverers {
        let deliverer = Arc::clone(&deliverer);
        workers.push(spawn(format!("deliverer-{i}"), move || deliverer.run())?);
    }
    for i in 0..config.verifiers {
        let verifier = Arc::clone(&verifier);
        workers.push(spawn(format!("verifier-{i}"), move || verifier.run())?);
    }

    let mut writer = StatusWriter::create(&config.status_file).with_context(|| {
        format!(
            "failed to create status file {}",
            config.status_file.display()
        )
    })?;

    while workers.iter().any(|(_, handle)| !handle.is_finished()) {
        writer.status_line(started.elapsed(), &registry.depths()?)?;
        thread::sleep(config.poll_interval);
    }

    for (name, handle) in workers {
        handle
            .join()
            .map_err(|_| anyhow!("worker {name} panicked"))?
            .with_context(|| format!("worker {name} aborted"))?;
    }

    writer.status_line(started.elapsed(), &registry.depths()?)?;
    writer.final_report(started.elapsed(), &pool)?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        orders = pool.orders_prepared(),
        verified = registry.depths()?.verified,
        faulted_lockers = pool.faulted_lockers(),
        "simulation complete"
    );
    Ok(())
}

fn spawn(
    name: String,
    body: impl FnOnce() -> packflow::Result<()> + Send + 'static,
) -> anyhow::Result<WorkerHandle> {
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(body)
        .with_context(|| format!("failed to spawn worker {name}"))?;
    Ok((name, handle))
}
