//! Fan-out of per-table rendering to a fixed set of worker threads.
//!
//! Jobs are registry positions sent over a `crossbeam-channel`; workers send
//! back a [`TableOutput`] each. Results are sorted by position before they
//! are returned, so the caller sees registry order no matter which worker
//! finished first.

pub mod types;
pub mod worker;

pub use types::RenderJob;

use crate::config::GeneratorConfig;
use crate::error::{Result, SchemaError};
use crate::generator::TableOutput;
use crate::model::TableRegistry;
use crossbeam_channel::unbounded;
use std::thread;

/// Render every table of a materialized registry on `workers` threads.
///
/// A worker that panics, or a result count that does not match the table
/// count, aborts with [`SchemaError::Worker`].
pub fn render_tables(
    registry: &TableRegistry,
    config: &GeneratorConfig,
    workers: usize,
) -> Result<Vec<TableOutput>> {
    let total = registry.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let workers = workers.clamp(1, total);
    log::info!("Rendering {} table(s) on {} worker(s)", total, workers);

    let (job_tx, job_rx) = unbounded::<RenderJob>();
    let (result_tx, result_rx) = unbounded::<TableOutput>();
    for position in 0..total {
        job_tx
            .send(RenderJob { position })
            .map_err(|e| SchemaError::Worker(e.to_string()))?;
    }
    drop(job_tx);

    let failed = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let rx = job_rx.clone();
                let tx = result_tx.clone();
                scope.spawn(move || worker::run_worker_loop(id, rx, tx, registry, config))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .filter_map(|(id, handle)| handle.join().err().map(|_| id))
            .collect::<Vec<_>>()
    });
    drop(result_tx);

    if !failed.is_empty() {
        return Err(SchemaError::Worker(format!(
            "worker(s) {:?} panicked while rendering",
            failed
        )));
    }

    let mut outputs: Vec<TableOutput> = result_rx.iter().collect();
    if outputs.len() != total {
        return Err(SchemaError::Worker(format!(
            "expected {} rendered table(s), received {}",
            total,
            outputs.len()
        )));
    }
    outputs.sort_by_key(|o| o.position);
    Ok(outputs)
}
