use crate::config::GeneratorConfig;
use crate::generator::{render_table, TableOutput};
use crate::model::TableRegistry;
use crate::pool::types::RenderJob;
use crossbeam_channel::{Receiver, Sender};

/// The worker thread entrypoint: render tables until the job channel closes.
pub fn run_worker_loop(
    id: usize,
    rx: Receiver<RenderJob>,
    tx: Sender<TableOutput>,
    registry: &TableRegistry,
    config: &GeneratorConfig,
) {
    let mut rendered = 0usize;
    while let Ok(job) = rx.recv() {
        let Some(table) = registry.tables().get(job.position) else {
            log::error!("Worker {} received unknown table position {}", id, job.position);
            continue;
        };
        let output = render_table(job.position, table, registry, config);
        if tx.send(output).is_err() {
            log::error!("Worker {} lost its result channel", id);
            break;
        }
        rendered += 1;
    }
    log::debug!("Worker {} finished after {} table(s)", id, rendered);
}
