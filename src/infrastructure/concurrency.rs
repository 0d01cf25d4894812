/// Concurrency management for goscope.
/// Sizes the global rayon pool used by the parallel index build.

use anyhow::Result;
use tracing::info;

/// Initialize the global rayon thread pool.
/// Without an explicit count, half the cores are used, minimum 1 worker.
pub fn init_thread_pool(threads: Option<usize>) -> Result<usize> {
    let cores = num_cpus::get();
    let workers = worker_count(threads, cores);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("goscope-worker-{}", i))
        .build_global()?;

    info!(
        "Initialized thread pool: {} workers (system has {} cores)",
        workers, cores
    );

    Ok(workers)
}

fn worker_count(requested: Option<usize>, cores: usize) -> usize {
    match requested {
        Some(n) if n > 0 => n,
        _ => std::cmp::max(1, cores / 2),
    }
}
