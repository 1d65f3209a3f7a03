//! Plumbing shared by the three search engines: cancellation, errors,
//! worker-count resolution, pool construction and per-chain seeding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The caller cancelled the run at a round/iteration boundary. The live
    /// partitioning is left as it was before the run started; retry the whole
    /// run if needed, partial rounds cannot be resumed.
    #[error("search cancelled")]
    Cancelled,
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
    #[error("invalid engine option: {0}")]
    InvalidOption(String),
}

/// Cooperative cancellation flag. Engines poll it between rounds, iterations
/// and temperature steps, never inside a cost evaluation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Final report of a completed search run. The network itself holds the
/// partitioning and cost; this carries the run-shaped extras.
#[derive(Debug, Clone, Copy)]
pub struct SearchOutcome {
    pub cost: f64,
    pub num_modules: usize,
    /// Committed rounds (greedy), iterations of the winning chain (anneal)
    /// or temperature steps (heat bath).
    pub steps: u64,
}

fn env_workers() -> Option<usize> {
    for key in ["MAPSEEK_THREADS", "RAYON_NUM_THREADS"] {
        if let Some(v) = std::env::var_os(key) {
            if let Ok(s) = v.into_string() {
                if let Ok(n) = s.parse::<usize>() {
                    if n > 0 {
                        return Some(n);
                    }
                }
            }
        }
    }
    None
}

/// Worker count for an engine run: explicit request, then environment
/// override, then available hardware parallelism.
pub fn resolve_workers(requested: Option<usize>) -> usize {
    let default_workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested.or_else(env_workers).unwrap_or(default_workers).max(1)
}

pub(crate) fn build_pool(workers: usize) -> Result<rayon::ThreadPool, SearchError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| SearchError::WorkerPool(e.to_string()))
}

/// SplitMix64-style mixing for deterministic independent chain seeds.
#[inline]
pub(crate) fn seed_for_chain(base_seed: u64, chain_index: u64) -> u64 {
    let mut z = base_seed ^ chain_index.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
