//! Greedy pairwise-merge hill climbing.
//!
//! Each round scatters one evaluation task per connected module pair over the
//! worker pool, gathers (the gather is the barrier between the evaluate and
//! commit phases), then commits the best merge iff it strictly improves on
//! the cost before the round. Ties between equal-best merges go to whichever
//! worker takes the lock first; the outcome is intentionally nondeterministic.

use crate::cost::cost;
use crate::graph::{Module, Network};
use crate::search::{build_pool, resolve_workers, CancelToken, SearchError, SearchOutcome};
use rayon::prelude::*;
use std::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct GreedyOptions {
    pub threads: Option<usize>,
}

#[derive(Debug)]
struct BestMerge {
    cost: f64,
    first: usize,
    second: usize,
    merged: Module,
}

/// Runs the greedy search to a local optimum: stops once no single pairwise
/// merge lowers the cost. The committed cost sequence is non-increasing. On
/// cancellation the pre-run partitioning is restored and the run reports
/// `Cancelled`.
pub fn greedy_search(
    net: &mut Network,
    options: &GreedyOptions,
    cancel: &CancelToken,
) -> Result<SearchOutcome, SearchError> {
    let workers = resolve_workers(options.threads);
    let pool = build_pool(workers)?;

    let snapshot: Vec<Module> = net.partition().to_vec();
    let snapshot_cost = net.hierarchical_cost();

    let flat_entropy = net.flat_entropy();
    let teleport_prob = net.teleport_prob();
    let total_nodes = net.node_count() as u32;

    let mut current_cost = cost(net.partition(), flat_entropy);
    let mut rounds = 0u64;

    loop {
        if cancel.is_cancelled() {
            net.replace_partition(snapshot, snapshot_cost);
            return Err(SearchError::Cancelled);
        }
        if net.partition().len() <= 1 {
            break;
        }

        let round_best = {
            let partition = net.partition();
            let table = net.nodes();

            let mut pairs = Vec::new();
            for i in 0..partition.len() {
                for j in (i + 1)..partition.len() {
                    if Module::are_connected(&partition[i], &partition[j], table) {
                        pairs.push((i, j));
                    }
                }
            }

            if pairs.is_empty() {
                None
            } else {
                let best: Mutex<Option<BestMerge>> = Mutex::new(None);
                pool.install(|| {
                    pairs.par_iter().for_each(|&(i, j)| {
                        let mut merged = partition[i].deep_copy();
                        merged.absorb(&partition[j], table, teleport_prob, total_nodes);
                        let candidate_cost = cost(
                            partition
                                .iter()
                                .enumerate()
                                .filter(|&(k, _)| k != i && k != j)
                                .map(|(_, m)| m)
                                .chain(std::iter::once(&merged)),
                            flat_entropy,
                        );

                        // Writers hold the lock for the whole compare-and-update.
                        let mut guard = best.lock().expect("best-merge lock poisoned");
                        let improves = match guard.as_ref() {
                            Some(b) => candidate_cost < b.cost,
                            None => true,
                        };
                        if improves {
                            *guard = Some(BestMerge {
                                cost: candidate_cost,
                                first: i,
                                second: j,
                                merged,
                            });
                        }
                    });
                });
                best.into_inner().expect("best-merge lock poisoned")
            }
        };

        match round_best {
            Some(b) if b.cost < current_cost => {
                net.commit_merge(b.first, b.second, b.merged, b.cost);
                current_cost = b.cost;
                rounds += 1;
                debug!(
                    round = rounds,
                    cost = current_cost,
                    modules = net.partition().len(),
                    "committed merge"
                );
            }
            // Local optimum: no connected pair, or no merge strictly improves.
            _ => break,
        }
    }

    info!(
        cost = current_cost,
        modules = net.partition().len(),
        rounds,
        "greedy search converged"
    );
    Ok(SearchOutcome {
        cost: current_cost,
        num_modules: net.partition().len(),
        steps: rounds,
    })
}
