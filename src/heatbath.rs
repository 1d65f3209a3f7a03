//! Heat-bath (Gibbs) sampler.
//!
//! Each temperature step enumerates every single-node relocation, including
//! the stay-put move for each node, scores them all in parallel, then samples
//! one move from the Boltzmann distribution over the scores and applies it.
//! Weights are exponentiated against the minimum score of the step, so the
//! best move always carries weight 1 and low temperatures cannot overflow.

use crate::cost::cost;
use crate::graph::{Module, Network, NodeTable};
use crate::search::{build_pool, resolve_workers, CancelToken, SearchError, SearchOutcome};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

/// Boltzmann scaling constant; sharper than annealing's so the sampler
/// concentrates on near-best moves early.
const KAPPA: f64 = 1000.0;

#[derive(Debug, Clone)]
pub struct HeatBathOptions {
    pub start_temperature: f64,
    /// Temperature drop per step; must be positive.
    pub cooling_rate: f64,
    pub seed: u64,
    pub threads: Option<usize>,
}

impl Default for HeatBathOptions {
    fn default() -> Self {
        Self {
            start_temperature: 10.0,
            cooling_rate: 0.1,
            seed: 123,
            threads: None,
        }
    }
}

fn relocation_cost(
    partition: &[Module],
    table: &NodeTable,
    node: u32,
    from: usize,
    to: usize,
    flat_entropy: f64,
) -> f64 {
    if from == to {
        return cost(partition, flat_entropy);
    }

    let mut source = partition[from].deep_copy();
    source.remove_node(node, table);
    let mut dest = partition[to].deep_copy();
    dest.add_node(node, table);

    let mut modules: Vec<&Module> = partition
        .iter()
        .enumerate()
        .filter(|&(k, _)| k != from && k != to)
        .map(|(_, m)| m)
        .collect();
    // A module emptied by the move drops out of the candidate partitioning.
    if !source.is_empty() {
        modules.push(&source);
    }
    modules.push(&dest);
    cost(modules, flat_entropy)
}

/// Runs the sampler from `start_temperature` down to zero and installs the
/// final partitioning. The cost trajectory may go up as well as down; only
/// the end state is kept.
pub fn heat_bath_search(
    net: &mut Network,
    options: &HeatBathOptions,
    cancel: &CancelToken,
) -> Result<SearchOutcome, SearchError> {
    if !(options.cooling_rate > 0.0) || !options.cooling_rate.is_finite() {
        return Err(SearchError::InvalidOption(format!(
            "cooling rate must be positive and finite, got {}",
            options.cooling_rate
        )));
    }

    let workers = resolve_workers(options.threads);
    let pool = build_pool(workers)?;
    let mut rng = SmallRng::seed_from_u64(options.seed);

    let table = net.nodes();
    let flat_entropy = net.flat_entropy();

    let mut partition: Vec<Module> = net.partition().to_vec();
    let mut temperature = options.start_temperature;
    let mut steps = 0u64;

    while temperature > 0.0 {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let mut moves: Vec<(u32, usize, usize)> = Vec::new();
        for (from, module) in partition.iter().enumerate() {
            for &node in module.members() {
                for to in 0..partition.len() {
                    moves.push((node, from, to));
                }
            }
        }

        let temp = temperature;
        let scores: Vec<f64> = pool.install(|| {
            moves
                .par_iter()
                .map(|&(node, from, to)| {
                    relocation_cost(&partition, table, node, from, to, flat_entropy)
                })
                .collect()
        });

        let min_score = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let weights: Vec<f64> = scores
            .iter()
            .map(|&s| (-KAPPA * (s - min_score) / temp).exp())
            .collect();
        let total_weight: f64 = weights.iter().sum();

        let target = rng.gen::<f64>() * total_weight;
        let mut accumulated = 0.0;
        let mut chosen = moves.len() - 1;
        for (idx, &w) in weights.iter().enumerate() {
            accumulated += w;
            if accumulated > target {
                chosen = idx;
                break;
            }
        }

        let (node, from, to) = moves[chosen];
        if from != to {
            partition[to].add_node(node, table);
            partition[from].remove_node(node, table);
            if partition[from].is_empty() {
                partition.swap_remove(from);
            }
        }

        steps += 1;
        temperature -= options.cooling_rate;
        debug!(
            temperature,
            modules = partition.len(),
            "heat-bath step sampled"
        );
    }

    let final_cost = cost(&partition, flat_entropy);
    let outcome = SearchOutcome {
        cost: final_cost,
        num_modules: partition.len(),
        steps,
    };
    info!(cost = final_cost, modules = partition.len(), steps, "heat bath finished");
    net.replace_partition(partition, final_cost);
    Ok(outcome)
}
