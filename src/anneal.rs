//! Parallel simulated annealing.
//!
//! One chain per worker, each on a private deep copy of the partitioning.
//! All chains share the start temperature but carry distinct cooling rates;
//! the engine gathers the chains (the rendezvous) and keeps the lowest-cost
//! result, falling back to the starting partitioning when no chain beat it.

use crate::cost::cost;
use crate::graph::{Module, Network};
use crate::search::{
    build_pool, resolve_workers, seed_for_chain, CancelToken, SearchError, SearchOutcome,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

/// Metropolis scaling constant.
const KAPPA: f64 = 10.0;
const FASTEST_COOLING: f64 = 0.5;
const SLOWEST_COOLING: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct AnnealOptions {
    pub start_temperature: f64,
    /// Chain count; defaults to available parallelism.
    pub chains: Option<usize>,
    pub seed: u64,
}

impl Default for AnnealOptions {
    fn default() -> Self {
        Self {
            start_temperature: 20.0,
            chains: None,
            seed: 123,
        }
    }
}

/// Cooling rates in T/iteration, linearly spaced from fastest to slowest so
/// later chains explore longer.
fn cooling_rates(chains: usize) -> Vec<f64> {
    if chains == 1 {
        return vec![SLOWEST_COOLING];
    }
    (0..chains)
        .map(|i| {
            FASTEST_COOLING
                - (FASTEST_COOLING - SLOWEST_COOLING) * i as f64 / (chains as f64 - 1.0)
        })
        .collect()
}

#[derive(Debug)]
struct ChainResult {
    partition: Vec<Module>,
    cost: f64,
    iterations: u64,
    cooling_rate: f64,
}

fn run_chain(
    net: &Network,
    start_temperature: f64,
    cooling_rate: f64,
    seed: u64,
    cancel: &CancelToken,
) -> Result<ChainResult, SearchError> {
    let table = net.nodes();
    let teleport_prob = net.teleport_prob();
    let total_nodes = net.node_count() as u32;
    let flat_entropy = net.flat_entropy();

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut modules: Vec<Module> = net.partition().iter().map(Module::deep_copy).collect();
    let mut current_cost = cost(&modules, flat_entropy);
    let mut temperature = start_temperature;
    let mut iterations = 0u64;

    while temperature > 0.0 && modules.len() > 1 {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        // Uniform proposal over unordered module pairs.
        let k = modules.len();
        let a = rng.gen_range(0..k);
        let mut b = rng.gen_range(0..k - 1);
        if b >= a {
            b += 1;
        }
        let (i, j) = if a < b { (a, b) } else { (b, a) };

        let mut merged = modules[i].deep_copy();
        merged.absorb(&modules[j], table, teleport_prob, total_nodes);
        let candidate_cost = cost(
            modules
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != i && k != j)
                .map(|(_, m)| m)
                .chain(std::iter::once(&merged)),
            flat_entropy,
        );

        let delta = candidate_cost - current_cost;
        let accept = delta < 0.0 || rng.gen::<f64>() < (-KAPPA * delta / temperature).exp();
        if accept {
            modules.swap_remove(j);
            modules.swap_remove(i);
            modules.push(merged);
            current_cost = candidate_cost;
        }

        temperature -= cooling_rate;
        iterations += 1;
    }

    debug!(cooling_rate, cost = current_cost, iterations, "chain done");
    Ok(ChainResult {
        partition: modules,
        cost: current_cost,
        iterations,
        cooling_rate,
    })
}

/// Runs one annealing chain per worker and installs the lowest-cost result.
/// The reported cost is never above the starting partitioning's cost: when
/// every chain ends worse, the starting partitioning is kept.
pub fn anneal_search(
    net: &mut Network,
    options: &AnnealOptions,
    cancel: &CancelToken,
) -> Result<SearchOutcome, SearchError> {
    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let chains = resolve_workers(options.chains);
    let pool = build_pool(chains)?;
    let rates = cooling_rates(chains);

    let start_cost = cost(net.partition(), net.flat_entropy());
    let net_ref: &Network = net;

    let results: Vec<Result<ChainResult, SearchError>> = pool.install(|| {
        rates
            .par_iter()
            .enumerate()
            .map(|(chain_index, &rate)| {
                run_chain(
                    net_ref,
                    options.start_temperature,
                    rate,
                    seed_for_chain(options.seed, chain_index as u64),
                    cancel,
                )
            })
            .collect()
    });

    let mut best: Option<ChainResult> = None;
    for result in results {
        let chain = result?;
        if best.as_ref().map_or(true, |b| chain.cost < b.cost) {
            best = Some(chain);
        }
    }
    let best = best.expect("at least one chain");

    info!(
        cooling_rate = best.cooling_rate,
        cost = best.cost,
        start_cost,
        "annealing finished"
    );

    if best.cost < start_cost {
        let outcome = SearchOutcome {
            cost: best.cost,
            num_modules: best.partition.len(),
            steps: best.iterations,
        };
        net.replace_partition(best.partition, best.cost);
        Ok(outcome)
    } else {
        net.set_hierarchical_cost(start_cost);
        Ok(SearchOutcome {
            cost: start_cost,
            num_modules: net.partition().len(),
            steps: best.iterations,
        })
    }
}
