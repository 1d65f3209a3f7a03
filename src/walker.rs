//! Monte Carlo estimation of node visit frequencies.
//!
//! When no measured frequency vector is supplied, a teleporting random walk
//! over the weight matrix estimates the stationary distribution: at each step
//! the walker jumps to a uniform node with the teleport probability and
//! otherwise follows an outgoing edge with probability proportional to its
//! weight. Dangling rows teleport unconditionally.

use crate::graph::ModelError;
use crate::search::seed_for_chain;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub teleport_prob: f64,
    /// Total walk length is `steps_per_node * n`.
    pub steps_per_node: u64,
    pub seed: u64,
    /// Independent walkers to split the walk across; defaults to one per
    /// available core via the global pool.
    pub walkers: Option<usize>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            teleport_prob: 0.15,
            steps_per_node: 10_000,
            seed: 123,
            walkers: None,
        }
    }
}

/// Estimates relative visit frequencies for every node. The result sums to
/// one and every entry is non-negative; teleportation guarantees each node a
/// nonzero expected share on long walks.
pub fn relative_frequencies(
    weights: &[Vec<f64>],
    config: &WalkerConfig,
) -> Result<Vec<f64>, ModelError> {
    let n = weights.len();
    if n == 0 {
        return Err(ModelError::TooFewNodes(0));
    }
    for (row, cols) in weights.iter().enumerate() {
        if cols.len() != n {
            return Err(ModelError::NonSquareMatrix {
                row,
                expected: n,
                got: cols.len(),
            });
        }
    }
    if !(0.0..1.0).contains(&config.teleport_prob) {
        return Err(ModelError::InvalidTeleport(config.teleport_prob));
    }

    let row_sums: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();

    let walkers = config
        .walkers
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        })
        .max(1);
    let total_steps = config.steps_per_node.saturating_mul(n as u64);
    let base = total_steps / walkers as u64;
    let remainder = total_steps % walkers as u64;

    let counts = (0..walkers)
        .into_par_iter()
        .map(|w| {
            let steps = base + if (w as u64) < remainder { 1 } else { 0 };
            walk(
                weights,
                &row_sums,
                steps,
                config.teleport_prob,
                seed_for_chain(config.seed, w as u64),
            )
        })
        .reduce(
            || vec![0u64; n],
            |mut acc, counts| {
                for (a, c) in acc.iter_mut().zip(counts) {
                    *a += c;
                }
                acc
            },
        );

    let visited: u64 = counts.iter().sum();
    debug!(nodes = n, total_steps, walkers, "random walk finished");
    if visited == 0 {
        return Ok(vec![1.0 / n as f64; n]);
    }
    Ok(counts
        .iter()
        .map(|&c| c as f64 / visited as f64)
        .collect())
}

fn walk(
    weights: &[Vec<f64>],
    row_sums: &[f64],
    steps: u64,
    teleport_prob: f64,
    seed: u64,
) -> Vec<u64> {
    let n = weights.len();
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut counts = vec![0u64; n];
    let mut current = rng.gen_range(0..n);

    for _ in 0..steps {
        current = if rng.gen::<f64>() < teleport_prob {
            rng.gen_range(0..n)
        } else {
            match weighted_step(&weights[current], row_sums[current], &mut rng) {
                Some(next) => next,
                None => rng.gen_range(0..n),
            }
        };
        counts[current] += 1;
    }
    counts
}

fn weighted_step(row: &[f64], row_sum: f64, rng: &mut SmallRng) -> Option<usize> {
    if row_sum <= 0.0 {
        return None;
    }
    let target = rng.gen::<f64>() * row_sum;
    let mut accumulated = 0.0;
    for (i, &w) in row.iter().enumerate() {
        accumulated += w;
        if accumulated > target {
            return Some(i);
        }
    }
    // Rounding can leave the target past the last increment.
    row.iter().rposition(|&w| w > 0.0)
}
