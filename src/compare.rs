//! Partitioning comparison via mutual information.

use crate::graph::Network;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("networks differ in size: {0} vs {1} nodes")]
    SizeMismatch(usize, usize),
}

/// Mutual information between two partitionings of the same node set, in
/// bits. Module probabilities are member counts over the node count; empty
/// intersections contribute zero. Symmetric in its arguments, zero for
/// independent partitionings and maximal when they coincide.
pub fn mutual_information(a: &Network, b: &Network) -> Result<f64, CompareError> {
    if a.node_count() != b.node_count() {
        return Err(CompareError::SizeMismatch(a.node_count(), b.node_count()));
    }
    let n = a.node_count() as f64;

    let mut information = 0.0;
    for module_a in a.partition() {
        let p_a = module_a.len() as f64 / n;
        for module_b in b.partition() {
            let p_b = module_b.len() as f64 / n;
            let joint = module_a
                .members()
                .intersection(module_b.members())
                .count() as f64
                / n;
            if joint > 0.0 {
                information += joint * (joint / (p_a * p_b)).log2();
            }
        }
    }
    Ok(information)
}
