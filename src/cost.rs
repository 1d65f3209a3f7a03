use crate::graph::Module;

/// `p * log2(p)` with the `log2(0) := 0` convention. Keeps zero-probability
/// modules and zero exit flow from turning the cost into NaN or -inf.
#[inline]
pub fn plogp(p: f64) -> f64 {
    if p > 0.0 {
        p * p.log2()
    } else {
        0.0
    }
}

/// Two-level map-equation cost of a partitioning. Lower is better.
///
/// With per-module exit probability `q_m` and member frequency mass `p_m`:
///
/// ```text
/// term1 = Q * log2(Q)                    Q = sum of q_m
/// term2 = 2 * sum of q_m * log2(q_m)
/// term3 = flat_entropy
/// term4 = sum of (q_m + p_m) * log2(q_m + p_m)
/// cost  = term1 - term2 + term3 + term4
/// ```
///
/// Pure over any module collection: candidate partitions are scored without
/// touching the live network.
pub fn cost<'a, I>(partitioning: I, flat_entropy: f64) -> f64
where
    I: IntoIterator<Item = &'a Module>,
{
    let mut sum_exit = 0.0;
    let mut exit_log_exit = 0.0;
    let mut total_log_total = 0.0;

    for module in partitioning {
        let q = module.exit_probability();
        let p = module.sum_node_frequencies();
        sum_exit += q;
        exit_log_exit += plogp(q);
        total_log_total += plogp(q + p);
    }

    plogp(sum_exit) - 2.0 * exit_log_exit + flat_entropy + total_log_total
}
