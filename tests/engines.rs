use mapseek::anneal::{anneal_search, AnnealOptions};
use mapseek::graph::Network;
use mapseek::greedy::{greedy_search, GreedyOptions};
use mapseek::heatbath::{heat_bath_search, HeatBathOptions};
use mapseek::search::{resolve_workers, CancelToken, SearchError};
use rustc_hash::FxHashSet;

const TELEPORT: f64 = 0.15;

fn two_cluster_network() -> Network {
    let weights = vec![
        vec![0.0, 0.9, 0.05, 0.05],
        vec![0.9, 0.0, 0.05, 0.05],
        vec![0.05, 0.05, 0.0, 0.9],
        vec![0.05, 0.05, 0.9, 0.0],
    ];
    let freqs = vec![0.25; 4];
    Network::from_matrix(&weights, &freqs, None, TELEPORT, true).unwrap()
}

fn disconnected_blocks_network() -> Network {
    let weights = vec![
        vec![0.0, 1.0, 0.0, 0.0],
        vec![1.0, 0.0, 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 1.0],
        vec![0.0, 0.0, 1.0, 0.0],
    ];
    let freqs = vec![0.25; 4];
    Network::from_matrix(&weights, &freqs, None, TELEPORT, true).unwrap()
}

/// Every node sits in exactly one module and no module is empty.
fn assert_valid_partition(net: &Network) {
    let mut seen = FxHashSet::default();
    for module in net.partition() {
        assert!(!module.is_empty());
        for &member in module.members() {
            assert!(seen.insert(member), "node {} appears twice", member);
        }
    }
    assert_eq!(seen.len(), net.node_count());
}

#[test]
fn greedy_finds_the_two_clusters() {
    let mut net = two_cluster_network();
    let baseline = net.hierarchical_cost();

    let outcome = greedy_search(&mut net, &GreedyOptions::default(), &CancelToken::new()).unwrap();

    assert_valid_partition(&net);
    assert_eq!(net.partition().len(), 2);
    assert_eq!(net.module_of(0), net.module_of(1));
    assert_eq!(net.module_of(2), net.module_of(3));
    assert_ne!(net.module_of(0), net.module_of(2));
    assert!(outcome.cost < baseline);
    assert!((outcome.cost - net.hierarchical_cost()).abs() < 1e-12);
    assert_eq!(outcome.num_modules, 2);
}

#[test]
fn greedy_stops_at_disconnected_blocks() {
    let mut net = disconnected_blocks_network();
    let baseline = net.hierarchical_cost();

    let outcome = greedy_search(&mut net, &GreedyOptions::default(), &CancelToken::new()).unwrap();

    // Within-block merges improve; the two blocks share no edge, so no
    // further pair is ever evaluated.
    assert_valid_partition(&net);
    assert_eq!(net.partition().len(), 2);
    assert!(outcome.cost < baseline);
}

#[test]
fn greedy_leaves_an_edgeless_graph_alone() {
    // All weights zero: every node is dead, so pruning is off. No pair is
    // connected and the first round finds nothing to merge.
    let weights = vec![vec![0.0; 4]; 4];
    let freqs = vec![0.25; 4];
    let mut net = Network::from_matrix(&weights, &freqs, None, TELEPORT, false).unwrap();
    let baseline = net.hierarchical_cost();

    let outcome = greedy_search(&mut net, &GreedyOptions::default(), &CancelToken::new()).unwrap();

    assert_eq!(net.partition().len(), 4);
    assert_eq!(outcome.steps, 0);
    assert!((outcome.cost - baseline).abs() < 1e-12);
}

#[test]
fn greedy_is_deterministic_up_to_cost() {
    let mut a = two_cluster_network();
    let mut b = two_cluster_network();
    let oa = greedy_search(&mut a, &GreedyOptions { threads: Some(2) }, &CancelToken::new())
        .unwrap();
    let ob = greedy_search(&mut b, &GreedyOptions { threads: Some(4) }, &CancelToken::new())
        .unwrap();
    // Tie-breaks may differ across worker counts; the converged cost on this
    // graph is unique.
    assert!((oa.cost - ob.cost).abs() < 1e-9);
}

#[test]
fn greedy_honours_pre_set_cancellation() {
    let mut net = two_cluster_network();
    let before = net.hierarchical_cost();
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = greedy_search(&mut net, &GreedyOptions::default(), &cancel).unwrap_err();
    assert!(matches!(err, SearchError::Cancelled));
    assert_eq!(net.partition().len(), 4);
    assert!((net.hierarchical_cost() - before).abs() < 1e-12);
}

#[test]
fn annealing_never_ends_worse_than_the_start() {
    let mut net = two_cluster_network();
    let baseline = net.hierarchical_cost();

    let outcome = anneal_search(
        &mut net,
        &AnnealOptions {
            start_temperature: 20.0,
            chains: Some(4),
            seed: 123,
        },
        &CancelToken::new(),
    )
    .unwrap();

    assert_valid_partition(&net);
    assert!(outcome.cost <= baseline + 1e-12);
    assert!((outcome.cost - net.hierarchical_cost()).abs() < 1e-12);
}

#[test]
fn annealing_is_reproducible_for_a_fixed_seed() {
    let mut a = two_cluster_network();
    let mut b = two_cluster_network();
    let options = AnnealOptions {
        start_temperature: 20.0,
        chains: Some(3),
        seed: 42,
    };
    let oa = anneal_search(&mut a, &options, &CancelToken::new()).unwrap();
    let ob = anneal_search(&mut b, &options, &CancelToken::new()).unwrap();
    assert_eq!(oa.num_modules, ob.num_modules);
    assert!((oa.cost - ob.cost).abs() < 1e-12);
}

#[test]
fn annealing_with_one_chain_works() {
    let mut net = two_cluster_network();
    let baseline = net.hierarchical_cost();
    let outcome = anneal_search(
        &mut net,
        &AnnealOptions {
            start_temperature: 5.0,
            chains: Some(1),
            seed: 7,
        },
        &CancelToken::new(),
    )
    .unwrap();
    assert_valid_partition(&net);
    assert!(outcome.cost <= baseline + 1e-12);
}

#[test]
fn annealing_honours_pre_set_cancellation() {
    let mut net = two_cluster_network();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = anneal_search(&mut net, &AnnealOptions::default(), &cancel).unwrap_err();
    assert!(matches!(err, SearchError::Cancelled));
    assert_eq!(net.partition().len(), 4);
}

#[test]
fn heat_bath_keeps_a_valid_partition() {
    let mut net = two_cluster_network();
    let outcome = heat_bath_search(
        &mut net,
        &HeatBathOptions {
            start_temperature: 2.0,
            cooling_rate: 0.1,
            seed: 123,
            threads: Some(2),
        },
        &CancelToken::new(),
    )
    .unwrap();

    assert_valid_partition(&net);
    assert!(outcome.cost.is_finite());
    assert!((outcome.cost - net.hierarchical_cost()).abs() < 1e-12);
    // 2.0 / 0.1 steps, give or take float drift in the temperature ladder.
    assert!(outcome.steps >= 19 && outcome.steps <= 21);
}

#[test]
fn heat_bath_rejects_nonpositive_cooling() {
    let mut net = two_cluster_network();
    let err = heat_bath_search(
        &mut net,
        &HeatBathOptions {
            cooling_rate: 0.0,
            ..HeatBathOptions::default()
        },
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::InvalidOption(_)));
}

#[test]
fn heat_bath_honours_cancellation_mid_run() {
    let mut net = two_cluster_network();
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = heat_bath_search(&mut net, &HeatBathOptions::default(), &cancel).unwrap_err();
    assert!(matches!(err, SearchError::Cancelled));
    assert_eq!(net.partition().len(), 4);
}

#[test]
fn worker_resolution_prefers_the_explicit_request() {
    assert_eq!(resolve_workers(Some(3)), 3);
    assert!(resolve_workers(None) >= 1);
}
