use mapseek::compare::{mutual_information, CompareError};
use mapseek::config::Engine;
use mapseek::graph::Network;
use mapseek::greedy::{greedy_search, GreedyOptions};
use mapseek::output::write_partition;
use mapseek::parser::{read_coordinates, read_frequencies, read_weight_matrix, ParseError};
use mapseek::search::CancelToken;
use mapseek::walker::{relative_frequencies, WalkerConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const TELEPORT: f64 = 0.15;

fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

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

#[test]
fn reads_a_square_matrix() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_temp(&tmp, "m.txt", "0 0.9 0.1\n0.5 0 0.5\n0.1, 0.9, 0\n");
    let matrix = read_weight_matrix(&path).unwrap();
    assert_eq!(matrix.len(), 3);
    assert_eq!(matrix[0], vec![0.0, 0.9, 0.1]);
    assert_eq!(matrix[2], vec![0.1, 0.9, 0.0]);
}

#[test]
fn blank_lines_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_temp(&tmp, "m.txt", "\n0 1\n\n1 0\n\n");
    let matrix = read_weight_matrix(&path).unwrap();
    assert_eq!(matrix.len(), 2);
}

#[test]
fn ragged_matrix_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_temp(&tmp, "m.txt", "0 1\n1\n");
    let err = read_weight_matrix(&path).unwrap_err();
    assert!(matches!(err, ParseError::RaggedMatrix { row: 1, .. }));
}

#[test]
fn bad_token_reports_its_line() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_temp(&tmp, "m.txt", "0 1\nx 0\n");
    let err = read_weight_matrix(&path).unwrap_err();
    assert!(matches!(err, ParseError::BadNumber { line: 2, .. }));
}

#[test]
fn empty_matrix_file_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_temp(&tmp, "m.txt", "\n\n");
    assert!(matches!(
        read_weight_matrix(&path).unwrap_err(),
        ParseError::Empty { .. }
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = read_weight_matrix(&PathBuf::from("/no/such/file")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn coordinates_pair_x_block_with_y_block() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_temp(&tmp, "c.txt", "0 1 2\n10 11 12\n");
    let coords = read_coordinates(&path, 3).unwrap();
    assert_eq!(coords, vec![(0.0, 10.0), (1.0, 11.0), (2.0, 12.0)]);

    let short = write_temp(&tmp, "short.txt", "0 1 2 10 11\n");
    assert!(matches!(
        read_coordinates(&short, 3).unwrap_err(),
        ParseError::WrongCount { expected: 6, got: 5, .. }
    ));
}

#[test]
fn frequency_vector_length_is_checked() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_temp(&tmp, "f.txt", "0.25 0.25 0.25 0.25\n");
    let freqs = read_frequencies(&path, 4).unwrap();
    assert_eq!(freqs.len(), 4);
    assert!(matches!(
        read_frequencies(&path, 3).unwrap_err(),
        ParseError::WrongCount { .. }
    ));
}

#[test]
fn walker_frequencies_form_a_distribution() {
    let weights = vec![
        vec![0.0, 0.9, 0.05, 0.05],
        vec![0.9, 0.0, 0.05, 0.05],
        vec![0.05, 0.05, 0.0, 0.9],
        vec![0.05, 0.05, 0.9, 0.0],
    ];
    let freqs = relative_frequencies(
        &weights,
        &WalkerConfig {
            steps_per_node: 2_000,
            ..WalkerConfig::default()
        },
    )
    .unwrap();

    assert_eq!(freqs.len(), 4);
    let total: f64 = freqs.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
    for &f in &freqs {
        assert!(f > 0.0);
    }
}

#[test]
fn walker_is_deterministic_for_a_fixed_seed() {
    let weights = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
    let config = WalkerConfig {
        steps_per_node: 500,
        seed: 9,
        walkers: Some(2),
        ..WalkerConfig::default()
    };
    let a = relative_frequencies(&weights, &config).unwrap();
    let b = relative_frequencies(&weights, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn walker_handles_dangling_rows() {
    // Node 1 has no outgoing weight; the walker teleports away from it.
    let weights = vec![vec![0.0, 1.0], vec![0.0, 0.0]];
    let freqs = relative_frequencies(
        &weights,
        &WalkerConfig {
            steps_per_node: 1_000,
            ..WalkerConfig::default()
        },
    )
    .unwrap();
    assert!(freqs[0] > 0.0);
    assert!(freqs[1] > 0.0);
}

#[test]
fn walker_rejects_a_ragged_matrix() {
    let weights = vec![vec![0.0, 1.0], vec![1.0]];
    assert!(relative_frequencies(&weights, &WalkerConfig::default()).is_err());
}

#[test]
fn partition_file_lists_modules_largest_first() {
    let mut net = two_cluster_network();
    greedy_search(&mut net, &GreedyOptions::default(), &CancelToken::new()).unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("out.txt");
    write_partition(&path, &net, Duration::from_millis(1500)).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next().unwrap(), "# mapseek partitioning");
    assert!(content.contains("# modules 2"));
    assert!(content.contains("# elapsed 1.500s"));

    let module_lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.starts_with('#') && !l.is_empty())
        .collect();
    assert_eq!(module_lines, vec!["0 1", "2 3"]);
}

#[test]
fn mutual_information_of_singletons_is_full_entropy() {
    let a = two_cluster_network();
    let b = two_cluster_network();
    // Four singleton modules each side: MI = log2(4) = 2 bits.
    let info = mutual_information(&a, &b).unwrap();
    assert!((info - 2.0).abs() < 1e-9);
}

#[test]
fn mutual_information_drops_after_grouping_one_side() {
    let mut grouped = two_cluster_network();
    greedy_search(&mut grouped, &GreedyOptions::default(), &CancelToken::new()).unwrap();
    let singletons = two_cluster_network();

    // Two equal halves against four singletons: 1 bit either way round.
    let info = mutual_information(&grouped, &singletons).unwrap();
    assert!((info - 1.0).abs() < 1e-9);
    let sym = mutual_information(&singletons, &grouped).unwrap();
    assert!((info - sym).abs() < 1e-12);
}

#[test]
fn mutual_information_needs_equal_node_counts() {
    let a = two_cluster_network();
    let weights = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
    let b = Network::from_matrix(&weights, &[0.5, 0.5], None, TELEPORT, true).unwrap();
    assert!(matches!(
        mutual_information(&a, &b).unwrap_err(),
        CompareError::SizeMismatch(4, 2)
    ));
}

#[test]
fn cli_parses_flags_and_positionals() {
    let args: Vec<String> = [
        "--engine=heatbath",
        "--seed",
        "7",
        "--teleport=0.2",
        "--threads=4",
        "--out",
        "result.txt",
        "--keep-dead",
        "--silent",
        "matrix.txt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let cfg = mapseek::cli::parse_args(&args).unwrap();
    assert_eq!(cfg.engine, Engine::HeatBath);
    assert_eq!(cfg.seed, 7);
    assert!((cfg.teleport_prob - 0.2).abs() < 1e-12);
    assert_eq!(cfg.threads, Some(4));
    assert_eq!(cfg.out_file, Some(PathBuf::from("result.txt")));
    assert!(cfg.keep_dead_nodes);
    assert!(cfg.silent);
    assert_eq!(cfg.matrix_file, PathBuf::from("matrix.txt"));
}

#[test]
fn cli_defaults_to_greedy() {
    let args = vec!["matrix.txt".to_string()];
    let cfg = mapseek::cli::parse_args(&args).unwrap();
    assert_eq!(cfg.engine, Engine::Greedy);
    assert!((cfg.teleport_prob - 0.15).abs() < 1e-12);
    assert_eq!(cfg.seed, 123);
    assert!(!cfg.keep_dead_nodes);
}

#[test]
fn cli_rejects_missing_matrix_and_unknown_engine() {
    assert!(mapseek::cli::parse_args(&[]).is_err());
    let args = vec!["--engine=nope".to_string(), "matrix.txt".to_string()];
    assert!(mapseek::cli::parse_args(&args).is_err());
}
