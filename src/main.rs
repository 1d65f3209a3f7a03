use mapseek::anneal::{anneal_search, AnnealOptions};
use mapseek::config::Engine;
use mapseek::graph::Network;
use mapseek::greedy::{greedy_search, GreedyOptions};
use mapseek::heatbath::{heat_bath_search, HeatBathOptions};
use mapseek::search::CancelToken;
use mapseek::walker::WalkerConfig;
use std::env;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cfg = mapseek::cli::parse_args(&args)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let start = Instant::now();

    let weights =
        mapseek::parser::read_weight_matrix(&cfg.matrix_file).map_err(|e| e.to_string())?;
    let n = weights.len();

    let frequencies = match &cfg.freq_file {
        Some(path) => mapseek::parser::read_frequencies(path, n).map_err(|e| e.to_string())?,
        None => mapseek::walker::relative_frequencies(
            &weights,
            &WalkerConfig {
                teleport_prob: cfg.teleport_prob,
                steps_per_node: cfg.walker_steps,
                seed: cfg.seed,
                walkers: cfg.threads,
            },
        )
        .map_err(|e| e.to_string())?,
    };

    let coordinates = match &cfg.coords_file {
        Some(path) => {
            Some(mapseek::parser::read_coordinates(path, n).map_err(|e| e.to_string())?)
        }
        None => None,
    };

    let mut net = Network::from_matrix(
        &weights,
        &frequencies,
        coordinates.as_deref(),
        cfg.teleport_prob,
        !cfg.keep_dead_nodes,
    )
    .map_err(|e| e.to_string())?;

    if !cfg.silent {
        println!(
            "Loaded {} nodes, flat entropy {}",
            net.node_count(),
            net.flat_entropy()
        );
    }

    let cancel = CancelToken::new();
    let outcome = match cfg.engine {
        Engine::Greedy => greedy_search(
            &mut net,
            &GreedyOptions {
                threads: cfg.threads,
            },
            &cancel,
        ),
        Engine::Anneal => anneal_search(
            &mut net,
            &AnnealOptions {
                start_temperature: cfg.start_temperature,
                chains: cfg.threads,
                seed: cfg.seed,
            },
            &cancel,
        ),
        Engine::HeatBath => heat_bath_search(
            &mut net,
            &HeatBathOptions {
                start_temperature: cfg.start_temperature,
                cooling_rate: cfg.cooling_rate,
                seed: cfg.seed,
                threads: cfg.threads,
            },
            &cancel,
        ),
    }
    .map_err(|e| e.to_string())?;

    let elapsed = start.elapsed();

    if let Some(out_file) = &cfg.out_file {
        mapseek::output::write_partition(out_file, &net, elapsed).map_err(|e| e.to_string())?;
    }

    if !cfg.silent {
        println!(
            "Partitioned into {} modules, cost {} ({} steps, {:.3}s)",
            outcome.num_modules,
            outcome.cost,
            outcome.steps,
            elapsed.as_secs_f64()
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
