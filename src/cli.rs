use crate::config::{Config, Engine};
use std::path::PathBuf;

const USAGE: &str = "Usage: mapseek matrix_file [options]
Options:
  --engine=greedy|anneal|heatbath   search engine (default greedy)
  --out=FILE                        write the partitioning to FILE
  --coords=FILE                     node coordinate file
  --freqs=FILE                      measured frequency vector (skips the walk)
  --teleport=P                      teleport probability in [0, 1) (default 0.15)
  --seed=N                          RNG seed (default 123)
  --threads=N                       worker/chain count
  --start-temp=T                    start temperature (anneal, heatbath)
  --cooling-rate=R                  temperature drop per step (heatbath)
  --walker-steps=N                  walk steps per node (default 10000)
  --keep-dead                       keep nodes without edges
  --silent                          suppress progress output";

fn parse_u64(s: &str) -> Option<u64> {
    s.parse::<u64>().ok()
}

fn parse_usize(s: &str) -> Option<usize> {
    s.parse::<usize>().ok()
}

fn parse_f64(s: &str) -> Option<f64> {
    s.parse::<f64>().ok()
}

pub fn parse_args(args: &[String]) -> Result<Config, String> {
    let raw_args = args.join(" ");

    let mut matrix_file: Option<PathBuf> = None;
    let mut out_file: Option<PathBuf> = None;
    let mut coords_file: Option<PathBuf> = None;
    let mut freq_file: Option<PathBuf> = None;

    let mut engine = Engine::Greedy;
    let mut teleport_prob = 0.15f64;
    let mut seed = 123u64;
    let mut threads: Option<usize> = None;
    let mut keep_dead_nodes = false;
    let mut start_temperature = 20.0f64;
    let mut cooling_rate = 0.1f64;
    let mut walker_steps = 10_000u64;
    let mut silent = false;

    let mut i = 0usize;
    while i < args.len() {
        let tok = &args[i];

        if let Some(rest) = tok.strip_prefix("--engine=") {
            engine = Engine::from_name(rest)
                .ok_or_else(|| format!("unknown engine {:?}\n{}", rest, USAGE))?;
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--out=") {
            out_file = Some(PathBuf::from(rest));
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--coords=") {
            coords_file = Some(PathBuf::from(rest));
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--freqs=") {
            freq_file = Some(PathBuf::from(rest));
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--teleport=") {
            if let Some(v) = parse_f64(rest) {
                teleport_prob = v;
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--seed=") {
            if let Some(v) = parse_u64(rest) {
                seed = v;
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--threads=") {
            if let Some(v) = parse_usize(rest) {
                if v > 0 {
                    threads = Some(v);
                }
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--start-temp=") {
            if let Some(v) = parse_f64(rest) {
                start_temperature = v;
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--cooling-rate=") {
            if let Some(v) = parse_f64(rest) {
                cooling_rate = v;
            }
            i += 1;
            continue;
        }
        if let Some(rest) = tok.strip_prefix("--walker-steps=") {
            if let Some(v) = parse_u64(rest) {
                walker_steps = v;
            }
            i += 1;
            continue;
        }

        match tok.as_str() {
            "--engine" => {
                if let Some(next) = args.get(i + 1) {
                    engine = Engine::from_name(next)
                        .ok_or_else(|| format!("unknown engine {:?}\n{}", next, USAGE))?;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--out" | "-o" => {
                if let Some(next) = args.get(i + 1) {
                    out_file = Some(PathBuf::from(next));
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--coords" => {
                if let Some(next) = args.get(i + 1) {
                    coords_file = Some(PathBuf::from(next));
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--freqs" => {
                if let Some(next) = args.get(i + 1) {
                    freq_file = Some(PathBuf::from(next));
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--teleport" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_f64(next) {
                        teleport_prob = v;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--seed" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_u64(next) {
                        seed = v;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--threads" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_usize(next) {
                        if v > 0 {
                            threads = Some(v);
                        }
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--start-temp" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_f64(next) {
                        start_temperature = v;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--cooling-rate" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_f64(next) {
                        cooling_rate = v;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--walker-steps" => {
                if let Some(next) = args.get(i + 1) {
                    if let Some(v) = parse_u64(next) {
                        walker_steps = v;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--keep-dead" => {
                keep_dead_nodes = true;
                i += 1;
            }
            "--silent" => {
                silent = true;
                i += 1;
            }
            _ if tok.starts_with('-') => {
                i += 1;
            }
            _ => {
                if matrix_file.is_none() {
                    matrix_file = Some(PathBuf::from(tok));
                }
                i += 1;
            }
        }
    }

    let matrix_file = matrix_file.ok_or_else(|| USAGE.to_string())?;

    Ok(Config {
        raw_args,
        matrix_file,
        out_file,
        coords_file,
        freq_file,
        engine,
        teleport_prob,
        seed,
        threads,
        keep_dead_nodes,
        start_temperature,
        cooling_rate,
        walker_steps,
        silent,
    })
}
