use std::path::PathBuf;

/// Which search engine a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Greedy,
    Anneal,
    HeatBath,
}

impl Engine {
    pub fn from_name(name: &str) -> Option<Engine> {
        match name {
            "greedy" => Some(Engine::Greedy),
            "anneal" | "annealing" => Some(Engine::Anneal),
            "heatbath" | "heat-bath" => Some(Engine::HeatBath),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw_args: String,
    pub matrix_file: PathBuf,
    pub out_file: Option<PathBuf>,
    pub coords_file: Option<PathBuf>,
    pub freq_file: Option<PathBuf>,
    pub engine: Engine,
    pub teleport_prob: f64,
    pub seed: u64,
    pub threads: Option<usize>,
    pub keep_dead_nodes: bool,
    pub start_temperature: f64,
    pub cooling_rate: f64,
    pub walker_steps: u64,
    pub silent: bool,
}
