pub mod anneal;
pub mod cli;
pub mod compare;
pub mod config;
pub mod cost;
pub mod graph;
pub mod greedy;
pub mod heatbath;
pub mod output;
pub mod parser;
pub mod search;
pub mod walker;
