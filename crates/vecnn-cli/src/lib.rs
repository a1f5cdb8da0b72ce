//! `vecnn` command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (build, query, config)
//! - `dataset`: Text vector file reader

pub mod cli;
pub mod commands;
pub mod dataset;

pub use cli::{Cli, Commands, DataArgs};
pub use commands::{build, load_settings, query, run_build, run_query, show_config};
pub use dataset::{parse_dataset, read_dataset, Dataset};
