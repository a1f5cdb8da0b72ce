//! vecnn
//!
//! Build and query approximate nearest-neighbor indexes from the command line.
//!
//! # Usage
//!
//! ```bash
//! vecnn build --data points.txt --output points.idx [--method hnsw] [--param M=16]
//! vecnn query --data points.txt --index points.idx --queries queries.txt [-k 10]
//! vecnn config
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/vecnn/config.toml)
//! 3. Environment variables (VECNN_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use vecnn_cli::{run_build, run_query, show_config, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            data,
            output,
            params,
        } => {
            run_build(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &data,
                &output,
                &params,
            )?;
        }
        Commands::Query {
            data,
            index,
            queries,
            k,
            threads,
            query_params,
        } => {
            run_query(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &data,
                &index,
                &queries,
                k,
                threads,
                &query_params,
            )?;
        }
        Commands::Config => {
            show_config(cli.config.as_deref(), cli.log_level.as_deref())?;
        }
    }

    Ok(())
}
