//! CLI argument parsing for `vecnn`.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

/// vecnn
///
/// Build and query approximate nearest-neighbor indexes over text vector files.
#[derive(Parser, Debug)]
#[command(name = "vecnn")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/vecnn/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options describing the indexed data set, shared by `build` and `query`.
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    /// Vector file: one vector per line, whitespace or comma separated
    #[arg(short, long)]
    pub data: String,

    /// Treat the first field of every line as the integer point id
    #[arg(long)]
    pub ids_first_column: bool,

    /// Space name (l2, l1, linf, lp, cosinesimil, angulardist, negdotprod, kldivgenfast)
    #[arg(long)]
    pub space: Option<String>,

    /// Space parameter as key=value (repeatable)
    #[arg(long = "space-param")]
    pub space_params: Vec<String>,

    /// Index method (brute_force, seq_search, hnsw, usearch_hnsw)
    #[arg(short, long)]
    pub method: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an index over a vector file and save it
    Build {
        #[command(flatten)]
        data: DataArgs,

        /// Where to write the index
        #[arg(short, long)]
        output: String,

        /// Build parameter as key=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },

    /// Load a saved index and answer queries, one JSON line per query
    Query {
        #[command(flatten)]
        data: DataArgs,

        /// Index file written by `build`
        #[arg(short, long)]
        index: String,

        /// Query vector file (no id column)
        #[arg(short, long)]
        queries: String,

        /// Neighbors per query
        #[arg(short)]
        k: Option<usize>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Query-time parameter as key=value (repeatable)
        #[arg(long = "query-param")]
        query_params: Vec<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}
