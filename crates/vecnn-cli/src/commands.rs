//! Command implementations.
//!
//! Each `run_*` entry point loads configuration (defaults -> file -> env ->
//! CLI), initializes library logging for the duration of the command and
//! delegates to a function that does the actual work.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;
use vecnn_service::{init_library, IndexToken, KnnService, LibraryGuard, LogTarget, RowMajor};
use vecnn_types::{flatten_rows, Settings};

use crate::cli::DataArgs;
use crate::dataset::read_dataset;

/// Load settings and apply the global CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

fn init_logging(settings: &Settings) -> Result<LibraryGuard> {
    init_library(LogTarget::Stderr {
        level: settings.log_level.clone(),
    })
    .context("Failed to initialize logging")
}

fn apply_data_overrides(settings: &mut Settings, data: &DataArgs) {
    if let Some(space) = &data.space {
        settings.space = space.clone();
    }
    if !data.space_params.is_empty() {
        settings.space_params = data.space_params.clone();
    }
    if let Some(method) = &data.method {
        settings.method = method.clone();
    }
}

/// Create an index and fill it from the data file.
fn load_points(service: &KnnService, settings: &Settings, data: &DataArgs) -> Result<IndexToken> {
    let dataset = read_dataset(Path::new(&data.data), data.ids_first_column)?;
    if dataset.is_empty() {
        bail!("Vector file {} contains no vectors", data.data);
    }
    let token = service
        .create_index_from_settings(settings)
        .context("Failed to create index")?;
    service
        .add_points_rows(token, &dataset.ids, &dataset.rows)
        .with_context(|| format!("Failed to add vectors from {}", data.data))?;
    info!(points = dataset.len(), path = %data.data, "Loaded vectors");
    Ok(token)
}

/// Build an index over `data` and save it to `output`. Returns the point count.
pub fn build(settings: &Settings, data: &DataArgs, output: &Path) -> Result<usize> {
    let service = KnnService::new();
    let token = load_points(&service, settings, data)?;
    service
        .build_index(token, &settings.build_params)
        .context("Failed to build index")?;
    service
        .save_index(token, output)
        .with_context(|| format!("Failed to save index to {}", output.display()))?;
    let points = service.get_point_count(token)?;
    service.free_index(token)?;
    Ok(points)
}

/// Answer every vector in `queries` against the saved index, writing one JSON
/// line per query to `out`. Returns the number of queries answered.
pub fn query<W: Write>(
    settings: &Settings,
    data: &DataArgs,
    index: &Path,
    queries: &Path,
    out: &mut W,
) -> Result<usize> {
    let service = KnnService::new();
    let token = load_points(&service, settings, data)?;
    service
        .load_index(token, index)
        .with_context(|| format!("Failed to load index from {}", index.display()))?;
    if !settings.query_params.is_empty() {
        service
            .set_query_params(token, &settings.query_params)
            .context("Failed to set query parameters")?;
    }

    let query_set = read_dataset(queries, false)?;
    let (flat, cols) = flatten_rows(&query_set.rows).context("Query vectors are ragged")?;
    let batch = RowMajor::new(&flat, query_set.len(), cols)?;
    let matrix = service
        .knn_query_batch(token, settings.num_threads, settings.k, batch)
        .context("Query failed")?;

    for (i, ids) in matrix.iter().enumerate() {
        writeln!(out, "{}", json!({ "query": i, "ids": ids }))?;
    }
    service.free_index(token)?;
    Ok(matrix.rows())
}

pub fn run_build(
    config_path: Option<&str>,
    log_level: Option<&str>,
    data: &DataArgs,
    output: &str,
    params: &[String],
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level)?;
    apply_data_overrides(&mut settings, data);
    if !params.is_empty() {
        settings.build_params = params.to_vec();
    }
    settings.validate()?;
    let _guard = init_logging(&settings)?;

    let points = build(&settings, data, Path::new(output))?;
    info!(
        points = points,
        method = %settings.method,
        space = %settings.space,
        output = %output,
        "Index written"
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_query(
    config_path: Option<&str>,
    log_level: Option<&str>,
    data: &DataArgs,
    index: &str,
    queries: &str,
    k: Option<usize>,
    threads: Option<usize>,
    query_params: &[String],
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level)?;
    apply_data_overrides(&mut settings, data);
    if let Some(k) = k {
        settings.k = k;
    }
    if let Some(threads) = threads {
        settings.num_threads = threads;
    }
    if !query_params.is_empty() {
        settings.query_params = query_params.to_vec();
    }
    settings.validate()?;
    let _guard = init_logging(&settings)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let answered = query(
        &settings,
        data,
        Path::new(index),
        Path::new(queries),
        &mut out,
    )?;
    out.flush()?;
    info!(queries = answered, k = settings.k, "Queries answered");
    Ok(())
}

/// Print the effective configuration.
pub fn show_config(config_path: Option<&str>, log_level: Option<&str>) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    let rendered = toml::to_string_pretty(&settings).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
