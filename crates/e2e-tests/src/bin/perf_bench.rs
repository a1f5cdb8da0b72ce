use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use e2e_tests::{flatten, random_vectors, recall, TestHarness};
use vecnn_service::{PointId, RowMajor};

const DEFAULT_ITERATIONS: usize = 3;
const DIMENSION: usize = 32;
const K: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "perf_bench", about = "vecnn build and query benchmark harness")]
struct Args {
    #[arg(long, value_enum, default_value = "small")]
    tier: DatasetTier,
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,
    /// Worker threads for the batch step
    #[arg(long, default_value_t = 4)]
    threads: usize,
    /// Methods to measure; the first exhaustive one supplies ground truth
    #[arg(long, value_delimiter = ',', default_value = "brute_force,hnsw")]
    methods: Vec<String>,
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum DatasetTier {
    Small,
    Medium,
}

impl DatasetTier {
    fn points(&self) -> usize {
        match self {
            DatasetTier::Small => 5_000,
            DatasetTier::Medium => 50_000,
        }
    }

    fn queries(&self) -> usize {
        match self {
            DatasetTier::Small => 200,
            DatasetTier::Medium => 1_000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StepMetrics {
    p50_ms: f64,
    p90_ms: f64,
    p99_ms: f64,
    samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    queries_per_sec: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BenchmarkOutput {
    tier: DatasetTier,
    points: usize,
    queries: usize,
    dimension: usize,
    k: usize,
    threads: usize,
    iterations: usize,
    generated_at: String,
    steps: BTreeMap<String, StepMetrics>,
    recall: BTreeMap<String, f64>,
}

#[derive(Default)]
struct SampleCollector {
    durations: BTreeMap<String, Vec<f64>>,
    answers: BTreeMap<String, Vec<Vec<PointId>>>,
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    if args.methods.is_empty() {
        return Err("At least one method is required".to_string());
    }

    let corpus = random_vectors(args.tier.points(), DIMENSION, 0xbe7c);
    let queries = random_vectors(args.tier.queries(), DIMENSION, 0x9e7);
    let flat_queries = flatten(&queries);
    let batch =
        RowMajor::new(&flat_queries, queries.len(), DIMENSION).map_err(|e| e.to_string())?;

    let mut collector = SampleCollector::default();
    for _ in 0..args.iterations {
        for method in &args.methods {
            run_iteration(&mut collector, method, &corpus, &queries, batch, args.threads)?;
        }
    }

    let output = BenchmarkOutput {
        tier: args.tier,
        points: corpus.len(),
        queries: queries.len(),
        dimension: DIMENSION,
        k: K,
        threads: args.threads,
        iterations: args.iterations,
        generated_at: Utc::now().to_rfc3339(),
        steps: build_metrics(&collector, queries.len()),
        recall: build_recall(&collector, &args.methods),
    };

    let json = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    let table = render_table(&output);
    if let Some(out_dir) = &args.out_dir {
        fs::create_dir_all(out_dir).map_err(|e| format!("Failed to create out dir: {e}"))?;
        write_outputs(out_dir, &json, &table)?;
    }

    println!("{}", table);
    println!("\n{}", json);
    Ok(())
}

fn run_iteration(
    collector: &mut SampleCollector,
    method: &str,
    corpus: &[Vec<f32>],
    queries: &[Vec<f32>],
    batch: RowMajor<'_>,
    threads: usize,
) -> Result<(), String> {
    let harness = TestHarness::new();

    let start = Instant::now();
    let token = harness.build("l2", method, corpus, &[]);
    record(collector, method, "build", start);

    let start = Instant::now();
    let answers = queries
        .iter()
        .map(|q| harness.service.knn_query(token, K, q))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    record(collector, method, "query_single", start);

    let start = Instant::now();
    harness
        .service
        .knn_query_batch(token, threads, K, batch)
        .map_err(|e| e.to_string())?;
    record(collector, method, "query_batch", start);

    let start = Instant::now();
    let path = harness.index_path("bench.idx");
    harness
        .service
        .save_index(token, &path)
        .map_err(|e| e.to_string())?;
    record(collector, method, "save", start);

    collector.answers.insert(method.to_string(), answers);
    harness.service.free_index(token).map_err(|e| e.to_string())?;
    Ok(())
}

fn record(collector: &mut SampleCollector, method: &str, step: &str, start: Instant) {
    collector
        .durations
        .entry(format!("{method}/{step}"))
        .or_default()
        .push(start.elapsed().as_secs_f64() * 1000.0);
}

fn build_metrics(collector: &SampleCollector, queries: usize) -> BTreeMap<String, StepMetrics> {
    let mut steps = BTreeMap::new();
    for (step, durations) in &collector.durations {
        let mut sorted = durations.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let p50 = percentile(&sorted, 50.0);
        let queries_per_sec = (step.contains("/query") && p50 > 0.0)
            .then(|| queries as f64 / (p50 / 1000.0));

        steps.insert(
            step.clone(),
            StepMetrics {
                p50_ms: p50,
                p90_ms: percentile(&sorted, 90.0),
                p99_ms: percentile(&sorted, 99.0),
                samples: sorted.len(),
                queries_per_sec,
            },
        );
    }
    steps
}

/// Recall of every method against the first exhaustive method measured.
fn build_recall(collector: &SampleCollector, methods: &[String]) -> BTreeMap<String, f64> {
    let truth = methods
        .iter()
        .find(|m| matches!(m.as_str(), "brute_force" | "seq_search"))
        .and_then(|m| collector.answers.get(m));
    let Some(truth) = truth else {
        return BTreeMap::new();
    };
    collector
        .answers
        .iter()
        .map(|(method, answers)| (method.clone(), recall(answers, truth)))
        .collect()
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let rank = (percentile / 100.0) * (values.len() as f64 - 1.0);
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        values[low]
    } else {
        let weight = rank - low as f64;
        values[low] + (values[high] - values[low]) * weight
    }
}

fn render_table(output: &BenchmarkOutput) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Benchmark Results (points={}, queries={}, dim={}, k={}, threads={}, iterations={})",
        output.points, output.queries, output.dimension, output.k, output.threads, output.iterations
    ));
    lines.push("step\tp50_ms\tp90_ms\tp99_ms\tqps".to_string());

    for (step, metrics) in &output.steps {
        let qps = metrics
            .queries_per_sec
            .map(|q| format!("{:.1}", q))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{}\t{:.2}\t{:.2}\t{:.2}\t{}",
            step, metrics.p50_ms, metrics.p90_ms, metrics.p99_ms, qps
        ));
    }
    if !output.recall.is_empty() {
        lines.push(String::new());
        lines.push(format!("method\trecall@{}", output.k));
        for (method, r) in &output.recall {
            lines.push(format!("{}\t{:.4}", method, r));
        }
    }
    lines.join("\n")
}

fn write_outputs(out_dir: &Path, json: &str, table: &str) -> Result<(), String> {
    fs::write(out_dir.join("latest.json"), json).map_err(|e| e.to_string())?;
    fs::write(out_dir.join("latest.txt"), table).map_err(|e| e.to_string())?;
    Ok(())
}
