//! Runs the `vecnn` binary end to end.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn vecnn() -> Command {
    Command::new(env!("CARGO_BIN_EXE_vecnn"))
}

#[test]
fn test_config_reflects_file_and_flags() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    fs::write(&config, "space = \"l1\"\nk = 7\n").unwrap();

    let output = vecnn()
        .args(["--config", config.to_str().unwrap(), "--log-level", "warn", "config"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rendered = String::from_utf8(output.stdout).unwrap();
    assert!(rendered.contains("space = \"l1\""));
    assert!(rendered.contains("k = 7"));
    assert!(rendered.contains("log_level = \"warn\""));
}

#[test]
fn test_build_and_query() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("points.txt");
    let queries = temp.path().join("queries.txt");
    let index = temp.path().join("points.idx");
    fs::write(&data, "# id x y\n10 0 0\n11 1 0\n12 10 10\n").unwrap();
    fs::write(&queries, "0,0\n").unwrap();

    let status = vecnn()
        .args(["build", "--ids-first-column", "--method", "hnsw"])
        .arg("--data")
        .arg(&data)
        .arg("--output")
        .arg(&index)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(index.exists());

    let output = vecnn()
        .args(["query", "--ids-first-column", "--method", "hnsw", "-k", "2"])
        .arg("--data")
        .arg(&data)
        .arg("--index")
        .arg(&index)
        .arg("--queries")
        .arg(&queries)
        .output()
        .unwrap();
    assert!(output.status.success());

    let line = String::from_utf8(output.stdout).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(value["query"], 0);
    assert_eq!(value["ids"], serde_json::json!([10, 11]));
}

#[test]
fn test_unknown_space_fails() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("points.txt");
    fs::write(&data, "1 2\n").unwrap();

    let output = vecnn()
        .args(["build", "--space", "hamming"])
        .arg("--data")
        .arg(&data)
        .arg("--output")
        .arg(temp.path().join("x.idx"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("hamming"));
}
