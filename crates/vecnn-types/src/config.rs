//! Configuration loading for vecnn.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/vecnn/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::VecnnError;
use crate::params::Params;
use crate::tags::{DataType, DistType};

/// Main settings for building and querying an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Space (distance family) name, e.g. "l2" or "cosinesimil"
    #[serde(default = "default_space")]
    pub space: String,

    /// Space parameters as key=value strings
    #[serde(default)]
    pub space_params: Vec<String>,

    /// Index method name, e.g. "hnsw" or "brute_force"
    #[serde(default = "default_method")]
    pub method: String,

    /// Build-time parameters as key=value strings
    #[serde(default)]
    pub build_params: Vec<String>,

    /// Query-time parameters as key=value strings
    #[serde(default)]
    pub query_params: Vec<String>,

    /// Number of neighbors returned per query
    #[serde(default = "default_k")]
    pub k: usize,

    /// Worker threads for batch queries
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Distance value type
    #[serde(default = "default_dist_type")]
    pub dist_type: DistType,

    /// Data encoding
    #[serde(default = "default_data_type")]
    pub data_type: DataType,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_space() -> String {
    "l2".to_string()
}

fn default_method() -> String {
    "hnsw".to_string()
}

fn default_k() -> usize {
    10
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_dist_type() -> DistType {
    DistType::Float
}

fn default_data_type() -> DataType {
    DataType::Vector
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            space: default_space(),
            space_params: Vec::new(),
            method: default_method(),
            build_params: Vec::new(),
            query_params: Vec::new(),
            k: default_k(),
            num_threads: default_num_threads(),
            dist_type: default_dist_type(),
            data_type: default_data_type(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/vecnn/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (VECNN_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, VecnnError> {
        let config_dir = ProjectDirs::from("", "", "vecnn")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| VecnnError::Config(e.to_string()))?
            .set_default("space", default_space())
            .map_err(|e| VecnnError::Config(e.to_string()))?
            .set_default("method", default_method())
            .map_err(|e| VecnnError::Config(e.to_string()))?
            .set_default("k", default_k() as i64)
            .map_err(|e| VecnnError::Config(e.to_string()))?
            .set_default("num_threads", default_num_threads() as i64)
            .map_err(|e| VecnnError::Config(e.to_string()))?
            .set_default("dist_type", default_dist_type().as_str())
            .map_err(|e| VecnnError::Config(e.to_string()))?
            .set_default("data_type", default_data_type().as_str())
            .map_err(|e| VecnnError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: VECNN_LOG_LEVEL, VECNN_NUM_THREADS, VECNN_SPACE, etc.
        builder = builder.add_source(
            Environment::with_prefix("VECNN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| VecnnError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| VecnnError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), VecnnError> {
        if self.k == 0 {
            return Err(VecnnError::Config("k must be >= 1".to_string()));
        }
        if self.num_threads == 0 {
            return Err(VecnnError::Config("num_threads must be >= 1".to_string()));
        }
        Params::parse(&self.space_params)?;
        Params::parse(&self.build_params)?;
        Params::parse(&self.query_params)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.space, "l2");
        assert_eq!(settings.method, "hnsw");
        assert_eq!(settings.k, 10);
        assert!(settings.num_threads >= 1);
        assert_eq!(settings.dist_type, DistType::Float);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "space = \"cosinesimil\"\nmethod = \"brute_force\"\nk = 3\nbuild_params = [\"M=8\"]"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.space, "cosinesimil");
        assert_eq!(settings.method, "brute_force");
        assert_eq!(settings.k, 3);
        assert_eq!(settings.build_params, vec!["M=8".to_string()]);
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.k = 0;
        assert!(settings.validate().is_err());

        settings.k = 5;
        settings.query_params = vec!["efSearch".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.space, "l2");
        assert_eq!(decoded.data_type, DataType::Vector);
    }
}
