//! On-disk layout shared by all methods.
//!
//! A persisted index is a bincode header followed by a method-specific body.
//! The header records what the structure was built against so a restore into
//! an incompatible handle fails instead of answering queries over the wrong
//! points. Vectors themselves are not stored; they come from the live store.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use vecnn_space::Space;
use vecnn_types::{Result, VecnnError, VectorStore};

/// Leading bytes of every index file.
pub const INDEX_MAGIC: [u8; 8] = *b"VECNNIDX";

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Metadata written at the start of an index file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub magic: [u8; 8],
    pub format_version: u32,
    pub method: String,
    pub space: String,
    pub dimension: u64,
    pub point_count: u64,
    pub created_at: DateTime<Utc>,
}

impl IndexHeader {
    /// Header describing an index of `method` over `store` in `space`.
    pub fn describe(method: &str, space: &dyn Space, store: &VectorStore) -> Self {
        Self {
            magic: INDEX_MAGIC,
            format_version: FORMAT_VERSION,
            method: method.to_string(),
            space: space.descriptor(),
            dimension: store.dimension().unwrap_or(0) as u64,
            point_count: store.len() as u64,
            created_at: Utc::now(),
        }
    }

    /// Check that a header read from disk fits the live configuration.
    fn check_compatible(&self, expected: &IndexHeader) -> Result<()> {
        if self.method != expected.method {
            return Err(VecnnError::ParamMismatch(format!(
                "index was built by method '{}', handle uses '{}'",
                self.method, expected.method
            )));
        }
        if self.space != expected.space {
            return Err(VecnnError::ParamMismatch(format!(
                "index was built for space '{}', handle uses '{}'",
                self.space, expected.space
            )));
        }
        if self.point_count != expected.point_count {
            return Err(VecnnError::ParamMismatch(format!(
                "index covers {} points, store holds {}",
                self.point_count, expected.point_count
            )));
        }
        if self.dimension != expected.dimension {
            return Err(VecnnError::ParamMismatch(format!(
                "index was built for dimension {}, store has {}",
                self.dimension, expected.dimension
            )));
        }
        Ok(())
    }
}

/// Write `header` and `body` to `path`.
pub fn write_index<B: Serialize>(path: &Path, header: &IndexHeader, body: &B) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, header).map_err(encode_error)?;
    bincode::serialize_into(&mut writer, body).map_err(encode_error)?;
    writer.flush()?;
    info!(
        path = ?path,
        method = %header.method,
        points = header.point_count,
        "Saved index"
    );
    Ok(())
}

/// Read an index file written by [`write_index`], validating it against
/// `expected`.
pub fn read_index<B: DeserializeOwned>(path: &Path, expected: &IndexHeader) -> Result<B> {
    let bytes = std::fs::read(path)?;

    if bytes.len() < INDEX_MAGIC.len() || bytes[..INDEX_MAGIC.len()] != INDEX_MAGIC {
        return Err(VecnnError::Format(format!(
            "{} is not a vecnn index file",
            path.display()
        )));
    }

    let header: IndexHeader = bincode::deserialize(&bytes).map_err(decode_error)?;
    if header.format_version != FORMAT_VERSION {
        return Err(VecnnError::Format(format!(
            "unsupported format version {} (expected {})",
            header.format_version, FORMAT_VERSION
        )));
    }
    header.check_compatible(expected)?;

    let header_len = bincode::serialized_size(&header).map_err(decode_error)? as usize;
    let body = bincode::deserialize(&bytes[header_len..]).map_err(decode_error)?;
    info!(
        path = ?path,
        method = %header.method,
        points = header.point_count,
        created_at = %header.created_at,
        "Loaded index"
    );
    Ok(body)
}

fn encode_error(e: bincode::Error) -> VecnnError {
    match *e {
        bincode::ErrorKind::Io(io) => VecnnError::Io(io),
        other => VecnnError::Format(format!("cannot encode index: {}", other)),
    }
}

fn decode_error(e: bincode::Error) -> VecnnError {
    VecnnError::Format(format!("corrupt index file: {}", e))
}
