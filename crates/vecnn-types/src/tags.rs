//! Distance value and data encoding tags.
//!
//! Numeric codes are stable: they are what host bindings pass across the
//! boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VecnnError};

/// Numeric type of computed distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistType {
    Float,
    Int,
}

impl DistType {
    pub const FLOAT_CODE: i32 = 4;
    pub const INT_CODE: i32 = 5;

    pub fn code(&self) -> i32 {
        match self {
            DistType::Float => Self::FLOAT_CODE,
            DistType::Int => Self::INT_CODE,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            Self::FLOAT_CODE => Ok(DistType::Float),
            Self::INT_CODE => Ok(DistType::Int),
            other => Err(VecnnError::Parameter(format!(
                "unknown dist type - {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistType::Float => "FLOAT",
            DistType::Int => "INT",
        }
    }

    /// Only floating-point distances are supported by the vector index.
    pub fn ensure_supported(&self) -> Result<()> {
        match self {
            DistType::Float => Ok(()),
            DistType::Int => Err(VecnnError::Parameter(
                "This version is optimized for vectors. \
                 Use the generic (non-vector) bindings for dist type INT"
                    .to_string(),
            )),
        }
    }
}

impl FromStr for DistType {
    type Err = VecnnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "FLOAT" => Ok(DistType::Float),
            "INT" => Ok(DistType::Int),
            _ => Err(VecnnError::Parameter(format!("unknown dist type - {}", s))),
        }
    }
}

impl fmt::Display for DistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of data points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    Vector,
    String,
}

impl DataType {
    pub const VECTOR_CODE: i32 = 1;
    pub const STRING_CODE: i32 = 2;

    pub fn code(&self) -> i32 {
        match self {
            DataType::Vector => Self::VECTOR_CODE,
            DataType::String => Self::STRING_CODE,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            Self::VECTOR_CODE => Ok(DataType::Vector),
            Self::STRING_CODE => Ok(DataType::String),
            other => Err(VecnnError::Parameter(format!(
                "unknown data type - {}",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Vector => "VECTOR",
            DataType::String => "STRING",
        }
    }

    /// Only dense float vectors have a reader.
    pub fn ensure_supported(&self) -> Result<()> {
        match self {
            DataType::Vector => Ok(()),
            DataType::String => Err(VecnnError::Parameter(
                "data type STRING is not supported by the vector index".to_string(),
            )),
        }
    }
}

impl FromStr for DataType {
    type Err = VecnnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "VECTOR" => Ok(DataType::Vector),
            "STRING" => Ok(DataType::String),
            _ => Err(VecnnError::Parameter(format!("unknown data type - {}", s))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
