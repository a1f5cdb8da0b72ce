//! Text vector files.
//!
//! One vector per line, components separated by whitespace and/or commas.
//! Blank lines and lines starting with `#` are skipped. Without an id column
//! the point id is the vector's ordinal in the file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use vecnn_types::PointId;

/// Vectors read from a file, with their ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub ids: Vec<PointId>,
    pub rows: Vec<Vec<f32>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn read_dataset(path: &Path, ids_first_column: bool) -> Result<Dataset> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read vector file {}", path.display()))?;
    parse_dataset(&text, ids_first_column)
        .with_context(|| format!("Invalid vector file {}", path.display()))
}

pub fn parse_dataset(text: &str, ids_first_column: bool) -> Result<Dataset> {
    let mut dataset = Dataset::default();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty());

        let id = if ids_first_column {
            let field = fields
                .next()
                .with_context(|| format!("line {}: missing id", line_no + 1))?;
            field
                .parse::<PointId>()
                .with_context(|| format!("line {}: invalid id '{}'", line_no + 1, field))?
        } else {
            PointId::try_from(dataset.rows.len())
                .with_context(|| format!("line {}: too many vectors", line_no + 1))?
        };

        let row = fields
            .map(|f| {
                f.parse::<f32>()
                    .with_context(|| format!("line {}: invalid number '{}'", line_no + 1, f))
            })
            .collect::<Result<Vec<f32>>>()?;
        if row.is_empty() {
            bail!("line {}: no vector components", line_no + 1);
        }

        dataset.ids.push(id);
        dataset.rows.push(row);
    }
    Ok(dataset)
}
