//! `key=value` parameter lists.
//!
//! Spaces, build-time and query-time configuration are all passed as ordered
//! lists of `key=value` strings. Consumers read them through a [`ParamReader`],
//! which rejects any key left unread so typos surface as errors instead of
//! silently falling back to defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VecnnError};

/// Ordered list of parsed `key=value` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of `key=value` strings.
    ///
    /// Keys and values are trimmed. Entries without `=`, with an empty key,
    /// or repeating an earlier key are rejected.
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let mut params = Self::new();
        for item in items {
            let item = item.as_ref();
            let (key, value) = item.split_once('=').ok_or_else(|| {
                VecnnError::Parameter(format!("expected key=value, got '{}'", item))
            })?;
            params.insert(key.trim(), value.trim())?;
        }
        Ok(params)
    }

    /// Append a parameter; fails if the key is empty or already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(VecnnError::Parameter(
                "parameter name must not be empty".to_string(),
            ));
        }
        if self.get(&key).is_some() {
            return Err(VecnnError::Parameter(format!(
                "duplicate parameter '{}'",
                key
            )));
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Builder-style insert for known-good parameters.
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Result<Self> {
        self.insert(key, value.to_string())?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render back to `key=value` strings, preserving order.
    pub fn to_strings(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect()
    }

    /// Start reading typed values out of this list.
    pub fn reader(&self) -> ParamReader<'_> {
        ParamReader {
            params: self,
            consumed: vec![false; self.entries.len()],
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(","))
    }
}

/// Typed access to a [`Params`] list that tracks which keys were consumed.
pub struct ParamReader<'a> {
    params: &'a Params,
    consumed: Vec<bool>,
}

impl<'a> ParamReader<'a> {
    /// Read an optional value.
    pub fn get_optional<T>(&mut self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(pos) = self.params.entries.iter().position(|(k, _)| k == key) else {
            return Ok(None);
        };
        self.consumed[pos] = true;
        let raw = &self.params.entries[pos].1;
        raw.parse::<T>().map(Some).map_err(|e| {
            VecnnError::Parameter(format!("cannot parse '{}' for parameter '{}': {}", raw, key, e))
        })
    }

    /// Read a value, falling back to `default` when absent.
    pub fn get<T>(&mut self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.get_optional(key)?.unwrap_or(default))
    }

    /// Read a value that must be present.
    pub fn get_required<T>(&mut self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get_optional(key)?.ok_or_else(|| {
            VecnnError::Parameter(format!("missing required parameter '{}'", key))
        })
    }

    /// Finish reading; fails if any parameter was never consumed.
    pub fn finish(self) -> Result<()> {
        let unknown: Vec<&str> = self
            .params
            .entries
            .iter()
            .zip(&self.consumed)
            .filter(|(_, used)| !**used)
            .map(|((k, _), _)| k.as_str())
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(VecnnError::Config(format!(
                "unknown parameter(s): {}",
                unknown.join(", ")
            )))
        }
    }
}
