//! Typed access to process environment variables.
//!
//! Every Lambda reads its settings once at start-up through these helpers, so a
//! missing or malformed variable surfaces as a `MedlabError` naming the variable.

use crate::error::{MedlabError, Result};
use std::str::FromStr;

/// Read a variable that must be present and non-empty.
pub fn required(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(MedlabError::MissingEnv(name.to_string())),
    }
}

/// Read a variable that may be absent. Empty values count as absent.
pub fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an optional variable, falling back to `default` when unset.
pub fn parsed_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match optional(name) {
        Some(raw) => raw.trim().parse().map_err(|_| MedlabError::InvalidEnv {
            name: name.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
