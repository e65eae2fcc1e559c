//! Serde helpers for form-style request bodies where an empty string means "not supplied".

use std::fmt::Display;
use std::str::FromStr;

use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Deserializes `null`, `""`, a number or a string into `Option<T>` via `FromStr`.
pub fn opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let text = match Option::<Raw>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Raw::Int(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
        Some(Raw::Text(s)) => s,
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    // Free text keeps its whitespace; ids and dates may arrive padded.
    match text.parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) => trimmed.parse().map(Some).map_err(D::Error::custom),
    }
}
