//! Deck definition files.
//!
//! A deck definition is either a line-oriented list of card codes (blank
//! lines and `#` comments ignored) or a JSON array of strings.

use std::path::Path;

use crate::error::{DeckError, Result};

/// Parse deck definition text into an ordered list of card codes.
///
/// Codes are returned trimmed but otherwise as written; validation is the
/// catalog's job.
pub fn parse_deck(content: &str) -> Result<Vec<String>> {
    if content.trim_start().starts_with('[') {
        let codes: Vec<String> = serde_json::from_str(content)?;
        return Ok(codes.into_iter().map(|c| c.trim().to_string()).collect());
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Read and parse a deck definition file.
pub fn read_deck(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| DeckError::DeckFileError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    parse_deck(&content).map_err(|e| DeckError::DeckFileError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
