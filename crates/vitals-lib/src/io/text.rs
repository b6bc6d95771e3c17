use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse newline-delimited JSON records, ignoring blank/comment lines.
pub fn parse_json_lines<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(trimmed)
            .with_context(|| format!("line {} is not a valid record: {}", idx + 1, trimmed))?;
        out.push(record);
    }
    Ok(out)
}

/// Read newline-delimited JSON records from disk.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_json_lines(&text)
}
