//! Qrels and run file loading.
//!
//! Accepted layouts:
//! - `.json` holding an object: a keyed mapping from query id to answer;
//! - `.json` holding an array of records: a table;
//! - `.jsonl` / `.ndjson`: one record per line, read as a table.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::model::{AnswerMap, GoldAnswer, Input, Table};
use crate::reconcile::FromCell;

/// Top-level shape of a `.json` input file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Mapping(AnswerMap<Value>),
    Records(Vec<Map<String, Value>>),
}

/// Load ground truth from a file.
pub fn load_qrels(path: &Path) -> Result<Input<GoldAnswer>> {
    load_input(path)
}

/// Load predictions from a file.
pub fn load_run(path: &Path) -> Result<Input<String>> {
    load_input(path)
}

/// Load a keyed or tabular input, choosing the layout from the extension.
pub fn load_input<V: FromCell>(path: &Path) -> Result<Input<V>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))?;

    let is_lines = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jsonl" | "ndjson"))
        .unwrap_or(false);

    if is_lines {
        parse_json_lines(&content, path)
    } else {
        parse_json_str(&content, path)
    }
}

/// Parse a JSON document (useful for testing).
pub fn parse_json_str<V: FromCell>(content: &str, source_path: &Path) -> Result<Input<V>> {
    let document: JsonDocument = serde_json::from_str(content).with_context(|| {
        format!(
            "failed to parse {}: expected a JSON object or an array of records",
            source_path.display()
        )
    })?;

    match document {
        JsonDocument::Mapping(raw) => {
            let mut map = AnswerMap::with_capacity(raw.len());
            for (query_id, value) in raw {
                let value = V::from_cell(&query_id, &value)
                    .with_context(|| format!("invalid entry in {}", source_path.display()))?;
                map.insert(query_id, value);
            }
            Ok(Input::Mapping(map))
        }
        JsonDocument::Records(rows) => Ok(Input::Table(Table::from_records(rows))),
    }
}

/// Parse JSON Lines records into a table. Blank lines are skipped.
pub fn parse_json_lines<V>(content: &str, source_path: &Path) -> Result<Input<V>> {
    let rows = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<Map<String, Value>>(line).with_context(|| {
                format!(
                    "failed to parse {} line {}: expected a JSON object",
                    source_path.display(),
                    idx + 1
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Input::Table(Table::from_records(rows)))
}
