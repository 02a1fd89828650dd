//! Input reconciliation.
//!
//! Converts keyed or tabular ground truth and predictions into keyed
//! mappings, then derives the view of the ground truth each measure scores
//! against: EM wants every acceptable answer, F1 wants exactly one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EvalWarning, SchemaError};
use crate::measure::Measure;
use crate::model::{AnswerMap, GoldAnswer, Input, Qrels, Run, Table};
use crate::scoring::{exact_match, f1_score};

/// Column names used to read tabular inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Query id column, shared by qrels and runs.
    pub query_id: String,
    /// Gold answer column of qrels tables.
    pub gold_answer: String,
    /// Predicted answer column of run tables.
    pub pred_answer: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            query_id: "qid".to_string(),
            gold_answer: "gold_answer".to_string(),
            pred_answer: "pred_answer".to_string(),
        }
    }
}

/// A value that can be read from a table cell or a JSON mapping value.
pub trait FromCell: Sized {
    fn from_cell(query_id: &str, value: &Value) -> Result<Self, SchemaError>;
}

impl FromCell for GoldAnswer {
    fn from_cell(query_id: &str, value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::String(s) => Ok(GoldAnswer::Single(s.clone())),
            Value::Array(items) => {
                let answers = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        other => Err(SchemaError::InvalidGoldAnswer {
                            query_id: query_id.to_string(),
                            reason: format!("list contains a {}", value_kind(other)),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let answer = GoldAnswer::Multiple(answers);
                check_gold(query_id, &answer)?;
                Ok(answer)
            }
            other => Err(SchemaError::InvalidGoldAnswer {
                query_id: query_id.to_string(),
                reason: format!("expected a string or list of strings, found {}", value_kind(other)),
            }),
        }
    }
}

impl FromCell for String {
    fn from_cell(query_id: &str, value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(SchemaError::InvalidPrediction {
                query_id: query_id.to_string(),
                found: value_kind(other).to_string(),
            }),
        }
    }
}

/// Short name of a JSON value's type, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn check_gold(query_id: &str, answer: &GoldAnswer) -> Result<(), SchemaError> {
    if answer.is_empty() {
        return Err(SchemaError::InvalidGoldAnswer {
            query_id: query_id.to_string(),
            reason: "answer list is empty".to_string(),
        });
    }
    Ok(())
}

fn cell_key(value: &Value) -> Result<String, SchemaError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(SchemaError::InvalidKey {
            found: value_kind(other).to_string(),
        }),
    }
}

/// Turn an input into a keyed mapping.
///
/// Mappings pass through unchanged. Tables must carry both named columns;
/// the value column's cells are taken as-is.
pub fn to_mapping<V: FromCell>(
    input: Input<V>,
    key_column: &str,
    value_column: &str,
) -> Result<AnswerMap<V>, SchemaError> {
    match input {
        Input::Mapping(map) => Ok(map),
        Input::Table(table) => table_to_mapping(&table, key_column, value_column),
    }
}

fn table_to_mapping<V: FromCell>(
    table: &Table,
    key_column: &str,
    value_column: &str,
) -> Result<AnswerMap<V>, SchemaError> {
    let missing: Vec<String> = [key_column, value_column]
        .into_iter()
        .filter(|c| !table.has_column(c))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            missing,
            found: table.columns().to_vec(),
        });
    }

    let mut map = AnswerMap::with_capacity(table.len());
    for (row_idx, row) in table.rows().iter().enumerate() {
        let cell = |column: &str| {
            row.get(column).ok_or_else(|| SchemaError::MissingCell {
                column: column.to_string(),
                row: row_idx,
            })
        };
        let query_id = cell_key(cell(key_column)?)?;
        let value = V::from_cell(&query_id, cell(value_column)?)?;
        map.insert(query_id, value);
    }
    Ok(map)
}

/// Ground truth as a keyed mapping, read with the configured columns.
pub fn reconcile_qrels(
    qrels: Input<GoldAnswer>,
    columns: &ColumnNames,
) -> Result<Qrels, SchemaError> {
    to_mapping(qrels, &columns.query_id, &columns.gold_answer)
}

/// Predictions as a keyed mapping, read with the configured columns.
pub fn reconcile_predictions(run: Input<String>, columns: &ColumnNames) -> Result<Run, SchemaError> {
    to_mapping(run, &columns.query_id, &columns.pred_answer)
}

// ---------------------------------------------------------------------------
// Per-measure views
// ---------------------------------------------------------------------------

/// Ground truth in the shape one measure scores against.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalQrels {
    /// Every acceptable answer per query (EM).
    AnswerSets(AnswerMap<Vec<String>>),
    /// A single answer per query (F1).
    SingleAnswers(AnswerMap<String>),
}

impl CanonicalQrels {
    pub fn measure(&self) -> Measure {
        match self {
            CanonicalQrels::AnswerSets(_) => Measure::ExactMatch,
            CanonicalQrels::SingleAnswers(_) => Measure::F1,
        }
    }

    pub fn contains(&self, query_id: &str) -> bool {
        match self {
            CanonicalQrels::AnswerSets(map) => map.contains_key(query_id),
            CanonicalQrels::SingleAnswers(map) => map.contains_key(query_id),
        }
    }

    /// Score a prediction for a query, or `None` when the query has no
    /// ground truth.
    pub fn score(&self, query_id: &str, prediction: &str) -> Option<f64> {
        match self {
            CanonicalQrels::AnswerSets(map) => map
                .get(query_id)
                .map(|golds| exact_match(prediction, golds.as_slice())),
            CanonicalQrels::SingleAnswers(map) => {
                map.get(query_id).map(|gold| f1_score(prediction, gold))
            }
        }
    }
}

/// A per-measure view plus any warning raised while building it.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub qrels: CanonicalQrels,
    pub warning: Option<EvalWarning>,
}

/// Every gold value as a non-empty list of answers.
pub fn reconcile_exact_match(qrels: &Qrels) -> Result<AnswerMap<Vec<String>>, SchemaError> {
    let mut out = AnswerMap::with_capacity(qrels.len());
    for (query_id, answer) in qrels.iter() {
        check_gold(query_id, answer)?;
        let answers = match answer {
            GoldAnswer::Single(s) => vec![s.clone()],
            GoldAnswer::Multiple(list) => list.clone(),
        };
        out.insert(query_id.clone(), answers);
    }
    Ok(out)
}

/// Every gold value as a single answer, keeping the first of a list.
///
/// Returns a warning naming the queries whose extra answers were dropped.
pub fn reconcile_f1(
    qrels: &Qrels,
) -> Result<(AnswerMap<String>, Option<EvalWarning>), SchemaError> {
    let mut out = AnswerMap::with_capacity(qrels.len());
    let mut dropped = Vec::new();
    for (query_id, answer) in qrels.iter() {
        let first = answer.first().ok_or_else(|| SchemaError::InvalidGoldAnswer {
            query_id: query_id.clone(),
            reason: "answer list is empty".to_string(),
        })?;
        if answer.len() > 1 {
            dropped.push(query_id.clone());
        }
        out.insert(query_id.clone(), first.to_string());
    }

    let warning = if dropped.is_empty() {
        None
    } else {
        let warning = EvalWarning::MultipleGoldAnswers {
            measure: Measure::F1,
            query_ids: dropped,
        };
        tracing::warn!("{warning}");
        Some(warning)
    };
    Ok((out, warning))
}

/// Build the view of `qrels` that `measure` scores against.
pub fn reconcile_for_measure(qrels: &Qrels, measure: Measure) -> Result<Reconciled, SchemaError> {
    match measure {
        Measure::ExactMatch => Ok(Reconciled {
            qrels: CanonicalQrels::AnswerSets(reconcile_exact_match(qrels)?),
            warning: None,
        }),
        Measure::F1 => {
            let (answers, warning) = reconcile_f1(qrels)?;
            Ok(Reconciled {
                qrels: CanonicalQrels::SingleAnswers(answers),
                warning,
            })
        }
    }
}
