//! Evaluation error types.
//!
//! Every fatal error is raised before any score is computed, so a caller
//! never sees a partial stream followed by a failure.

use thiserror::Error;

use crate::measure::Measure;
use crate::model::QueryId;

/// A tabular or keyed input does not have the shape the evaluator needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Required columns are absent from a table.
    #[error("table missing columns: {missing:?} (found {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// A row has no value for a column the table declares.
    #[error("row {row} has no value for column '{column}'")]
    MissingCell { column: String, row: usize },

    /// A query id cell is neither a string nor a number.
    #[error("query id must be a string or number, found {found}")]
    InvalidKey { found: String },

    /// A prediction is not a single string.
    #[error("prediction for '{query_id}' must be a single string, found {found}")]
    InvalidPrediction { query_id: QueryId, found: String },

    /// A gold answer is neither a string nor a non-empty list of strings.
    #[error("gold answer for '{query_id}' is invalid: {reason}")]
    InvalidGoldAnswer { query_id: QueryId, reason: String },
}

/// Errors that abort an evaluation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A requested measure is neither EM nor F1.
    #[error("unsupported measure '{name}'")]
    UnsupportedMeasure { name: String },

    /// Predicted query ids without ground truth.
    #[error("missing gold answers for qids: {query_ids:?}")]
    MissingGroundTruth { query_ids: Vec<QueryId> },
}

impl EvalError {
    /// Returns `true` for input shape problems.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, EvalError::Schema(_))
    }
}

/// Non-fatal conditions surfaced to the caller alongside the scores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalWarning {
    /// Some queries have several gold answers but the measure scores
    /// against only the first one.
    #[error(
        "{measure}: {} question(s) have multiple gold answers; only the first answer is used",
        .query_ids.len()
    )]
    MultipleGoldAnswers {
        measure: Measure,
        query_ids: Vec<QueryId>,
    },
}
