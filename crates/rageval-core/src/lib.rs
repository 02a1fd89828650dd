//! rageval-core — Exact Match and token F1 answer evaluation engine.
//!
//! This crate holds the answer normalizer, the EM/F1 scoring functions, the
//! reconciler that turns keyed or tabular inputs into the canonical shape
//! each measure needs, and the evaluator that emits one score record per
//! (measure, query) pair.

pub mod aggregate;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod measure;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod scoring;

pub use aggregate::{aggregate, calc_aggregate, AggregateScore};
pub use error::{EvalError, EvalWarning, SchemaError};
pub use evaluator::{evaluate, RagEvaluator, ScoreIter};
pub use measure::{Measure, MeasureRegistry};
pub use model::{AnswerMap, GoldAnswer, Input, QueryId, Qrels, Run, ScoreRecord, Table};
pub use reconcile::ColumnNames;
