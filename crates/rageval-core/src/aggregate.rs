//! Aggregate statistics over per-query score records.

use serde::Serialize;

use crate::error::EvalError;
use crate::evaluator::evaluate;
use crate::measure::Measure;
use crate::model::{GoldAnswer, Input, ScoreRecord};

/// Mean score of one measure across the queries of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateScore {
    pub measure: Measure,
    /// Arithmetic mean of the per-query values.
    pub mean: f64,
    /// Number of queries averaged.
    pub count: usize,
}

/// Average records per measure. Measures appear in first-seen order.
pub fn aggregate<I>(records: I) -> Vec<AggregateScore>
where
    I: IntoIterator<Item = ScoreRecord>,
{
    let mut sums: Vec<(Measure, f64, usize)> = Vec::new();
    for record in records {
        match sums.iter_mut().find(|(m, _, _)| *m == record.measure) {
            Some((_, sum, count)) => {
                *sum += record.value;
                *count += 1;
            }
            None => sums.push((record.measure, record.value, 1)),
        }
    }

    sums.into_iter()
        .map(|(measure, sum, count)| AggregateScore {
            measure,
            mean: sum / count as f64,
            count,
        })
        .collect()
}

/// Evaluate and aggregate in one call.
pub fn calc_aggregate<S: AsRef<str>>(
    measures: &[S],
    qrels: impl Into<Input<GoldAnswer>>,
    run: impl Into<Input<String>>,
) -> Result<Vec<AggregateScore>, EvalError> {
    Ok(aggregate(evaluate(measures, qrels, run)?))
}
