//! Evaluation driver.
//!
//! Setup resolves measures and builds one ground-truth view per measure;
//! each call to [`RagEvaluator::iter_calc`] then validates a run against the
//! ground truth and lazily yields a [`ScoreRecord`] per (measure, query).

use std::sync::Arc;

use crate::error::{EvalError, EvalWarning};
use crate::measure::{Measure, MeasureRegistry};
use crate::model::{GoldAnswer, Input, QueryId, Qrels, Run, ScoreRecord};
use crate::reconcile::{
    reconcile_for_measure, reconcile_predictions, reconcile_qrels, CanonicalQrels, ColumnNames,
};

/// A measure bound to the ground-truth view it scores against.
#[derive(Debug)]
struct Invocation {
    measure: Measure,
    gold: CanonicalQrels,
}

/// Scores runs against a fixed ground truth for a fixed list of measures.
#[derive(Debug)]
pub struct RagEvaluator {
    qrels: Qrels,
    invocations: Arc<[Invocation]>,
    warnings: Vec<EvalWarning>,
    columns: ColumnNames,
}

impl RagEvaluator {
    /// Set up an evaluator with the default column names.
    pub fn new<S: AsRef<str>>(
        registry: &MeasureRegistry,
        measures: &[S],
        qrels: Input<GoldAnswer>,
    ) -> Result<Self, EvalError> {
        Self::with_columns(registry, measures, qrels, ColumnNames::default())
    }

    /// Set up an evaluator reading tabular inputs with `columns`.
    ///
    /// Fails on the first unsupported measure before touching the ground
    /// truth.
    pub fn with_columns<S: AsRef<str>>(
        registry: &MeasureRegistry,
        measures: &[S],
        qrels: Input<GoldAnswer>,
        columns: ColumnNames,
    ) -> Result<Self, EvalError> {
        let measures = registry.resolve_all(measures)?;
        let qrels = reconcile_qrels(qrels, &columns)?;

        let mut invocations = Vec::with_capacity(measures.len());
        let mut warnings = Vec::new();
        for measure in measures {
            let reconciled = reconcile_for_measure(&qrels, measure)?;
            warnings.extend(reconciled.warning);
            invocations.push(Invocation {
                measure,
                gold: reconciled.qrels,
            });
        }

        tracing::debug!(
            measures = invocations.len(),
            queries = qrels.len(),
            "evaluator ready"
        );

        Ok(Self {
            qrels,
            invocations: invocations.into(),
            warnings,
            columns,
        })
    }

    /// Measures in the order records are emitted.
    pub fn measures(&self) -> Vec<Measure> {
        self.invocations.iter().map(|inv| inv.measure).collect()
    }

    /// Query ids that have ground truth.
    pub fn query_ids(&self) -> impl Iterator<Item = &QueryId> {
        self.qrels.keys()
    }

    /// Non-fatal warnings raised while building the measure views.
    pub fn warnings(&self) -> &[EvalWarning] {
        &self.warnings
    }

    /// Validate `run` and return a lazy stream of score records.
    ///
    /// Records are grouped by measure (in request order), then by query (in
    /// run order). Every call recomputes from scratch.
    pub fn iter_calc(&self, run: Input<String>) -> Result<ScoreIter, EvalError> {
        let run = reconcile_predictions(run, &self.columns)?;
        self.check_run_qids(&run)?;

        tracing::debug!(
            predictions = run.len(),
            records = run.len() * self.invocations.len(),
            "scoring run"
        );

        Ok(ScoreIter {
            invocations: Arc::clone(&self.invocations),
            run: run.into_iter().collect(),
            measure_idx: 0,
            query_idx: 0,
        })
    }

    /// Score `run` and collect every record.
    pub fn calc_all(&self, run: Input<String>) -> Result<Vec<ScoreRecord>, EvalError> {
        Ok(self.iter_calc(run)?.collect())
    }

    /// Fails with the first predicted query id, in run order, that has no
    /// ground truth.
    fn check_run_qids(&self, run: &Run) -> Result<(), EvalError> {
        match run.keys().find(|qid| !self.qrels.contains_key(qid)) {
            Some(qid) => Err(EvalError::MissingGroundTruth {
                query_ids: vec![qid.clone()],
            }),
            None => Ok(()),
        }
    }
}

/// Lazy stream of score records for one run. Not restartable.
#[derive(Debug)]
pub struct ScoreIter {
    invocations: Arc<[Invocation]>,
    run: Vec<(QueryId, String)>,
    measure_idx: usize,
    query_idx: usize,
}

impl Iterator for ScoreIter {
    type Item = ScoreRecord;

    fn next(&mut self) -> Option<ScoreRecord> {
        loop {
            let invocation = self.invocations.get(self.measure_idx)?;
            let Some((query_id, prediction)) = self.run.get(self.query_idx) else {
                self.measure_idx += 1;
                self.query_idx = 0;
                continue;
            };
            self.query_idx += 1;

            // The run was validated against the qrels the views were built from.
            if let Some(value) = invocation.gold.score(query_id, prediction) {
                return Some(ScoreRecord {
                    query_id: query_id.clone(),
                    measure: invocation.measure,
                    value,
                });
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining_measures = self.invocations.len().saturating_sub(self.measure_idx);
        let remaining = if remaining_measures == 0 {
            0
        } else {
            remaining_measures * self.run.len() - self.query_idx
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScoreIter {}

/// Evaluate `run` against `qrels` for the named measures with the standard
/// registry and default column names.
pub fn evaluate<S: AsRef<str>>(
    measures: &[S],
    qrels: impl Into<Input<GoldAnswer>>,
    run: impl Into<Input<String>>,
) -> Result<ScoreIter, EvalError> {
    let registry = MeasureRegistry::standard();
    RagEvaluator::new(&registry, measures, qrels.into())?.iter_calc(run.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerMap, Table};
    use serde_json::json;

    fn qrels() -> Qrels {
        [
            ("q1", GoldAnswer::from("University of Glasgow")),
            ("q2", GoldAnswer::from("Glasgow, Scotland")),
            ("q3", GoldAnswer::from(["multiple answer test", "answer1"])),
        ]
        .into_iter()
        .collect()
    }

    fn run() -> Run {
        [
            ("q1", "University of Glasgow".to_string()),
            ("q2", "Scotland".to_string()),
            ("q3", "answer2".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn values(records: &[ScoreRecord], measure: Measure) -> Vec<(String, f64)> {
        records
            .iter()
            .filter(|r| r.measure == measure)
            .map(|r| (r.query_id.clone(), r.value))
            .collect()
    }

    #[test]
    fn scores_reference_example() {
        let records: Vec<_> = evaluate(&["EM", "F1"], qrels(), run()).unwrap().collect();
        assert_eq!(records.len(), 6);
        assert_eq!(
            values(&records, Measure::ExactMatch),
            vec![
                ("q1".to_string(), 1.0),
                ("q2".to_string(), 0.0),
                ("q3".to_string(), 0.0)
            ]
        );

        let f1 = values(&records, Measure::F1);
        assert_eq!(f1[0], ("q1".into(), 1.0));
        assert!(f1[1].1 > 0.0 && f1[1].1 < 1.0, "q2 F1 = {}", f1[1].1);
        assert_eq!(f1[2], ("q3".into(), 0.0));
    }

    #[test]
    fn records_grouped_by_measure_then_run_order() {
        let run: Run = [("q3", "x".to_string()), ("q1", "y".to_string())]
            .into_iter()
            .collect();
        let order: Vec<_> = evaluate(&["F1", "EM"], qrels(), run)
            .unwrap()
            .map(|r| format!("{}:{}", r.measure, r.query_id))
            .collect();
        assert_eq!(order, vec!["F1:q3", "F1:q1", "EM:q3", "EM:q1"]);
    }

    #[test]
    fn partial_run_is_allowed() {
        let run: Run = [("q2", "Glasgow Scotland".to_string())].into_iter().collect();
        let records: Vec<_> = evaluate(&["EM"], qrels(), run).unwrap().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 1.0);
    }

    #[test]
    fn missing_ground_truth_reports_first_in_run_order() {
        let mut run = run();
        run.insert("q9", "nope".to_string());
        run.insert("q8", "nope".to_string());
        let err = evaluate(&["EM", "F1"], qrels(), run).unwrap_err();
        assert_eq!(
            err,
            EvalError::MissingGroundTruth {
                query_ids: vec!["q9".into()]
            }
        );
    }

    #[test]
    fn unsupported_measure_fails_at_setup() {
        let registry = MeasureRegistry::standard();
        let err = RagEvaluator::new(&registry, &["EM", "MAP"], qrels().into()).unwrap_err();
        assert_eq!(err, EvalError::UnsupportedMeasure { name: "MAP".into() });
    }

    #[test]
    fn unsupported_measure_wins_over_bad_qrels() {
        let registry = MeasureRegistry::standard();
        let table = Table::from_columns(vec![("qid", vec![json!("q1")])]);
        let err = RagEvaluator::new(&registry, &["BLEU"], table.into()).unwrap_err();
        assert!(matches!(err, EvalError::UnsupportedMeasure { .. }));
    }

    #[test]
    fn tabular_inputs_match_mapping_inputs() {
        let qrels_table = Table::from_columns(vec![
            ("qid", vec![json!("q1"), json!("q2"), json!("q3")]),
            (
                "gold_answer",
                vec![
                    json!("University of Glasgow"),
                    json!("Glasgow, Scotland"),
                    json!(["multiple answer test", "answer1"]),
                ],
            ),
        ]);
        let run_table = Table::from_columns(vec![
            ("qid", vec![json!("q1"), json!("q2"), json!("q3")]),
            (
                "pred_answer",
                vec![json!("University of Glasgow"), json!("Scotland"), json!("answer2")],
            ),
        ]);

        let from_tables: Vec<_> = evaluate(&["EM", "F1"], qrels_table.clone(), run_table)
            .unwrap()
            .collect();
        let from_maps: Vec<_> = evaluate(&["EM", "F1"], qrels(), run()).unwrap().collect();
        let mixed: Vec<_> = evaluate(&["EM", "F1"], qrels_table, run()).unwrap().collect();
        assert_eq!(from_tables, from_maps);
        assert_eq!(mixed, from_maps);
    }

    #[test]
    fn run_table_missing_prediction_column() {
        let table = Table::from_columns(vec![
            ("qid", vec![json!("q1")]),
            ("answer", vec![json!("x")]),
        ]);
        let err = evaluate(&["EM"], qrels(), table).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("pred_answer"), "got: {err}");
    }

    #[test]
    fn warnings_surface_for_f1_only() {
        let registry = MeasureRegistry::standard();
        let em_only = RagEvaluator::new(&registry, &["EM"], qrels().into()).unwrap();
        assert!(em_only.warnings().is_empty());

        let both = RagEvaluator::new(&registry, &["EM", "F1"], qrels().into()).unwrap();
        assert_eq!(both.warnings().len(), 1);
        assert_eq!(both.measures(), vec![Measure::ExactMatch, Measure::F1]);
    }

    #[test]
    fn evaluator_scores_runs_independently() {
        let registry = MeasureRegistry::standard();
        let evaluator = RagEvaluator::new(&registry, &["EM"], qrels().into()).unwrap();
        let first = evaluator.calc_all(run().into()).unwrap();
        let second = evaluator.calc_all(run().into()).unwrap();
        assert_eq!(first, second);
        assert_eq!(evaluator.query_ids().count(), 3);
    }

    #[test]
    fn size_hint_counts_remaining_records() {
        let mut iter = evaluate(&["EM", "F1"], qrels(), run()).unwrap();
        assert_eq!(iter.len(), 6);
        iter.next();
        iter.next();
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn empty_run_emits_nothing() {
        let iter = evaluate(&["EM", "F1"], qrels(), AnswerMap::<String>::new()).unwrap();
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.count(), 0);
    }
}
