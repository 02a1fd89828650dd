//! End-to-end pipeline tests.
//!
//! Loads the bundled qrels and runs from disk, scores them through the
//! evaluator, and checks per-query and aggregate values.

use std::path::Path;

use rageval_core::loader::{load_qrels, load_run};
use rageval_core::{aggregate, EvalError, Measure, MeasureRegistry, RagEvaluator, ScoreRecord};

fn testdata(name: &str) -> std::path::PathBuf {
    Path::new("../../testdata").join(name)
}

fn score(qrels: &str, run: &str) -> Result<Vec<ScoreRecord>, EvalError> {
    let registry = MeasureRegistry::standard();
    let evaluator = RagEvaluator::new(
        &registry,
        &["EM", "F1"],
        load_qrels(&testdata(qrels)).unwrap(),
    )?;
    evaluator.calc_all(load_run(&testdata(run)).unwrap())
}

fn lookup(records: &[ScoreRecord], query_id: &str, measure: Measure) -> f64 {
    records
        .iter()
        .find(|r| r.query_id == query_id && r.measure == measure)
        .map(|r| r.value)
        .unwrap_or_else(|| panic!("no {measure} record for {query_id}"))
}

#[test]
fn mapping_files_score_reference_example() {
    let records = score("qrels.json", "run.json").unwrap();
    assert_eq!(records.len(), 6);

    assert_eq!(lookup(&records, "q1", Measure::ExactMatch), 1.0);
    assert_eq!(lookup(&records, "q2", Measure::ExactMatch), 0.0);
    assert_eq!(lookup(&records, "q3", Measure::ExactMatch), 0.0);

    let q2_f1 = lookup(&records, "q2", Measure::F1);
    assert!(q2_f1 > 0.0 && q2_f1 < 1.0, "q2 F1 = {q2_f1}");
    assert_eq!(lookup(&records, "q1", Measure::F1), 1.0);
}

#[test]
fn every_input_layout_gives_the_same_scores() {
    let baseline = score("qrels.json", "run.json").unwrap();
    for (qrels, run) in [
        ("qrels.jsonl", "run_records.json"),
        ("qrels.json", "run_records.json"),
        ("qrels.jsonl", "run.json"),
    ] {
        assert_eq!(score(qrels, run).unwrap(), baseline, "{qrels} + {run}");
    }
}

#[test]
fn aggregate_means() {
    let stats = aggregate(score("qrels.json", "run.json").unwrap());
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].measure, Measure::ExactMatch);
    assert!((stats[0].mean - 1.0 / 3.0).abs() < 1e-12);
    assert!((stats[1].mean - 5.0 / 9.0).abs() < 1e-12);
}

#[test]
fn unknown_query_in_run_is_rejected() {
    let err = score("qrels.json", "run_unknown_qid.json").unwrap_err();
    assert_eq!(
        err,
        EvalError::MissingGroundTruth {
            query_ids: vec!["q4".to_string()]
        }
    );
}

#[test]
fn qrels_without_gold_column_is_schema_error() {
    let err = score("qrels_no_gold.jsonl", "run.json").unwrap_err();
    assert!(err.is_schema_error());
    assert!(err.to_string().contains("gold_answer"), "got: {err}");
}
