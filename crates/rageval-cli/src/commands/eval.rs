//! The `rageval eval` command.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;

use rageval_core::aggregate::{aggregate, AggregateScore};
use rageval_core::loader::{load_qrels, load_run};
use rageval_core::{AnswerMap, Measure, MeasureRegistry, RagEvaluator, ScoreRecord};

use crate::config::{load_config_from, parse_measure_list};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => anyhow::bail!("unknown format: '{other}' (expected text, json or markdown)"),
        }
    }
}

/// JSON output document.
#[derive(Debug, Serialize)]
struct EvalOutput<'a> {
    aggregate: &'a [AggregateScore],
    #[serde(skip_serializing_if = "Option::is_none")]
    per_query: Option<&'a [ScoreRecord]>,
    warnings: Vec<String>,
}

pub fn execute(
    qrels_path: PathBuf,
    run_path: PathBuf,
    measures: Option<String>,
    per_query: bool,
    format: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let measures = match &measures {
        Some(m) => parse_measure_list(m),
        None => config.measures.clone(),
    };
    anyhow::ensure!(!measures.is_empty(), "at least one measure is required");

    let format: OutputFormat = format.as_deref().unwrap_or(&config.format).parse()?;

    let qrels = load_qrels(&qrels_path)?;
    let run = load_run(&run_path)?;

    let registry = MeasureRegistry::standard();
    let evaluator =
        RagEvaluator::with_columns(&registry, measures.as_slice(), qrels, config.columns.clone())
            .with_context(|| format!("cannot evaluate against {}", qrels_path.display()))?;
    let records = evaluator
        .calc_all(run)
        .with_context(|| format!("cannot score run {}", run_path.display()))?;
    let scores = aggregate(records.iter().cloned());

    tracing::info!(
        measures = scores.len(),
        records = records.len(),
        "evaluation complete"
    );

    match format {
        OutputFormat::Json => {
            let output = EvalOutput {
                aggregate: &scores,
                per_query: per_query.then_some(records.as_slice()),
                warnings: evaluator.warnings().iter().map(|w| w.to_string()).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Markdown => {
            println!("{}", aggregate_markdown(&scores));
            if per_query {
                println!();
                println!("{}", per_query_markdown(&evaluator.measures(), &records));
            }
        }
        OutputFormat::Text => {
            print_aggregate_table(&scores);
            if per_query {
                print_per_query_table(&evaluator.measures(), &records);
            }
        }
    }

    Ok(())
}

/// Query ids in emission order with one value per measure.
fn pivot(records: &[ScoreRecord]) -> AnswerMap<Vec<f64>> {
    let mut rows: AnswerMap<Vec<f64>> = AnswerMap::new();
    for record in records {
        match rows.get_mut(&record.query_id) {
            Some(values) => values.push(record.value),
            None => {
                rows.insert(record.query_id.clone(), vec![record.value]);
            }
        }
    }
    rows
}

fn print_aggregate_table(scores: &[AggregateScore]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Measure", "Mean", "Queries"]);
    for score in scores {
        table.add_row(vec![
            Cell::new(score.measure),
            Cell::new(format!("{:.4}", score.mean)),
            Cell::new(score.count),
        ]);
    }
    println!("{table}");
}

fn print_per_query_table(measures: &[Measure], records: &[ScoreRecord]) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    let mut header = vec!["Query".to_string()];
    header.extend(measures.iter().map(|m| m.to_string()));
    table.set_header(header);

    for (query_id, values) in pivot(records) {
        let mut row = vec![Cell::new(query_id)];
        row.extend(values.iter().map(|v| Cell::new(format!("{v:.4}"))));
        table.add_row(row);
    }
    println!("{table}");
}

fn aggregate_markdown(scores: &[AggregateScore]) -> String {
    let mut md = String::from("| Measure | Mean | Queries |\n|---------|------|---------|\n");
    for score in scores {
        md.push_str(&format!(
            "| {} | {:.4} | {} |\n",
            score.measure, score.mean, score.count
        ));
    }
    md
}

fn per_query_markdown(measures: &[Measure], records: &[ScoreRecord]) -> String {
    let names: Vec<String> = measures.iter().map(|m| m.to_string()).collect();
    let mut md = format!("| Query | {} |\n", names.join(" | "));
    md.push_str(&format!("|-------|{}\n", "------|".repeat(names.len())));
    for (query_id, values) in pivot(records) {
        let cells: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
        md.push_str(&format!("| {query_id} | {} |\n", cells.join(" | ")));
    }
    md
}
