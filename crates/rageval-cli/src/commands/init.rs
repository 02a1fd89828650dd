//! The `rageval init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("rageval.toml").exists() {
        println!("rageval.toml already exists, skipping.");
    } else {
        std::fs::write("rageval.toml", SAMPLE_CONFIG)?;
        println!("Created rageval.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust the column names in rageval.toml to match your tabular files");
    println!("  2. Run: rageval eval --qrels qrels.json --run run.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# rageval configuration

# Measures computed when --measures is not given.
measures = ["EM", "F1"]

# Output format: text, json, markdown
format = "text"

# Column names used by .jsonl files and .json arrays of records.
[columns]
query_id = "qid"
gold_answer = "gold_answer"
pred_answer = "pred_answer"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RagevalConfig;

    #[test]
    fn sample_config_parses() {
        let config: RagevalConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.measures, vec!["EM", "F1"]);
        assert_eq!(config.columns.query_id, "qid");
    }
}
