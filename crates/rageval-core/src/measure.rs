//! Supported measures and the registry that resolves measure names.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::EvalError;

/// A parameterless answer-quality measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    /// Exact match against any of the gold answers.
    ExactMatch,
    /// Token-overlap F1 against the first gold answer.
    F1,
}

impl Measure {
    /// Canonical measure name.
    pub fn name(&self) -> &'static str {
        match self {
            Measure::ExactMatch => "EM",
            Measure::F1 => "F1",
        }
    }

    pub fn pretty_name(&self) -> &'static str {
        match self {
            Measure::ExactMatch => "Exact Match",
            Measure::F1 => "F1 score",
        }
    }

    pub fn short_desc(&self) -> &'static str {
        match self {
            Measure::ExactMatch => "exact match of predicted answer and gold answers.",
            Measure::F1 => "f1 score of predicted answer and ground-truth answer.",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A registered measure and the names it answers to.
#[derive(Debug, Clone)]
pub struct MeasureEntry {
    pub measure: Measure,
    pub aliases: Vec<&'static str>,
}

impl MeasureEntry {
    fn matches(&self, name: &str) -> bool {
        self.measure.name() == name || self.aliases.iter().any(|alias| *alias == name)
    }
}

/// Fixed table of the measures an evaluator can compute.
///
/// Built once and passed by reference; there is no process-wide registration.
#[derive(Debug, Clone)]
pub struct MeasureRegistry {
    entries: Vec<MeasureEntry>,
}

impl MeasureRegistry {
    /// The registry with EM and F1.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                MeasureEntry {
                    measure: Measure::ExactMatch,
                    aliases: vec!["exact_match"],
                },
                MeasureEntry {
                    measure: Measure::F1,
                    aliases: vec!["f1"],
                },
            ],
        }
    }

    pub fn entries(&self) -> &[MeasureEntry] {
        &self.entries
    }

    /// Look up a measure by canonical name or alias.
    pub fn resolve(&self, name: &str) -> Result<Measure, EvalError> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|entry| entry.matches(name))
            .map(|entry| entry.measure)
            .ok_or_else(|| EvalError::UnsupportedMeasure {
                name: name.to_string(),
            })
    }

    /// Resolve every name, failing on the first unsupported one.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Measure>, EvalError> {
        names.iter().map(|n| self.resolve(n.as_ref())).collect()
    }
}

impl Default for MeasureRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
