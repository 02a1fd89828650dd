//! Exact Match and token-overlap F1.
//!
//! Both functions compare normalized answers (see [`crate::normalize`]) and
//! are total over every pair of strings, including empty ones.

use std::collections::HashMap;

use serde::Serialize;

use crate::normalize::{answer_tokens, normalize_answer};

/// 1.0 if the prediction matches any gold answer after normalization, else 0.0.
pub fn exact_match<S: AsRef<str>>(prediction: &str, gold_answers: &[S]) -> f64 {
    let prediction = normalize_answer(prediction);
    let matched = gold_answers
        .iter()
        .any(|gold| normalize_answer(gold.as_ref()) == prediction);
    if matched {
        1.0
    } else {
        0.0
    }
}

/// Token-overlap F1 between a prediction and a single gold answer.
pub fn f1_score(prediction: &str, gold_answer: &str) -> f64 {
    token_overlap(prediction, gold_answer).f1
}

/// Precision, recall and F1 of the token overlap between two answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenOverlap {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl TokenOverlap {
    const ZERO: TokenOverlap = TokenOverlap {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
    };

    const PERFECT: TokenOverlap = TokenOverlap {
        precision: 1.0,
        recall: 1.0,
        f1: 1.0,
    };
}

/// Compute the token-bag overlap of `prediction` against `gold_answer`.
///
/// Tokens are counted with multiplicity. Precision is relative to the
/// prediction and recall to the gold answer, so swapping the arguments swaps
/// the two. Two empty answers score 1.0; one empty answer scores 0.0.
pub fn token_overlap(prediction: &str, gold_answer: &str) -> TokenOverlap {
    let pred_tokens = answer_tokens(prediction);
    let gold_tokens = answer_tokens(gold_answer);

    match (pred_tokens.is_empty(), gold_tokens.is_empty()) {
        (true, true) => return TokenOverlap::PERFECT,
        (true, false) | (false, true) => return TokenOverlap::ZERO,
        (false, false) => {}
    }

    let mut gold_counts: HashMap<&str, usize> = HashMap::new();
    for token in &gold_tokens {
        *gold_counts.entry(token.as_str()).or_insert(0) += 1;
    }

    let mut num_same = 0usize;
    for token in &pred_tokens {
        if let Some(count) = gold_counts.get_mut(token.as_str()) {
            if *count > 0 {
                *count -= 1;
                num_same += 1;
            }
        }
    }

    if num_same == 0 {
        return TokenOverlap::ZERO;
    }

    let precision = num_same as f64 / pred_tokens.len() as f64;
    let recall = num_same as f64 / gold_tokens.len() as f64;
    TokenOverlap {
        precision,
        recall,
        f1: 2.0 * precision * recall / (precision + recall),
    }
}
