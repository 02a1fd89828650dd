//! Answer text normalization.
//!
//! Uses the conventional SQuAD answer normalization, applied in order:
//!
//! 1. lower-case the text;
//! 2. delete ASCII punctuation (`"U.S."` becomes `"us"`);
//! 3. drop the English articles `a`, `an` and `the` wherever they stand as
//!    whole words;
//! 4. collapse whitespace runs to a single space and trim.

const ARTICLES: [&str; 3] = ["a", "an", "the"];

/// Canonicalize an answer so that incidental formatting does not affect
/// comparison.
pub fn normalize_answer(text: &str) -> String {
    let lowered = text.to_lowercase();
    let without_punctuation: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    without_punctuation
        .split_whitespace()
        .filter(|token| !ARTICLES.iter().any(|article| article == token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace tokens of the normalized answer.
pub fn answer_tokens(text: &str) -> Vec<String> {
    normalize_answer(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize_answer("Glasgow, Scotland!"), "glasgow scotland");
        assert_eq!(normalize_answer("U.S.A."), "usa");
    }

    #[test]
    fn removes_articles_as_whole_words_only() {
        assert_eq!(normalize_answer("The University of Glasgow"), "university of glasgow");
        assert_eq!(normalize_answer("an apple a day"), "apple day");
        assert_eq!(normalize_answer("theatre"), "theatre");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize_answer("  many \t spaces\n here "), "many spaces here");
    }

    #[test]
    fn empty_and_article_only_inputs_normalize_to_empty() {
        assert_eq!(normalize_answer(""), "");
        assert_eq!(normalize_answer("The."), "");
        assert!(answer_tokens("  a an the ").is_empty());
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(normalize_answer("Zürich, Schweiz"), "zürich schweiz");
    }

    #[test]
    fn tokens_split_normalized_text() {
        assert_eq!(answer_tokens("The cat, the hat."), vec!["cat", "hat"]);
    }
}
