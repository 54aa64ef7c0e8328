//! Text transforms for cluster digests and model labels.
//!
//! A cluster digest is the deduplicated, numbered list of member texts that
//! gets submitted to the chat model. Token-budget truncation happens in the
//! engine, which owns the model's encoder; everything here is pure string work.

use std::collections::{HashMap, HashSet};

/// Default repetition threshold for [`too_many_duplicates`].
pub const DUPLICATE_THRESHOLD: usize = 10;

/// Maximum number of words kept in a cleaned label.
pub const LABEL_WORD_CAP: usize = 5;

/// Whether a single text item is dominated by one repeated word.
///
/// Splits on whitespace and reports true iff any distinct word occurs more
/// than `threshold` times. Used to keep near-spam items (repeated boilerplate)
/// out of a cluster digest. Empty input is never flagged.
pub fn too_many_duplicates(line: &str, threshold: usize) -> bool {
    if line.is_empty() {
        return false;
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in line.split_whitespace() {
        let count = counts.entry(word).or_insert(0);
        *count += 1;
        if *count > threshold {
            return true;
        }
    }
    false
}

/// Build the numbered-list digest for a cluster's member texts.
///
/// Exact duplicates are dropped (first occurrence wins), over-duplicated
/// items are excluded, and the survivors are rendered one per line as
/// `"{n}. {text}"` with 1-based numbering.
pub fn build_digest<'a>(texts: impl IntoIterator<Item = &'a str>, threshold: usize) -> String {
    let mut seen = HashSet::new();
    let mut lines: Vec<String> = Vec::new();
    for text in texts {
        if !seen.insert(text) {
            continue;
        }
        if too_many_duplicates(text, threshold) {
            continue;
        }
        lines.push(format!("{}. {}", lines.len() + 1, text));
    }
    lines.join("\n")
}

/// Clean a raw model reply into a label.
///
/// Models don't always follow instructions: replies come back with newlines,
/// quotes, or a full sentence. Newlines become spaces, double and single
/// quotes are stripped, runs of whitespace collapse to one space, and only
/// the first [`LABEL_WORD_CAP`] words are kept.
pub fn clean_label(raw: &str) -> String {
    let unquoted: String = raw
        .replace('\n', " ")
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();
    unquoted
        .split_whitespace()
        .take(LABEL_WORD_CAP)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_is_never_flagged() {
        assert!(!too_many_duplicates("", 10));
    }

    #[test]
    fn threshold_is_exclusive() {
        // "x" exactly 10 times: not over the threshold.
        let at_threshold = ["x"; 10].join(" ");
        assert!(!too_many_duplicates(&at_threshold, 10));

        // 11 occurrences crosses it, regardless of other words.
        let over = format!("{} y", ["x"; 11].join(" "));
        assert!(too_many_duplicates(&over, 10));
    }

    #[test]
    fn distinct_words_do_not_accumulate() {
        let line = "a b c d e f g h i j k l m n o p";
        assert!(!too_many_duplicates(line, 10));
    }

    #[test]
    fn digest_dedupes_and_numbers() {
        let digest = build_digest(["a b c", "a b c", "d e"], 10);
        assert_eq!(digest, "1. a b c\n2. d e");
    }

    #[test]
    fn digest_excludes_over_duplicated_items() {
        let spam = ["x"; 11].join(" ");
        let items = [spam.as_str(), "normal item"];
        let digest = build_digest(items, 10);
        assert_eq!(digest, "1. normal item");
    }

    #[test]
    fn digest_of_nothing_is_empty() {
        assert_eq!(build_digest([], 10), "");
    }

    #[test]
    fn clean_label_strips_newlines_and_quotes() {
        let cleaned = clean_label("\"Sports\ncars\"");
        assert_eq!(cleaned, "Sports cars");
        assert!(!cleaned.contains('\n'));
        assert!(!cleaned.contains('"'));
        assert!(!cleaned.contains('\''));
    }

    #[test]
    fn clean_label_collapses_whitespace() {
        assert_eq!(clean_label("  too   many\t spaces "), "too many spaces");
    }

    #[test]
    fn clean_label_caps_at_five_words() {
        let cleaned = clean_label("one two three four five six seven");
        assert_eq!(cleaned, "one two three four five");
        assert_eq!(cleaned.split_whitespace().count(), LABEL_WORD_CAP);
    }

    #[test]
    fn clean_label_of_apostrophes() {
        assert_eq!(clean_label("Driver's licence renewals"), "Drivers licence renewals");
    }
}
