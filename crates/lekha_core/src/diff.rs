//! Word-level diff primitives.
//!
//! Three delimiter-parameterized functions, all pure:
//!
//! - [`edit_magnitude`] - the cheap, asymmetric "how many words changed"
//!   heuristic used for the live delta shown to the user;
//! - [`symmetric_word_difference`] - set-based added-plus-removed count used
//!   to size edit-history records;
//! - [`word_edit_distance`] - true token-level Levenshtein distance, used
//!   when re-deriving a whole column's edited-word total from scratch.
//!
//! The first two deliberately coexist: the magnitude heuristic feeds the
//! cumulative statistics persisted in the word-count sidecar, so its exact
//! behavior is kept for compatibility with previously saved totals rather
//! than being upgraded to a symmetric algorithm.
//!
//! All three skip empty tokens produced by adjacent delimiters and return 0
//! for an empty delimiter.

/// Split `text` on `delimiter`, skipping empty tokens.
fn tokenize<'a>(text: &'a str, delimiter: &str) -> Vec<&'a str> {
    text.split(delimiter).filter(|t| !t.is_empty()).collect()
}

/// Heuristic count of words changed between `new_text` and `original`.
///
/// If the token counts differ, the magnitude is the count difference plus
/// the number of tokens in the shorter list that do not appear anywhere in
/// the longer list. With equal counts it is the number of new tokens absent
/// from the original. Order-insensitive and duplicate-insensitive; not a
/// true edit distance.
pub fn edit_magnitude(new_text: &str, original: &str, delimiter: &str) -> usize {
    if delimiter.is_empty() {
        return 0;
    }

    let new_words = tokenize(new_text, delimiter);
    let original_words = tokenize(original, delimiter);

    if new_words.len() > original_words.len() {
        (new_words.len() - original_words.len())
            + original_words
                .iter()
                .filter(|w| !new_words.contains(w))
                .count()
    } else if new_words.len() < original_words.len() {
        (original_words.len() - new_words.len())
            + new_words
                .iter()
                .filter(|w| !original_words.contains(w))
                .count()
    } else {
        new_words
            .iter()
            .filter(|w| !original_words.contains(w))
            .count()
    }
}

/// Count of distinct tokens added plus distinct tokens removed between the
/// two strings. Symmetric and order-independent.
pub fn symmetric_word_difference(a: &str, b: &str, delimiter: &str) -> usize {
    if delimiter.is_empty() {
        return 0;
    }

    let a_set: std::collections::HashSet<&str> = tokenize(a, delimiter).into_iter().collect();
    let b_set: std::collections::HashSet<&str> = tokenize(b, delimiter).into_iter().collect();

    a_set.difference(&b_set).count() + b_set.difference(&a_set).count()
}

/// Token-level Levenshtein distance between `current` and `original`.
///
/// Dynamic programming over token sequences with two rolling rows, so space
/// is bounded by the current token count rather than the full matrix.
pub fn word_edit_distance(current: &str, original: &str, delimiter: &str) -> usize {
    if delimiter.is_empty() {
        return 0;
    }

    let current_words = tokenize(current, delimiter);
    let original_words = tokenize(original, delimiter);

    let mut prev_row: Vec<usize> = (0..=current_words.len()).collect();
    let mut curr_row = vec![0usize; current_words.len() + 1];

    for i in 1..=original_words.len() {
        curr_row[0] = i;

        for j in 1..=current_words.len() {
            if original_words[i - 1] == current_words[j - 1] {
                curr_row[j] = prev_row[j - 1];
            } else {
                let deletion = prev_row[j];
                let insertion = curr_row[j - 1];
                let substitution = prev_row[j - 1];
                curr_row[j] = 1 + deletion.min(insertion).min(substitution);
            }
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[current_words.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_added_word() {
        // "brown" added into the middle
        assert_eq!(edit_magnitude("the quick brown fox", "the quick fox", " "), 1);
    }

    #[test]
    fn test_magnitude_removed_word() {
        assert_eq!(edit_magnitude("a b", "a b c", " "), 1);
    }

    #[test]
    fn test_magnitude_equal_counts() {
        assert_eq!(edit_magnitude("a x c", "a b c", " "), 1);
        assert_eq!(edit_magnitude("a b c", "a b c", " "), 0);
        // Order-insensitive: reordering alone is not counted
        assert_eq!(edit_magnitude("c b a", "a b c", " "), 0);
    }

    #[test]
    fn test_magnitude_is_asymmetric() {
        // Duplicates make the heuristic asymmetric against the set diff:
        // one extra "a" counts as one added word.
        assert_eq!(edit_magnitude("a a", "a", " "), 1);
        assert_eq!(symmetric_word_difference("a a", "a", " "), 0);
    }

    #[test]
    fn test_magnitude_empty_baseline() {
        assert_eq!(edit_magnitude("x y z", "", " "), 3);
    }

    #[test]
    fn test_magnitude_empty_delimiter() {
        assert_eq!(edit_magnitude("a b", "a", ""), 0);
        assert_eq!(symmetric_word_difference("a b", "a", ""), 0);
        assert_eq!(word_edit_distance("a b", "a", ""), 0);
    }

    #[test]
    fn test_magnitude_semicolon_tags() {
        assert_eq!(edit_magnitude("noise;music", "noise", ";"), 1);
        // Adjacent delimiters produce no empty tokens
        assert_eq!(edit_magnitude(";;noise;;", "noise", ";"), 0);
    }

    #[test]
    fn test_symmetric_difference_is_symmetric() {
        let pairs = [
            ("the quick brown fox", "the quick fox", " "),
            ("a b c", "a b", " "),
            ("x;y;z", "y;w", ";"),
            ("", "a b", " "),
        ];
        for (a, b, d) in pairs {
            assert_eq!(
                symmetric_word_difference(a, b, d),
                symmetric_word_difference(b, a, d),
                "difference of ({a:?}, {b:?}) not symmetric"
            );
        }
    }

    #[test]
    fn test_symmetric_difference_values() {
        assert_eq!(
            symmetric_word_difference("the quick brown fox", "the quick fox", " "),
            1
        );
        assert_eq!(symmetric_word_difference("a b", "a b c", " "), 1);
        assert_eq!(symmetric_word_difference("a b c", "x y", " "), 5);
        assert_eq!(symmetric_word_difference("same", "same", " "), 0);
    }

    #[test]
    fn test_edit_distance_basics() {
        assert_eq!(word_edit_distance("a b c", "a b c", " "), 0);
        assert_eq!(word_edit_distance("the quick brown fox", "the quick fox", " "), 1);
        assert_eq!(word_edit_distance("a b", "a b c", " "), 1);
        // substitution
        assert_eq!(word_edit_distance("a x c", "a b c", " "), 1);
        // everything replaced
        assert_eq!(word_edit_distance("p q", "a b c", " "), 3);
        assert_eq!(word_edit_distance("", "a b c", " "), 3);
        assert_eq!(word_edit_distance("a b c", "", " "), 3);
    }

    #[test]
    fn test_edit_distance_order_sensitive() {
        // Unlike the heuristic, Levenshtein counts reordering
        assert_eq!(word_edit_distance("b a", "a b", " "), 2);
        assert_eq!(edit_magnitude("b a", "a b", " "), 0);
    }
}
