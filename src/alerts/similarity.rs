//! String similarity used for "did you mean" suggestions.

/// Minimum similarity a candidate must exceed to be suggested.
pub const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Case-sensitive similarity in `[0.0, 1.0]`.
///
/// Takes the better of the normalised edit-distance ratio on the raw strings
/// and on their whitespace tokens sorted, so "Ramon San" still matches
/// "San Ramon".
pub fn similarity(a: &str, b: &str) -> f64 {
    let direct = levenshtein_ratio(a, b);
    let sorted = levenshtein_ratio(&sorted_tokens(a), &sorted_tokens(b));
    direct.max(sorted)
}

/// Best candidate above [`SUGGESTION_THRESHOLD`].
///
/// Ties resolve to the earliest candidate.
pub fn best_match<'a, I>(needle: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;

    for candidate in candidates {
        let score = similarity(needle, candidate);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    best.filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .map(|(candidate, _)| candidate)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    // Single-row dynamic programming table
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }

    row[b.len()]
}
