//! Subsequence scoring used by interactive pickers to filter candidate labels.

/// Score how well `query` matches `candidate`.
///
/// Every whitespace-separated token of `query` must appear, in order and
/// case-insensitively, as a subsequence of `candidate`. Returns `None` when a
/// token cannot be matched. Consecutive runs, matches on a word boundary
/// (start of text or after punctuation/whitespace, e.g. after `/` in
/// `cargo/build`) and prefix matches score higher; long candidates are
/// penalised slightly.
///
/// ```rust
/// use quay_util::fuzzy_score;
///
/// assert!(fuzzy_score("cargo/build", "cb").is_some());
/// assert!(fuzzy_score("cargo/build", "bc").is_none());
/// assert_eq!(fuzzy_score("make/test", ""), Some(0));
/// ```
pub fn fuzzy_score(candidate: &str, query: &str) -> Option<i64> {
    let tokens: Vec<Vec<char>> = query
        .split_whitespace()
        .map(|token| token.chars().flat_map(char::to_lowercase).collect())
        .collect();
    if tokens.is_empty() {
        return Some(0);
    }

    let haystack: Vec<char> = candidate.chars().flat_map(char::to_lowercase).collect();
    let mut cursor = 0;
    let mut total = 0;
    for token in &tokens {
        total += score_token(&haystack, token, &mut cursor)?;
    }
    Some(total - haystack.len() as i64 / 8)
}

fn score_token(haystack: &[char], token: &[char], cursor: &mut usize) -> Option<i64> {
    let mut score = 0;
    let mut run = 0;
    let mut first = None;
    let mut previous: Option<usize> = None;

    for needle in token {
        let offset = haystack.get(*cursor..)?.iter().position(|character| character == needle)?;
        let index = *cursor + offset;
        first.get_or_insert(index);

        match previous {
            Some(last) if index == last + 1 => run += 1,
            Some(last) => {
                run = 1;
                score -= (index - last - 1) as i64 / 2;
            }
            None => run = 1,
        }
        score += 6 * run;
        if is_boundary(haystack, index) {
            score += 10;
        }

        previous = Some(index);
        *cursor = index + 1;
    }

    if haystack.starts_with(token) {
        score += 30;
    }
    if let Some(start) = first {
        score += (20 - start as i64).max(0);
    }
    Some(score)
}

fn is_boundary(haystack: &[char], index: usize) -> bool {
    index == 0
        || haystack
            .get(index - 1)
            .is_some_and(|character| character.is_whitespace() || character.is_ascii_punctuation())
}

/// Return indices of `labels` matching `query`, best first.
///
/// Ties keep the original order so provider grouping survives filtering.
pub fn rank_labels<S: AsRef<str>>(labels: &[S], query: &str) -> Vec<usize> {
    let mut scored: Vec<(usize, i64)> = labels
        .iter()
        .enumerate()
        .filter_map(|(index, label)| fuzzy_score(label.as_ref(), query).map(|score| (index, score)))
        .collect();
    if query.trim().is_empty() {
        return scored.into_iter().map(|(index, _)| index).collect();
    }
    scored.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
    scored.into_iter().map(|(index, _)| index).collect()
}
