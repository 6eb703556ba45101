/// At most this many alternatives are offered.
pub const MAX_SUGGESTIONS: usize = 3;

/// Classic Levenshtein distance over chars, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Candidates within `max(3, len(input) / 2)` edits of `input`, closest first.
pub fn closest<'a, I>(input: &str, candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let threshold = (input.chars().count() / 2).max(3);
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|c| (levenshtein(input, c), c))
        .filter(|(d, _)| *d <= threshold)
        .collect();
    scored.sort();
    scored.dedup();
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, c)| c)
        .collect()
}

/// `"#a, #b"` style suggestion text, or `None` when nothing is close enough.
pub fn suggestion<'a, I>(input: &str, candidates: I, sigil: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let found = closest(input, candidates);
    if found.is_empty() {
        return None;
    }
    Some(
        found
            .iter()
            .map(|c| format!("{}{}", sigil, c))
            .collect::<Vec<_>>()
            .join(", "),
    )
}
