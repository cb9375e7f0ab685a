//! "Did you mean" suggestions for mistyped command names.

/// Levenshtein edit distance between two strings, counted in chars.
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
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Candidates similar to `query`, in input order.
///
/// A candidate is similar when its edit distance to the query is at most a
/// third of the query length (rounded down), or when it contains the query.
/// Comparison is case-insensitive.
pub fn find_alternatives<S: AsRef<str>>(query: &str, candidates: &[S]) -> Vec<String> {
    let query = query.to_lowercase();
    let threshold = query.chars().count() / 3;

    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|candidate| {
            let candidate = candidate.to_lowercase();
            levenshtein(&candidate, &query) <= threshold || candidate.contains(&query)
        })
        .map(str::to_string)
        .collect()
}

/// Format the "not an available command" line, with suggestions if any.
pub fn not_available_message<S: AsRef<str>>(token: &str, candidates: &[S]) -> String {
    let alternatives = find_alternatives(token, candidates);
    if alternatives.is_empty() {
        format!("\"{}\" is not an available command.", token)
    } else {
        let list = alternatives
            .iter()
            .map(|a| format!("    - {}", a))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\"{}\" is not an available command. Did you mean:\n{}", token, list)
    }
}
