//! Nearest-name suggestions.

use ember_core::Symbol;

/// Pick the candidate closest to `name`, if any lies within `max_distance`
/// edits. Ties go to the earliest candidate.
pub fn nearest_name(
    name: Symbol,
    candidates: impl IntoIterator<Item = Symbol>,
    max_distance: usize,
) -> Option<Symbol> {
    let target = name.to_string();
    candidates
        .into_iter()
        .filter(|&candidate| candidate != name)
        .map(|candidate| {
            let distance = candidate.with_str(|text| levenshtein_distance(&target, text));
            (distance, candidate)
        })
        .filter(|(distance, _)| *distance <= max_distance)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

/// Classic edit distance over chars.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
