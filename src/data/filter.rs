// ---------------------------------------------------------------------------
// Spectral class grouping for the type browser
// ---------------------------------------------------------------------------

/// Leading alphabetic part of a spectral-type label: "L2" → "L",
/// "T4.5" → "T", "sdM7" → "sdM".  Labels without a subtype are their own
/// class.
pub fn spectral_class(label: &str) -> &str {
    let end = label
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(label.len());
    if end == 0 { label } else { &label[..end] }
}

/// Group labels by [`spectral_class`].  Classes appear in first-seen order
/// and labels keep their input order within a class.
pub fn group_by_class(types: &[String]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for ty in types {
        let class = spectral_class(ty);
        match groups.iter_mut().find(|(c, _)| c == class) {
            Some((_, members)) => members.push(ty.clone()),
            None => groups.push((class.to_string(), vec![ty.clone()])),
        }
    }
    groups
}

/// Indices of `types` whose label contains `query` (case-insensitive).  An
/// empty query keeps everything.
pub fn matching_types(types: &[String], query: &str) -> Vec<usize> {
    let needle = query.trim().to_ascii_lowercase();
    types
        .iter()
        .enumerate()
        .filter(|(_, ty)| needle.is_empty() || ty.to_ascii_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}
