use crate::env::SelectItem;

/// Indices of the items matching every whitespace separated term of `query`
pub fn filter_items(items: &[SelectItem], query: &str) -> Vec<usize> {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| {
            let key = item.filter_key();
            terms.iter().all(|term| contains_case_insensitive(&key, term))
        })
        .map(|(index, _)| index)
        .collect()
}

/// Case-insensitive contains check (optimized for ASCII, falls back to allocation for Unicode)
fn contains_case_insensitive(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    // Fast path: if both strings are ASCII, use byte-level comparison without allocation
    if haystack.is_ascii() && needle.is_ascii() {
        let needle_bytes = needle.as_bytes();
        haystack
            .as_bytes()
            .windows(needle_bytes.len())
            .any(|window| {
                window
                    .iter()
                    .zip(needle_bytes.iter())
                    .all(|(&b, &n)| b.to_ascii_lowercase() == n.to_ascii_lowercase())
            })
    } else {
        haystack.to_lowercase().contains(needle)
    }
}
