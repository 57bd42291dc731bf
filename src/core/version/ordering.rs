use std::cmp::Ordering;

/// Numeric sort key: `1.20.1-47.2.0` → `[1, 20, 1, 47, 2, 0]`.
/// Non-numeric parts count as zero.
pub fn version_sort_key(version: &str) -> Vec<u64> {
    version
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

/// Newest first; equal keys fall back to reverse lexical order.
pub fn compare_newest_first(a: &str, b: &str) -> Ordering {
    version_sort_key(b)
        .cmp(&version_sort_key(a))
        .then_with(|| b.cmp(a))
}

pub fn sort_newest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_newest_first(a, b));
}

/// `major.minor` prefix of a release id (`1.16.5` → `1.16`).
pub fn minor_line(version: &str) -> Option<String> {
    let mut parts = version.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    let minor: String = minor.chars().take_while(|c| c.is_ascii_digit()).collect();
    if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) || minor.is_empty() {
        return None;
    }
    Some(format!("{major}.{minor}"))
}
