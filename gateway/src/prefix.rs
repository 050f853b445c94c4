//! Path prefix matching between asset URLs and gateway frontend prefixes.

/// Splits a `/`-delimited path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Whether a registered frontend prefix covers the given asset path segments.
///
/// A prefix matches when all of its segments equal the leading segments of the
/// asset path. A prefix longer than the asset path never matches.
pub fn prefix_matches(frontend_prefix: &str, asset_segments: &[&str]) -> bool {
    let front = split_path(frontend_prefix);
    front.len() <= asset_segments.len() && front[..] == asset_segments[..front.len()]
}
