//! Utility functions for procedural macros

/// Normalize a column name or alias the same way headers are normalized at runtime:
/// lower-case ASCII alphanumerics only.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Build the de-duplicated, normalized alias list for a variant.
///
/// The canonical column always comes first so header matching prefers it.
pub fn alias_list(column: &str, aliases: &[String]) -> Vec<String> {
    let mut out = vec![normalize(column)];
    for alias in aliases {
        let alias = normalize(alias);
        if !alias.is_empty() && !out.contains(&alias) {
            out.push(alias);
        }
    }
    out
}
