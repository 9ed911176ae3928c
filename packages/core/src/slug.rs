// ABOUTME: Slug generation for solution identities
// ABOUTME: Produces URL-safe unique strings from human-readable names

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[-\s]+").unwrap();
}

/// Generate a URL-friendly slug from a solution name.
///
/// Lowercases the name, drops anything that is not a word character,
/// whitespace or hyphen, then collapses separator runs to single hyphens.
pub fn generate_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = SEPARATORS.replace_all(&stripped, "-");
    hyphenated.trim_matches('-').to_string()
}
