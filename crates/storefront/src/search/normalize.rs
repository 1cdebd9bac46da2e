//! Text folding for search and title sorting.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lowercase and strip accents: `"Perché È"` -> `"perche e"`.
///
/// Decomposes to NFD and drops combining marks, so precomposed and
/// decomposed input fold to the same string.
#[must_use]
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
