//! Title to slug derivation.
//!
//! The slug shown next to the title field is always recomputed from the
//! current title; nothing caches it between keystrokes.

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block, removed after canonical decomposition.
const DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036f}';

/// Map a free-text title to a normalized identifier.
///
/// Decomposes to NFD, drops diacritical marks, lowercases, removes every
/// character that is neither an ASCII word character (`[A-Za-z0-9_]`) nor a
/// separator, and collapses each run of separators into a single `-`.
/// Whitespace and `-` both count as separators, which makes the function
/// idempotent on its own output. Whitespace follows the ECMAScript `\s`
/// class: U+0085 is not a separator, U+FEFF is.
#[must_use]
pub fn derive_slug(title: &str) -> String {
    let lowered = title
        .nfd()
        .filter(|c| !DIACRITICS.contains(c))
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for c in lowered.chars() {
        if is_word_char(c) {
            if pending_separator {
                slug.push('-');
                pending_separator = false;
            }
            slug.push(c);
        } else if is_separator(c) {
            pending_separator = true;
        }
    }
    if pending_separator {
        slug.push('-');
    }
    slug
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

#[cfg(test)]
mod tests {
    use super::derive_slug;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Hello World"), "hello-world");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(derive_slug("Programação Funcional"), "programacao-funcional");
        assert_eq!(derive_slug("Crème Brûlée"), "creme-brulee");
    }

    #[test]
    fn drops_punctuation_without_splitting_words() {
        assert_eq!(derive_slug("C++ & Rust!"), "c-rust");
        assert_eq!(derive_slug("node.js"), "nodejs");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(derive_slug("a \t\n  b"), "a-b");
        assert_eq!(derive_slug("a - b"), "a-b");
    }

    #[test]
    fn next_line_control_is_dropped_not_split() {
        assert_eq!(derive_slug("a\u{85}b"), "ab");
        assert_eq!(derive_slug("a\u{feff}b"), "a-b");
        assert_eq!(derive_slug("a\u{a0}b\u{3000}c"), "a-b-c");
    }

    #[test]
    fn keeps_edge_separators() {
        assert_eq!(derive_slug("  padded  "), "-padded-");
    }

    #[test]
    fn keeps_underscores_and_digits() {
        assert_eq!(derive_slug("snake_case 2024"), "snake_case-2024");
    }

    #[test]
    fn non_latin_letters_are_removed() {
        assert_eq!(derive_slug("日本語 tags"), "-tags");
        assert_eq!(derive_slug("straße"), "strae");
    }

    #[test]
    fn empty_title_gives_empty_slug() {
        assert_eq!(derive_slug(""), "");
    }

    #[test]
    fn already_derived_input_is_unchanged() {
        for input in ["hello-world", "-padded-", "snake_case-2024", "a"] {
            assert_eq!(derive_slug(input), input);
        }
    }
}
