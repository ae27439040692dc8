//! ISBN-like identifier normalization.
//!
//! User input such as `"ISBN 978-0-13-468599-1"` is reduced to the characters
//! bibliographic sources accept: ASCII digits and the check character `X`.
//! No length or checksum validation is performed.

use std::fmt;

/// A canonical identifier containing only ASCII digits and `X`/`x`.
///
/// Case of `X` is preserved from the input; use [`CanonicalIsbn::to_uppercase`]
/// for sources that require the upper-case form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CanonicalIsbn(String);

impl CanonicalIsbn {
    /// Returns the normalized identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when normalization left nothing to search for.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the identifier with `x` upper-cased.
    #[must_use]
    pub fn to_uppercase(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

impl fmt::Display for CanonicalIsbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalIsbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strips every character except ASCII digits and `X`/`x`.
///
/// Empty input, or input with no usable characters, yields an empty identifier.
///
/// # Examples
///
/// ```
/// use bookshelf_core::normalize_isbn;
///
/// assert_eq!(normalize_isbn("978-0-13-468599-1").as_str(), "9780134685991");
/// assert_eq!(normalize_isbn("0-8044-2957-x").as_str(), "080442957x");
/// assert!(normalize_isbn("n/a").is_empty());
/// ```
#[must_use]
pub fn normalize_isbn(input: &str) -> CanonicalIsbn {
    CanonicalIsbn(
        input
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, 'X' | 'x'))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_strips_hyphens_and_spaces() {
        assert_eq!(normalize_isbn("978-0-13-468599-1").as_str(), "9780134685991");
        assert_eq!(normalize_isbn(" 978 0 13 468599 1 ").as_str(), "9780134685991");
    }

    #[test]
    fn test_normalize_strips_isbn_prefix_text() {
        assert_eq!(normalize_isbn("ISBN: 0-306-40615-2").as_str(), "0306406152");
    }

    #[test]
    fn test_normalize_preserves_check_character_case() {
        assert_eq!(normalize_isbn("0-8044-2957-X").as_str(), "080442957X");
        assert_eq!(normalize_isbn("0-8044-2957-x").as_str(), "080442957x");
    }

    #[test]
    fn test_to_uppercase_upper_cases_check_character() {
        assert_eq!(normalize_isbn("080442957x").to_uppercase(), "080442957X");
    }

    #[test]
    fn test_normalize_empty_input_is_empty() {
        assert!(normalize_isbn("").is_empty());
        assert!(normalize_isbn("---").is_empty());
        assert!(normalize_isbn("abc def").is_empty());
    }

    #[test]
    fn test_normalize_drops_non_ascii_digits() {
        // Arabic-Indic and full-width digits are not ASCII digits.
        assert_eq!(normalize_isbn("٣٤5６7").as_str(), "57");
    }

    #[test]
    fn test_normalize_output_charset_and_idempotence() {
        let samples = [
            "",
            "978-0-13-468599-1",
            "isbn 0-8044-2957-X",
            "xX9 !@#$%^&*()_+ ünïcödé ９",
            "\t\n0306406152\r",
            "XXXXXXXX",
            "The ISBN is 123-x",
        ];
        for sample in samples {
            let once = normalize_isbn(sample);
            assert!(
                once.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == 'X' || c == 'x'),
                "unexpected character in {once:?} from {sample:?}"
            );
            let twice = normalize_isbn(once.as_str());
            assert_eq!(once, twice, "normalization must be idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_display_matches_as_str() {
        let isbn = normalize_isbn("978-1-4028-9462-6");
        assert_eq!(isbn.to_string(), isbn.as_str());
    }

    proptest! {
        #[test]
        fn normalize_keeps_only_identifier_chars_and_is_idempotent(input in any::<String>()) {
            let once = normalize_isbn(&input);
            prop_assert!(
                once.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == 'X' || c == 'x')
            );
            let expected: String = input
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, 'X' | 'x'))
                .collect();
            prop_assert_eq!(once.as_str(), expected.as_str());
            prop_assert_eq!(normalize_isbn(once.as_str()), once);
        }

        #[test]
        fn normalize_keeps_isbn_chars_amid_separators(
            input in "[0-9Xx -]{0,40}"
        ) {
            let once = normalize_isbn(&input);
            prop_assert_eq!(once.as_str(), input.replace([' ', '-'], ""));
        }
    }
}
