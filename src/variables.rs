//! Extraction of `{{variable}}` references from free text.
//!
//! Text nodes grow an extra input port for every distinct variable
//! referenced in their content; this module is the pure scanning half of
//! that feature.

use regex::Regex;
use std::sync::OnceLock;

/// A reference is two braces, an identifier (letter, `_` or `$` first,
/// then letters/digits/`_`/`$`), two closing braces. Anything else is
/// plain text.
fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{([a-zA-Z_$][a-zA-Z0-9_$]*)\}\}").expect("placeholder pattern is valid")
    })
}

/// Returns the distinct variable names referenced in `text`, in order of
/// first occurrence. Malformed references (empty name, leading digit,
/// whitespace inside the braces) never match and contribute nothing.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in placeholder_pattern().captures_iter(text) {
        let name = &captures[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_order_without_duplicates() {
        assert_eq!(extract_variables("{{a}} {{b}} {{a}}"), vec!["a", "b"]);
        assert_eq!(
            extract_variables("{{zeta}} then {{alpha}}"),
            vec!["zeta", "alpha"]
        );
    }

    #[test]
    fn malformed_references_are_ignored() {
        assert!(extract_variables("{{123}} {{bad name}} {{}}").is_empty());
        assert!(extract_variables("{ {a} } {{a} {a}}").is_empty());
        assert!(extract_variables("plain text, no references").is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_variables("").is_empty());
    }

    #[test]
    fn identifier_charset() {
        assert_eq!(
            extract_variables("{{_x}} {{$y}} {{a1_b$2}}"),
            vec!["_x", "$y", "a1_b$2"]
        );
        // Leading digit is rejected, digits after the first char are fine.
        assert!(extract_variables("{{9lives}}").is_empty());
    }

    #[test]
    fn references_inside_larger_text() {
        assert_eq!(
            extract_variables("Hello {{name}}, welcome to {{place}}!"),
            vec!["name", "place"]
        );
    }
}
