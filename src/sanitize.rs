//! Free-text cleanup applied to user supplied string fields before they are stored.

use crate::error::AppError;

const ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#039;"];

/// Strips markup, trims surrounding whitespace and HTML-escapes the remainder.
///
/// Existing entities are left alone, so `sanitize(sanitize(s)) == sanitize(s)`.
pub fn sanitize(input: &str) -> String {
    let stripped = strip_tags(input);
    escape_html(stripped.trim())
}

pub fn sanitize_opt(input: Option<&str>) -> Option<String> {
    input.map(sanitize)
}

/// Sanitizes a value bound for a `VARCHAR(max)` column.
///
/// The limit applies to the escaped text, which is what gets stored.
pub fn sanitize_bounded(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let clean = sanitize(value);
    if clean.chars().count() > max {
        return Err(AppError::Validation(format!(
            "Field '{}' must be at most {} characters",
            field, max
        )));
    }
    Ok(clean)
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, c) in input.char_indices() {
        match c {
            '&' if ENTITIES.iter().any(|e| input[i..].starts_with(e)) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_trims() {
        assert_eq!(sanitize("  <b>Pérez, Juan</b>  "), "Pérez, Juan");
        assert_eq!(sanitize("<script>alert(1)</script>Calle 1"), "alert(1)Calle 1");
    }

    #[test]
    fn test_escapes_special_characters() {
        assert_eq!(sanitize("Gómez & Hijos \"SA\""), "Gómez &amp; Hijos &quot;SA&quot;");
        assert_eq!(sanitize("O'Brien"), "O&#039;Brien");
        assert_eq!(sanitize("a > b"), "a &gt; b");
    }

    #[test]
    fn test_unclosed_tag_drops_rest() {
        assert_eq!(sanitize("Expte 12 <b"), "Expte 12");
    }

    #[test]
    fn test_bounded_checks_escaped_length() {
        let raw = format!("{}&", "A".repeat(99));
        assert_eq!(raw.len(), 100);

        let err = sanitize_bounded("n_expediente", &raw, 100).unwrap_err();
        assert!(
            matches!(&err, AppError::Validation(msg) if msg == "Field 'n_expediente' must be at most 100 characters"),
            "{err:?}"
        );

        assert_eq!(sanitize_bounded("zona", "Centro", 50).unwrap(), "Centro");
        assert_eq!(sanitize_bounded("zona", &"ñ".repeat(50), 50).unwrap().chars().count(), 50);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "  <i>Banco &amp; Cía</i> ",
            "Tom & Jerry",
            "x < y > z",
            "\"quoted\" 'single'",
            " <p> padded </p> ",
            "&lt;already&gt;",
            "",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input:?}");
        }
    }
}
