//! Text layout for flattened text annotations
//!
//! Flattened text uses the built-in Helvetica font with the same width
//! estimate the overlay used to size the box, so line breaks match what
//! was shown on screen.

use overlay_core::text::approx_text_width;

/// Escape special characters for PDF string literals
pub fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            '\n' => "\\n".to_string(),
            '\r' => "\\r".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Greedy word wrap against a maximum line width. A single word wider than
/// the limit gets its own line rather than being split mid-word.
pub fn wrap_text(text: &str, font_size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if approx_text_width(&candidate, font_size) <= max_width || line.is_empty() {
            line = candidate;
        } else {
            lines.push(line);
            line = word.to_string();
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_escapes_pdf_delimiters() {
        assert_eq!(escape_pdf_string("a(b)c\\d"), "a\\(b\\)c\\\\d");
    }

    #[test]
    fn test_short_text_stays_on_one_line() {
        let lines = wrap_text("Jane Doe", 16.0, 500.0);
        assert_eq!(lines, vec!["Jane Doe".to_string()]);
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        let lines = wrap_text("please sign on the dotted line", 16.0, 120.0);
        assert!(lines.len() > 1, "lines: {:?}", lines);
        for line in &lines {
            assert!(approx_text_width(line, 16.0) <= 120.0, "line too wide: {}", line);
        }
        assert_eq!(
            lines.join(" "),
            "please sign on the dotted line"
        );
    }

    #[test]
    fn test_oversized_word_gets_its_own_line() {
        let lines = wrap_text("a Antidisestablishmentarianism b", 16.0, 60.0);
        assert_eq!(
            lines,
            vec![
                "a".to_string(),
                "Antidisestablishmentarianism".to_string(),
                "b".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_text_produces_no_lines() {
        assert!(wrap_text("   ", 16.0, 100.0).is_empty());
    }
}
