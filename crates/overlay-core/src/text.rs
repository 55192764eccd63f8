//! Approximate text metrics for the default overlay font
//!
//! Both the editor (default box sizing) and the flattening side (line
//! wrapping) need the same width estimate, or a box sized on screen wraps
//! differently when baked. The estimate buckets Helvetica glyphs into a few
//! width classes; exact shaping is out of scope.

const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Approximate advance width of one character, in multiples of the font size
pub fn approx_char_width(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' => 0.35,
        'm' | 'w' | 'M' | 'W' | '@' => 0.85,
        ' ' => 0.28,
        c if c.is_ascii_uppercase() => 0.67,
        c if c.is_ascii_digit() => 0.56,
        _ => 0.52,
    }
}

/// Approximate rendered width of a string at the given font size
pub fn approx_text_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(approx_char_width).sum::<f64>() * font_size
}

/// Approximate single-line bounding box (width, height) for a string
pub fn approx_text_extent(text: &str, font_size: f64) -> (f64, f64) {
    let width = approx_text_width(text, font_size).max(font_size);
    (width, font_size * LINE_HEIGHT_FACTOR)
}
