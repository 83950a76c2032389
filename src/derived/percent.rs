// src/derived/percent.rs
//! Locale-formatted percentages (`+1,23%`, `(−0,45%)`) to `f64` and back.

/// Parse a scraped percentage. Accepts a decimal comma, Unicode minus,
/// surrounding parentheses, an explicit sign, spaces/NBSP and a `%` suffix.
/// A dot is read as a thousands separator only when a decimal comma is present.
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '%' | '+') && !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.contains(',') {
        cleaned = cleaned.replace('.', "").replace(',', ".");
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::warn!(raw, "could not parse percentage string");
            None
        }
    }
}

/// Parse an optional scraped value; `None` in, `None` out.
pub fn parse_optional(raw: Option<&str>) -> Option<f64> {
    raw.and_then(parse_percentage)
}

/// Explicit sign, two decimals, decimal comma: `+0,40%`.
pub fn format_signed_percent(v: f64) -> String {
    // Values that round to zero print as "+0,00%", never "-0,00%".
    let v = if (v * 100.0).round() == 0.0 { 0.0 } else { v };
    format!("{v:+.2}%").replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_shapes() {
        assert_eq!(parse_percentage("+1,23%"), Some(1.23));
        assert_eq!(parse_percentage("\u{2212}0,45%"), Some(-0.45));
        assert_eq!(parse_percentage("(-0,45%)"), Some(-0.45));
        assert_eq!(parse_percentage("(+0,42%)"), Some(0.42));
        assert_eq!(parse_percentage("1.924%"), Some(1.924));
        assert_eq!(parse_percentage(" 3,5 % "), Some(3.5));
        assert_eq!(parse_percentage("+1.234,50%"), Some(1234.5));
        assert_eq!(parse_percentage("+7,3\u{a0}%"), Some(7.3));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_percentage(""), None);
        assert_eq!(parse_percentage("%"), None);
        assert_eq!(parse_percentage("N/A"), None);
        assert_eq!(parse_percentage("inf%"), None);
        assert_eq!(parse_optional(None), None);
    }

    #[test]
    fn formats_with_sign_and_comma() {
        assert_eq!(format_signed_percent(0.4), "+0,40%");
        assert_eq!(format_signed_percent(-1.234), "-1,23%");
        assert_eq!(format_signed_percent(0.0), "+0,00%");
        assert_eq!(format_signed_percent(-0.0), "+0,00%");
    }

    #[test]
    fn format_then_parse_round_trips() {
        for v in [0.0, 1.23, -1.23, 0.5, -0.5] {
            let back = parse_percentage(&format_signed_percent(v)).expect("parses back");
            assert!((back - v).abs() < 1e-9, "{v} -> {back}");
        }
    }
}
