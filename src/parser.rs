//! Price text normalization
//!
//! Turns heterogeneous, locale-ambiguous price strings ("$19.99", "€19,99",
//! "1.234,56 EUR") into comparable numeric values, and derives a display
//! title from a product URL when the remote source provides none.

use lazy_static::lazy_static;
use regex::Regex;

/// Title used when a URL yields no usable path segment
pub const DEFAULT_TITLE: &str = "Amazon Item";

lazy_static! {
    /// Digits with at most one decimal separator group
    static ref SIMPLE_NUMERIC: Regex = Regex::new(r"[0-9]+(?:[.,][0-9]+)?").unwrap();
    /// Digits with any number of separator groups
    static ref GROUPED_NUMERIC: Regex = Regex::new(r"[0-9]+(?:[.,][0-9]+)*").unwrap();
}

/// How ambiguous decimal/thousands separators are resolved.
///
/// The two policies disagree on inputs like "1,234": `Simple` reads the
/// comma as a decimal point, `Heuristic` as a thousands separator. Pick one
/// per deployment; they are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeparatorPolicy {
    /// Match a single separator group and treat the separator as a decimal
    /// point. The leftmost numeric run wins, so "$1,234.56" matches "1,234"
    /// and parses as 1.234.
    #[default]
    Simple,
    /// Locale-aware disambiguation over the full grouped run: when both
    /// separators are present the last one is the decimal point; a lone
    /// comma followed by exactly three digits is a thousands separator,
    /// otherwise a decimal comma.
    Heuristic,
}

/// Extract the first numeric run from a price string under the default
/// [`SeparatorPolicy::Simple`] policy. Returns `None` when there is no
/// numeric run at all.
pub fn parse_price_value(text: Option<&str>) -> Option<f64> {
    parse_price_value_with(SeparatorPolicy::Simple, text)
}

/// Extract the first numeric run from a price string under the given policy.
pub fn parse_price_value_with(policy: SeparatorPolicy, text: Option<&str>) -> Option<f64> {
    let text = text?;
    if text.trim().is_empty() {
        return None;
    }
    let normalized = match policy {
        SeparatorPolicy::Simple => SIMPLE_NUMERIC.find(text)?.as_str().replace(',', "."),
        SeparatorPolicy::Heuristic => normalize_grouped(GROUPED_NUMERIC.find(text)?.as_str()),
    };
    normalized.parse::<f64>().ok()
}

/// Resolve separators in a grouped numeric run like "1.234,56" or "1,000".
fn normalize_grouped(value: &str) -> String {
    match (value.rfind(','), value.rfind('.')) {
        (Some(comma), Some(period)) => {
            if comma > period {
                // European format: 1.234,56
                value.replace('.', "").replace(',', ".")
            } else {
                // US format: 1,234.56
                value.replace(',', "")
            }
        }
        (Some(_), None) => {
            let parts: Vec<&str> = value.split(',').collect();
            if parts.len() == 2 && parts[1].len() == 3 {
                // Likely a thousands separator (1,000)
                value.replace(',', "")
            } else {
                // Decimal comma (1,50)
                value.replace(',', ".")
            }
        }
        _ => value.to_string(),
    }
}

/// Trimmed title if non-empty, else the fallback.
pub fn normalize_title(title: Option<&str>, fallback: &str) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => fallback.to_string(),
    }
}

/// Display name derived from the URL: the lower-cased substring after the
/// last `/`, or [`DEFAULT_TITLE`] when that is blank.
pub fn fallback_title_from_url(url: &str) -> String {
    let cleaned = url.to_lowercase();
    let segment = match cleaned.rfind('/') {
        Some(idx) => &cleaned[idx + 1..],
        None => cleaned.as_str(),
    };
    if segment.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<f64> {
        parse_price_value(Some(text))
    }

    fn parse_heuristic(text: &str) -> Option<f64> {
        parse_price_value_with(SeparatorPolicy::Heuristic, Some(text))
    }

    // ── parse_price_value (Simple policy) ────────────────────────────────

    #[test]
    fn parses_plain_decimal_prices() {
        assert_eq!(parse("$19.99"), Some(19.99));
        assert_eq!(parse("19.99"), Some(19.99));
        assert_eq!(parse("USD 7"), Some(7.0));
    }

    #[test]
    fn treats_comma_as_decimal_point() {
        assert_eq!(parse("€19,99"), Some(19.99));
        assert_eq!(parse("1,50 EUR"), Some(1.5));
    }

    #[test]
    fn returns_none_without_digits() {
        assert_eq!(parse("No price"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse_price_value(None), None);
    }

    #[test]
    fn simple_policy_stops_at_second_separator() {
        // The leftmost run with a single separator group wins: "1,234" out
        // of "$1,234.56", read as a decimal comma.
        assert_eq!(parse("$1,234.56"), Some(1.234));
        assert_eq!(parse("1.234,56"), Some(1.234));
        assert_eq!(parse("1,000"), Some(1.0));
    }

    #[test]
    fn picks_first_numeric_run() {
        assert_eq!(parse("was 30.00 now 25.50"), Some(30.0));
        assert_eq!(parse("3 for 10.00"), Some(3.0));
    }

    // ── parse_price_value_with (Heuristic policy) ────────────────────────

    #[test]
    fn heuristic_resolves_mixed_separators() {
        assert_eq!(parse_heuristic("$1,234.56"), Some(1234.56));
        assert_eq!(parse_heuristic("1.234,56 EUR"), Some(1234.56));
    }

    #[test]
    fn heuristic_reads_lone_comma_by_group_length() {
        assert_eq!(parse_heuristic("1,000"), Some(1000.0));
        assert_eq!(parse_heuristic("1,50"), Some(1.5));
        assert_eq!(parse_heuristic("€19,99"), Some(19.99));
    }

    #[test]
    fn heuristic_matches_simple_on_unambiguous_input() {
        assert_eq!(parse_heuristic("$19.99"), Some(19.99));
        assert_eq!(parse_heuristic("No price"), None);
    }

    // ── normalize_title ──────────────────────────────────────────────────

    #[test]
    fn normalize_title_prefers_trimmed_title() {
        assert_eq!(normalize_title(Some(" Widget "), "X"), "Widget");
    }

    #[test]
    fn normalize_title_falls_back_when_blank() {
        assert_eq!(normalize_title(None, "X"), "X");
        assert_eq!(normalize_title(Some(""), "X"), "X");
        assert_eq!(normalize_title(Some("   "), "X"), "X");
    }

    // ── fallback_title_from_url ──────────────────────────────────────────

    #[test]
    fn fallback_title_uses_last_path_segment() {
        assert_eq!(fallback_title_from_url("https://Amazon.com/dp/B000"), "b000");
        assert_eq!(fallback_title_from_url("no-slashes"), "no-slashes");
    }

    #[test]
    fn fallback_title_defaults_when_segment_blank() {
        assert_eq!(fallback_title_from_url("https://a.com/"), DEFAULT_TITLE);
        assert_eq!(fallback_title_from_url(""), DEFAULT_TITLE);
    }
}
