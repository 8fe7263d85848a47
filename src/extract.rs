//! Product page extraction
//!
//! Pulls the displayed title and price out of raw product page HTML. The
//! pattern lists cover the price block variants Amazon has shipped over the
//! years; the first pattern with a non-empty cleaned capture wins.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

lazy_static! {
    static ref TITLE_PATTERNS: Vec<Regex> = compile(&[
        r#"id="productTitle"[^>]*>(.*?)<"#,
        r#"class="product-title-word-break"[^>]*>(.*?)<"#,
    ]);
    static ref PRICE_PATTERNS: Vec<Regex> = compile(&[
        r#"id="priceblock_ourprice"[^>]*>(.*?)<"#,
        r#"id="priceblock_dealprice"[^>]*>(.*?)<"#,
        r#"id="priceblock_saleprice"[^>]*>(.*?)<"#,
        r#"class="a-price-whole"[^>]*>(.*?)<"#,
        r#"class="a-offscreen"[^>]*>(.*?)<"#,
    ]);
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NUMERIC_ENTITY: Regex = Regex::new(r"&#([0-9]+);").unwrap();
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .expect("invalid extraction pattern")
        })
        .collect()
}

/// Extract the product title from page HTML.
pub fn extract_title(html: &str) -> Option<String> {
    extract_with(&TITLE_PATTERNS, html)
}

/// Extract the displayed price text from page HTML.
pub fn extract_price(html: &str) -> Option<String> {
    extract_with(&PRICE_PATTERNS, html)
}

fn extract_with(patterns: &[Regex], html: &str) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(html) {
            let cleaned = clean_text(&unescape_entities(&caps[1]));
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

/// Decode the HTML entities that show up in title and price text.
fn unescape_entities(text: &str) -> String {
    let text = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs and trim.
fn clean_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// True when the body is a robot check page rather than a product page.
pub fn looks_like_captcha(html: &str) -> bool {
    let lowered = html.to_lowercase();
    lowered.contains("captcha") || lowered.contains("robot check")
}

/// Clean up a user-supplied URL: trim, default to https, strip the fragment.
/// Returns `None` for empty or host-less input.
pub fn normalize_url(url: &str) -> Option<String> {
    let cleaned = url.trim();
    if cleaned.is_empty() {
        return None;
    }
    let with_scheme = if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
        cleaned.to_string()
    } else {
        format!("https://{}", cleaned)
    };
    let without_fragment = match with_scheme.split_once('#') {
        Some((before, _)) => before.to_string(),
        None => with_scheme,
    };
    host_of(&without_fragment)?;
    Some(without_fragment)
}

/// Hostname of an absolute URL, without the port.
fn host_of(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let host_port = rest.split(['/', '?']).next().unwrap_or("");
    let host = host_port.split(':').next().unwrap_or("");
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// True when the hostname carries an `amazon` label directly in front of a
/// one- or two-part public suffix (amazon.com, amazon.co.uk, www.amazon.de).
pub fn is_allowed_product_url(url: &str) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };
    let host = host.to_lowercase();
    let parts: Vec<&str> = host.split('.').filter(|p| !p.is_empty()).collect();
    parts
        .iter()
        .enumerate()
        .any(|(idx, part)| *part == "amazon" && matches!(parts.len() - idx - 1, 1 | 2))
}
