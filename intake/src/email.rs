//! Turns obfuscated or hand-typed email text into a canonical address.

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];
const WRAPPING: &[char] = &[
    '"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '<', '>', '(', ')', '[', ']',
];

struct Patterns {
    angle: Regex,
    at: Regex,
    dot: Regex,
    comma_com: Regex,
    comma_at: Regex,
    dots: Regex,
    address: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        angle: Regex::new(r"<([^>]+)>").expect("valid angle regex"),
        at: Regex::new(r"(?i)\[at\]|\(at\)|\bat\b").expect("valid at regex"),
        dot: Regex::new(r"(?i)\[dot\]|\(dot\)|\bdot\b").expect("valid dot regex"),
        comma_com: Regex::new(r"(?i),com\b").expect("valid comma regex"),
        comma_at: Regex::new(r",+@").expect("valid comma at regex"),
        dots: Regex::new(r"\.{2,}").expect("valid dots regex"),
        address: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("valid address regex"),
    })
}

/// Returns the canonical lowercase address, or an empty string if `raw` cannot be read
/// as one. Applying it to its own non-empty output returns the same output.
pub fn sanitize_email(raw: &str) -> String {
    let p = patterns();

    let normalized: String = raw.nfkc().filter(|c| !ZERO_WIDTH.contains(c)).collect();
    let mut s = normalized.trim();

    // "Name" <address>
    if let Some(inner) = p.angle.captures(s).and_then(|c| c.get(1)) {
        s = inner.as_str();
    }

    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let s = p.at.replace_all(&compact, "@");
    let s = p.dot.replace_all(&s, ".");
    let s = p.comma_com.replace_all(&s, ".com");
    let s = p.comma_at.replace_all(&s, "@");

    let s = s
        .trim_matches(|c: char| c.is_whitespace() || WRAPPING.contains(&c))
        .to_lowercase();
    let s = p.dots.replace_all(&s, ".").into_owned();

    if !p.address.is_match(&s) {
        return String::new();
    }
    let Some((local, domain)) = s.split_once('@') else {
        return String::new();
    };
    let dotted_edge = |part: &str| part.starts_with('.') || part.ends_with('.');
    if local.is_empty() || domain.is_empty() || dotted_edge(local) || dotted_edge(domain) {
        return String::new();
    }

    s
}
