//! Canonical dialable form of free-text US phone numbers.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedPhone {
    pub e164: String,
    pub extension: Option<String>,
}

fn extension_re() -> &'static Regex {
    static EXTENSION_RE: OnceLock<Regex> = OnceLock::new();
    EXTENSION_RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^a-z])((?:ext\.?|x|#)\s*([0-9]{1,6}))\b")
            .expect("valid extension regex")
    })
}

/// Normalizes `raw` to E.164, or returns `None` when the number is ambiguous.
///
/// An extension marker (`ext`, `x` or `#` followed by up to 6 digits) is split off first
/// and does not count towards the number. A marker directly after a letter is part of a
/// word, not an extension. Input starting with `+` is accepted as international if it
/// carries 8 to 15 digits. Otherwise the digits must form a NANP number: 10 digits, or 11
/// with a leading 1.
pub fn normalize_phone(raw: &str) -> Option<NormalizedPhone> {
    let (number, extension) = split_extension(raw);

    let kept: String = number
        .chars()
        .filter(|c| *c == '+' || c.is_ascii_digit())
        .collect();
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();

    let international = number.trim().starts_with('+')
        && kept.strip_prefix('+').is_some_and(|rest| {
            rest.chars().all(|c| c.is_ascii_digit()) && (8..=15).contains(&rest.len())
        });

    let e164 = if international {
        kept
    } else if digits.len() == 11 && digits.starts_with('1') {
        format!("+{digits}")
    } else if digits.len() == 10 {
        format!("+1{digits}")
    } else {
        return None;
    };

    Some(NormalizedPhone { e164, extension })
}

fn split_extension(raw: &str) -> (String, Option<String>) {
    let Some(captures) = extension_re().captures(raw) else {
        return (raw.to_string(), None);
    };
    // Group 1 leaves out the character matched in front of the marker.
    match (captures.get(1), captures.get(2)) {
        (Some(marker), Some(digits)) => (
            format!("{}{}", &raw[..marker.start()], &raw[marker.end()..]),
            Some(digits.as_str().to_string()),
        ),
        _ => (raw.to_string(), None),
    }
}
