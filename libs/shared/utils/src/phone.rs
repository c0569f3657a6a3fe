//! E.164 normalisation for outbound SMS and voice calls.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

pub const DEFAULT_COUNTRY_CODE: &str = "91";

fn non_digits() -> &'static Regex {
    static NON_DIGITS: OnceLock<Regex> = OnceLock::new();
    NON_DIGITS.get_or_init(|| Regex::new(r"\D").expect("static regex"))
}

/// Normalise a user-entered phone number to `+<country><number>`.
///
/// Ten-digit numbers are treated as national numbers and get
/// `default_country_code`; 11 to 15 digits are assumed to already carry a
/// country code. Anything else is rejected.
pub fn format_phone_number(raw: &str, default_country_code: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let digits = non_digits().replace_all(raw, "");
    let cleaned = digits.trim_start_matches('0');

    match cleaned.len() {
        10 => Some(format!("+{}{}", default_country_code, cleaned)),
        11..=15 => Some(format!("+{}", cleaned)),
        _ => {
            warn!("Invalid phone number format: {} (cleaned: {})", raw, cleaned);
            None
        }
    }
}

pub fn is_valid_phone_number(raw: &str) -> bool {
    format_phone_number(raw, DEFAULT_COUNTRY_CODE)
        .map(|formatted| (10..=16).contains(&formatted.len()))
        .unwrap_or(false)
}
