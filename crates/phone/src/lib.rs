//! Brazilian phone number validation and normalization.
//!
//! WhatsApp gateways expect numbers in the canonical `55<national>` form with
//! ASCII digits only. Operators type numbers every way imaginable
//! (`(11) 99999-8888`, `+55 11 99999 8888`, `11999998888`...), so everything
//! that enters the delivery queue goes through [`normalize`] first.
//!
//! Normalization is a pure function: no I/O, fully deterministic, and
//! idempotent over its own output.

/// Brazil's country calling code.
pub const COUNTRY_CODE: &str = "55";

/// Validate and canonicalize a raw phone number.
///
/// Returns `None` when the input cannot be a valid Brazilian number.
///
/// Rules, in order:
/// 1. Strip every non-digit character.
/// 2. Strip a leading `55` country code if present.
/// 3. Accept only 10 digits (landline) or 11 digits (mobile).
/// 4. The area code (first two digits) must be in 11..=99.
/// 5. A 10-digit number whose third digit is 6-9 is a mobile missing the
///    ninth digit; insert a `9` after the area code.
/// 6. Return `55` followed by the national number.
///
/// # Example
///
/// ```
/// assert_eq!(phone::normalize("11-99999-8888").as_deref(), Some("5511999998888"));
/// assert_eq!(phone::normalize("not a phone"), None);
/// ```
pub fn normalize(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if let Some(national) = digits.strip_prefix(COUNTRY_CODE) {
        // Only treat "55" as a country code when what remains is a plausible
        // national number; "55 3333-4444" is area code 55, not Brazil twice.
        if national.len() >= 10 {
            digits = national.to_string();
        }
    }

    if digits.len() != 10 && digits.len() != 11 {
        return None;
    }

    let area_code: u32 = digits[..2].parse().ok()?;
    if !(11..=99).contains(&area_code) {
        return None;
    }

    // Legacy 8-digit mobile numbers (prefix 6-9) gained a leading 9 in the
    // national numbering plan; landlines (prefix 2-5) stay at 10 digits.
    if digits.len() == 10 && matches!(digits.as_bytes()[2], b'6'..=b'9') {
        digits.insert(2, '9');
    }

    Some(format!("{}{}", COUNTRY_CODE, digits))
}

/// Whether `raw` normalizes to a valid canonical number.
pub fn is_valid(raw: &str) -> bool {
    normalize(raw).is_some()
}
