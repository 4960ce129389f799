//! Input validation and sanitization
//!
//! Centralized field rules for the delivery form and payment step,
//! plus the sanitizer applied to every free-text value before it is
//! stored or interpolated into the outbound message. The message is
//! plain text, not HTML: sanitizing means stripping control characters,
//! pictographs and links, not escaping.

use shared::models::customer::CustomerProfile;
use shared::models::payment::{PaymentMethod, PaymentSelection};
use thiserror::Error;

use crate::store::money::to_decimal;

// ── Text length limits ──────────────────────────────────────────────

/// Names and recipient labels
pub const MAX_NAME_LEN: usize = 100;

/// Item notes and address reference notes
pub const MAX_NOTE_LEN: usize = 200;

/// Minimum characters for a customer name
pub const MIN_NAME_LEN: usize = 3;

/// CEP digit count
pub const POSTAL_CODE_LEN: usize = 8;

/// Ceiling for cash change-for amounts
pub const MAX_CHANGE_FOR: f64 = 200.0;

// ── Errors ──────────────────────────────────────────────────────────

/// What a field failed on; surfaced as inline form feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationKind {
    #[error("must not be empty")]
    Missing,
    #[error("is too short")]
    TooShort,
    #[error("must not contain digits")]
    ContainsDigits,
    #[error("must not contain letters")]
    ContainsLetters,
    #[error("is incomplete")]
    Incomplete,
    #[error("is out of range")]
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {kind}")]
pub struct ValidationError {
    pub field: &'static str,
    pub kind: ValidationKind,
}

fn fail(field: &'static str, kind: ValidationKind) -> Result<(), ValidationError> {
    Err(ValidationError { field, kind })
}

// ── Sanitizer ───────────────────────────────────────────────────────

/// Strip control characters, pictographs and links; collapse whitespace
pub fn sanitize_text(value: &str) -> String {
    let tokens = value.split_whitespace().filter_map(|token| {
        let lower = token.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.")
        {
            return None;
        }
        let cleaned: String = token.chars().filter(|c| !c.is_control() && !is_pictograph(*c)).collect();
        if cleaned.is_empty() { None } else { Some(cleaned) }
    });
    tokens.collect::<Vec<_>>().join(" ")
}

/// Emoji/pictograph blocks removed from user input
fn is_pictograph(c: char) -> bool {
    matches!(u32::from(c),
        0x1F300..=0x1F5FF   // symbols and pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1F1E0..=0x1F1FF // flags
        | 0x2600..=0x26FF   // miscellaneous symbols
        | 0x2700..=0x27BF   // dingbats
        | 0xFE00..=0xFE0F   // variation selectors
    )
}

/// Capitalize each word, keeping Portuguese particles lowercase
pub fn capitalize_name(name: &str) -> String {
    const PARTICLES: [&str; 6] = ["de", "da", "do", "dos", "das", "e"];

    name.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if PARTICLES.contains(&lower.as_str()) {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep only ASCII digits
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

// ── Display masks ───────────────────────────────────────────────────

/// Brazilian phone mask: (XX) 9XXXX-XXXX or (XX) XXXX-XXXX
pub fn mask_phone(value: &str) -> String {
    let digits = digits_only(value);
    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({digits}"),
        3..=6 => format!("({}) {}", &digits[..2], &digits[2..]),
        7..=10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..11]),
    }
}

/// CEP mask: XXXXX-XXX
pub fn mask_postal_code(value: &str) -> String {
    let digits: String = digits_only(value).chars().take(POSTAL_CODE_LEN).collect();
    if digits.len() <= 5 {
        digits
    } else {
        format!("{}-{}", &digits[..5], &digits[5..])
    }
}

// ── Field validators ────────────────────────────────────────────────

/// Letters, spaces and diacritics only, at least 3 characters
pub fn validate_name(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fail("name", ValidationKind::Missing);
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return fail("name", ValidationKind::ContainsDigits);
    }
    if trimmed.chars().count() < MIN_NAME_LEN {
        return fail("name", ValidationKind::TooShort);
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return fail("name", ValidationKind::Incomplete);
    }
    Ok(())
}

/// Brazilian phone: 10 or 11 digits; 11-digit numbers are mobile and
/// must have '9' as the third digit
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    validate_phone_field("phone", value)
}

fn validate_phone_field(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return fail(field, ValidationKind::Missing);
    }
    if value.chars().any(|c| c.is_ascii_alphabetic()) {
        return fail(field, ValidationKind::ContainsLetters);
    }
    let digits = digits_only(value);
    if digits.len() != 10 && digits.len() != 11 {
        return fail(field, ValidationKind::Incomplete);
    }
    if digits.len() == 11 && digits.as_bytes()[2] != b'9' {
        return fail(field, ValidationKind::Incomplete);
    }
    Ok(())
}

/// CEP: exactly 8 digits when present
pub fn validate_postal_code(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(|c| c.is_ascii_alphabetic()) {
        return fail("postal_code", ValidationKind::ContainsLetters);
    }
    if digits_only(value).len() != POSTAL_CODE_LEN {
        return fail("postal_code", ValidationKind::Incomplete);
    }
    Ok(())
}

pub fn validate_street(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fail("street", ValidationKind::Missing);
    }
    if trimmed.chars().count() < 2 {
        return fail("street", ValidationKind::TooShort);
    }
    Ok(())
}

/// Address number: alphanumeric, accepts "S/N" for unnumbered addresses
pub fn validate_number(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fail("number", ValidationKind::Missing);
    }
    if !trimmed.chars().all(|c| c.is_alphanumeric() || matches!(c, ' ' | '/' | '-')) {
        return fail("number", ValidationKind::Incomplete);
    }
    Ok(())
}

pub fn validate_neighborhood(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fail("neighborhood", ValidationKind::Missing);
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return fail("neighborhood", ValidationKind::ContainsDigits);
    }
    if trimmed.chars().count() < 2 {
        return fail("neighborhood", ValidationKind::TooShort);
    }
    Ok(())
}

pub fn validate_city(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fail("city", ValidationKind::Missing);
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return fail("city", ValidationKind::ContainsDigits);
    }
    if trimmed.chars().count() < 3 {
        return fail("city", ValidationKind::TooShort);
    }
    Ok(())
}

/// Full delivery-form check, field by field
pub fn validate_customer(profile: &CustomerProfile) -> Result<(), ValidationError> {
    validate_name(&profile.name)?;
    validate_phone_field("phone", &profile.phone)?;
    if let Some(secondary) = &profile.secondary_phone {
        validate_phone_field("secondary_phone", secondary)?;
    }
    validate_street(&profile.address.street)?;
    validate_number(&profile.address.number)?;
    validate_neighborhood(&profile.address.neighborhood)?;
    validate_city(&profile.address.city)?;
    if let Some(postal_code) = &profile.address.postal_code {
        validate_postal_code(postal_code)?;
    }
    Ok(())
}

/// Payment check against the order total
///
/// Cash either needs the no-change flag or a change-for amount that
/// strictly exceeds the total, capped at [`MAX_CHANGE_FOR`].
pub fn validate_payment(selection: &PaymentSelection, total: f64) -> Result<(), ValidationError> {
    if selection.method != PaymentMethod::Cash || selection.no_change {
        return Ok(());
    }
    let Some(change_for) = selection.change_for else {
        return fail("change_for", ValidationKind::Missing);
    };
    if !change_for.is_finite() {
        return fail("change_for", ValidationKind::OutOfRange);
    }
    if to_decimal(change_for) <= to_decimal(total) {
        return fail("change_for", ValidationKind::OutOfRange);
    }
    if to_decimal(change_for) > to_decimal(MAX_CHANGE_FOR) {
        return fail("change_for", ValidationKind::OutOfRange);
    }
    Ok(())
}
