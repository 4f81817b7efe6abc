//! Payment card field formatting.
//!
//! These helpers shape what a shopper types into the card form before the
//! fields are handed to the payment provider for tokenization. They are input
//! conveniences only; the provider performs the real card checks.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Longest card number accepted (ISO/IEC 7812).
pub const MAX_CARD_DIGITS: usize = 19;
/// Shortest card number accepted.
pub const MIN_CARD_DIGITS: usize = 12;

/// Errors for card form fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CardFieldError {
    /// Card number has the wrong number of digits.
    #[error("card number must have {MIN_CARD_DIGITS}-{MAX_CARD_DIGITS} digits")]
    NumberLength,
    /// Expiry is not `MM/YY` with a month of 01-12.
    #[error("expiry must be MM/YY")]
    Expiry,
    /// CVV is not 3 or 4 digits.
    #[error("security code must be 3 or 4 digits")]
    Cvv,
}

fn digits_only(raw: &str, max: usize) -> String {
    raw.chars().filter(char::is_ascii_digit).take(max).collect()
}

/// Keep up to 19 digits and group them in blocks of four.
///
/// ```
/// use gaojie_core::format_card_number;
///
/// assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
/// assert_eq!(format_card_number("4242-42"), "4242 42");
/// ```
#[must_use]
pub fn format_card_number(raw: &str) -> String {
    let digits = digits_only(raw, MAX_CARD_DIGITS);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

/// Digits of a card number with a length check.
///
/// # Errors
///
/// Returns [`CardFieldError::NumberLength`] outside 12-19 digits.
pub fn card_number_digits(raw: &str) -> Result<String, CardFieldError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if (MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&digits.len()) {
        Ok(digits)
    } else {
        Err(CardFieldError::NumberLength)
    }
}

/// Auto-format an expiry as the shopper types: `1226` becomes `12/26`.
///
/// ```
/// use gaojie_core::format_expiry;
///
/// assert_eq!(format_expiry("1226"), "12/26");
/// assert_eq!(format_expiry("1"), "1");
/// assert_eq!(format_expiry("12/2"), "12/2");
/// ```
#[must_use]
pub fn format_expiry(raw: &str) -> String {
    let digits = digits_only(raw, 4);
    match digits.split_at_checked(2) {
        Some((month, year)) if !year.is_empty() => format!("{month}/{year}"),
        _ => digits,
    }
}

/// Keep at most four digits of a security code.
#[must_use]
pub fn restrict_cvv(raw: &str) -> String {
    digits_only(raw, 4)
}

/// Validate a security code.
///
/// # Errors
///
/// Returns [`CardFieldError::Cvv`] unless the input is exactly 3 or 4 digits.
pub fn validate_cvv(raw: &str) -> Result<(), CardFieldError> {
    let trimmed = raw.trim();
    if (3..=4).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(CardFieldError::Cvv)
    }
}

/// A card expiry month and two-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardExpiry {
    /// Month, 1-12.
    pub month: u8,
    /// Two-digit year.
    pub year: u8,
}

impl CardExpiry {
    /// Parse `MM/YY` (or bare `MMYY`).
    ///
    /// # Errors
    ///
    /// Returns [`CardFieldError::Expiry`] for anything else.
    pub fn parse(raw: &str) -> Result<Self, CardFieldError> {
        let formatted = format_expiry(raw);
        let (month, year) = formatted.split_once('/').ok_or(CardFieldError::Expiry)?;
        if month.len() != 2 || year.len() != 2 {
            return Err(CardFieldError::Expiry);
        }
        let month: u8 = month.parse().map_err(|_| CardFieldError::Expiry)?;
        let year: u8 = year.parse().map_err(|_| CardFieldError::Expiry)?;
        if !(1..=12).contains(&month) {
            return Err(CardFieldError::Expiry);
        }
        Ok(Self { month, year })
    }

    /// Four-digit year, assuming the 2000s.
    #[must_use]
    pub fn full_year(self) -> u16 {
        2000 + u16::from(self.year)
    }
}

impl fmt::Display for CardExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_card_number_truncated_at_nineteen_digits() {
        let formatted = format_card_number("1234 5678 9012 3456 7890 12");
        assert_eq!(formatted, "1234 5678 9012 3456 789");
    }

    #[test]
    fn test_card_number_digits_length() {
        assert_eq!(
            card_number_digits("4242 4242 4242 4242").unwrap(),
            "4242424242424242"
        );
        assert_eq!(
            card_number_digits("4242 4242"),
            Err(CardFieldError::NumberLength)
        );
    }

    #[test]
    fn test_expiry_parse() {
        let expiry = CardExpiry::parse("07/29").unwrap();
        assert_eq!(expiry, CardExpiry { month: 7, year: 29 });
        assert_eq!(expiry.to_string(), "07/29");
        assert_eq!(expiry.full_year(), 2029);
        assert_eq!(CardExpiry::parse("0729").unwrap(), expiry);
    }

    #[test]
    fn test_expiry_rejects_bad_month() {
        assert_eq!(CardExpiry::parse("13/29"), Err(CardFieldError::Expiry));
        assert_eq!(CardExpiry::parse("00/29"), Err(CardFieldError::Expiry));
        assert_eq!(CardExpiry::parse("7/29"), Err(CardFieldError::Expiry));
    }

    #[test]
    fn test_cvv() {
        assert_eq!(restrict_cvv("12a345"), "1234");
        assert!(validate_cvv("123").is_ok());
        assert!(validate_cvv("1234").is_ok());
        assert_eq!(validate_cvv("12"), Err(CardFieldError::Cvv));
        assert_eq!(validate_cvv("12a"), Err(CardFieldError::Cvv));
    }
}
