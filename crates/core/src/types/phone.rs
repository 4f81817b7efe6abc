//! Phone numbers normalized to international form.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Thailand's country calling code, the store's home market.
pub const THAILAND_COUNTRY_CODE: &str = "66";

/// Errors that can occur when normalizing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input has no digits.
    #[error("phone number cannot be empty")]
    Empty,
    /// Too few or too many digits for an international number.
    #[error("phone number must have between {min} and {max} digits (got {got})")]
    InvalidLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count (E.164).
        max: usize,
        /// Digit count after normalization.
        got: usize,
    },
}

/// A phone number in `+<country><subscriber>` form, digits only.
///
/// Separators are dropped and a leading trunk `0` is replaced by the country
/// calling code:
///
/// ```
/// use gaojie_core::PhoneNumber;
///
/// let phone = PhoneNumber::normalize("081-234-5678").unwrap();
/// assert_eq!(phone.as_str(), "+66812345678");
///
/// let phone = PhoneNumber::normalize("+66 12 345 6789").unwrap();
/// assert_eq!(phone.as_str(), "+66123456789");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum digits including the country code.
    pub const MIN_DIGITS: usize = 9;
    /// Maximum digits including the country code (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Normalize using the Thai country code.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if no digits remain or the length is wrong.
    pub fn normalize(raw: &str) -> Result<Self, PhoneError> {
        Self::normalize_with_country(raw, THAILAND_COUNTRY_CODE)
    }

    /// Normalize with an explicit country calling code (digits, no `+`).
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if no digits remain or the length is wrong.
    pub fn normalize_with_country(raw: &str, country_code: &str) -> Result<Self, PhoneError> {
        let trimmed = raw.trim();
        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let international = if trimmed.starts_with('+') {
            digits
        } else if trimmed.starts_with("00") {
            // Only the international call prefix; zeros after it are significant.
            digits.strip_prefix("00").unwrap_or(&digits).to_owned()
        } else if let Some(national) = digits.strip_prefix('0') {
            format!("{country_code}{national}")
        } else if digits.starts_with(country_code) && digits.len() > Self::MIN_DIGITS {
            digits
        } else {
            format!("{country_code}{digits}")
        };

        let got = international.len();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&got) {
            return Err(PhoneError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
                got,
            });
        }

        Ok(Self(format!("+{international}")))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
