//! Promo codes.
//!
//! Codes are looked up in a [`PromoTable`], trimmed and lowercased. The
//! built-in table can be replaced by a JSON file:
//!
//! ```json
//! [
//!   {"code": "welcome15", "type": "percentage", "value": "0.15"},
//!   {"code": "take100", "type": "fixed", "value": 100},
//!   {"code": "freeship", "type": "free_shipping"}
//! ]
//! ```

use std::collections::HashMap;
use std::path::Path;

use gaojie_core::{Amount, CurrencyCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a promo does to the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PromoKind {
    /// Fraction of the subtotal, e.g. `0.15`.
    #[serde(rename = "percentage")]
    PercentageOff(Decimal),
    /// Flat amount, capped at the subtotal.
    #[serde(rename = "fixed")]
    FixedAmountOff(Amount),
    /// Shipping becomes free; no discount on goods.
    FreeShipping,
}

impl PromoKind {
    /// Discount fraction as persisted (`0` for non-percentage promos).
    #[must_use]
    pub const fn stored_fraction(self) -> Decimal {
        match self {
            Self::PercentageOff(fraction) => fraction,
            Self::FixedAmountOff(_) | Self::FreeShipping => Decimal::ZERO,
        }
    }

    /// Short text for the order summary, e.g. `15% off`.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::PercentageOff(fraction) => {
                format!("{}% off", (fraction * Decimal::ONE_HUNDRED).normalize())
            }
            Self::FixedAmountOff(amount) => format!("{} off", amount.display(CurrencyCode::THB)),
            Self::FreeShipping => "Free shipping".to_string(),
        }
    }
}

/// The active promo on a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoState {
    pub code: String,
    #[serde(flatten)]
    pub kind: PromoKind,
}

/// Persisted promo entry, `{code, discount}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredPromo {
    pub code: String,
    #[serde(default)]
    pub discount: Decimal,
}

impl From<&PromoState> for StoredPromo {
    fn from(promo: &PromoState) -> Self {
        Self {
            code: promo.code.clone(),
            discount: promo.kind.stored_fraction(),
        }
    }
}

/// Errors loading a promo table file.
#[derive(Debug, Error)]
pub enum PromoTableError {
    #[error("failed to read promo table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid promo table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid promo {code}: {reason}")]
    Invalid { code: String, reason: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum PromoType {
    Percentage,
    Fixed,
    FreeShipping,
}

#[derive(Deserialize)]
struct PromoEntry {
    code: String,
    #[serde(rename = "type")]
    promo_type: PromoType,
    #[serde(default)]
    value: Option<Decimal>,
}

impl PromoEntry {
    fn kind(&self, code: &str) -> Result<PromoKind, PromoTableError> {
        let invalid = |reason: String| PromoTableError::Invalid {
            code: code.to_string(),
            reason,
        };
        match self.promo_type {
            PromoType::FreeShipping => Ok(PromoKind::FreeShipping),
            PromoType::Percentage => {
                let fraction = self.value.ok_or_else(|| invalid("missing value".to_string()))?;
                if fraction <= Decimal::ZERO || fraction > Decimal::ONE {
                    return Err(invalid(format!("fraction {fraction} must be in (0, 1]")));
                }
                Ok(PromoKind::PercentageOff(fraction))
            }
            PromoType::Fixed => {
                let value = self.value.ok_or_else(|| invalid("missing value".to_string()))?;
                if value <= Decimal::ZERO || !value.fract().is_zero() {
                    return Err(invalid(format!("amount {value} must be a positive whole number")));
                }
                Ok(PromoKind::FixedAmountOff(Amount::from_decimal_rounded(value)))
            }
        }
    }
}

/// Table of valid promo codes.
#[derive(Debug, Clone)]
pub struct PromoTable {
    codes: HashMap<String, PromoKind>,
}

impl Default for PromoTable {
    fn default() -> Self {
        Self::from_entries([
            ("welcome15", PromoKind::PercentageOff(Decimal::new(15, 2))),
            ("save10", PromoKind::PercentageOff(Decimal::new(10, 2))),
            ("newcustomer", PromoKind::PercentageOff(Decimal::new(20, 2))),
            ("freeship", PromoKind::FreeShipping),
        ])
    }
}

impl PromoTable {
    /// Build a table from `(code, kind)` pairs. Codes are normalized.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, PromoKind)>) -> Self {
        let codes = entries
            .into_iter()
            .map(|(code, kind)| (normalize_code(code), kind))
            .collect();
        Self { codes }
    }

    /// Parse a JSON table.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, blank codes, or fractions outside `(0, 1]`.
    pub fn from_json(raw: &str) -> Result<Self, PromoTableError> {
        let entries: Vec<PromoEntry> = serde_json::from_str(raw)?;
        let mut codes = HashMap::with_capacity(entries.len());

        for entry in entries {
            let code = normalize_code(&entry.code);
            if code.is_empty() {
                return Err(PromoTableError::Invalid {
                    code: entry.code,
                    reason: "code is blank".to_string(),
                });
            }
            let kind = entry.kind(&code)?;
            codes.insert(code, kind);
        }

        Ok(Self { codes })
    }

    /// Load a JSON table from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PromoTableError> {
        let raw = std::fs::read_to_string(path).map_err(|source| PromoTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Resolve a shopper-entered code.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<PromoState> {
        let code = normalize_code(code);
        self.codes
            .get(&code)
            .map(|kind| PromoState { code, kind: *kind })
    }

    /// Number of codes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// `true` if the table has no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Trim and lowercase a code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}
