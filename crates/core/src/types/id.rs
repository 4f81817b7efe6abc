//! Newtype IDs for type-safe entity references.
//!
//! Backend records keyed by integers use the `define_id!` macro. Product ids
//! are different: they reach the storefront from browser storage, URLs and
//! the backend API in both string and numeric form, so [`ProductId`] keeps a
//! single canonical string and normalizes every input to it.

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use gaojie_core::define_id;
/// define_id!(CustomerId);
/// define_id!(InvoiceId);
///
/// let customer_id = CustomerId::new(1);
/// let invoice_id = InvoiceId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = invoice_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Backend entity IDs
define_id!(UserId);
define_id!(OrderId);

/// Errors that can occur when parsing a [`ProductId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductIdError {
    /// The input is empty after trimming.
    #[error("product id cannot be empty")]
    Empty,
}

/// Canonical product identifier.
///
/// Always a string. Purely numeric inputs lose surrounding whitespace and
/// leading zeros, so `7`, `"7"` and `" 007 "` are the same product. Equality
/// is exact string equality on the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Parse and normalize a product id.
    ///
    /// # Errors
    ///
    /// Returns [`ProductIdError::Empty`] if the input is blank.
    pub fn parse(raw: &str) -> Result<Self, ProductIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProductIdError::Empty);
        }

        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            let stripped = trimmed.trim_start_matches('0');
            let canonical = if stripped.is_empty() { "0" } else { stripped };
            return Ok(Self(canonical.to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the canonical id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for ProductId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl std::str::FromStr for ProductId {
    type Err = ProductIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProductIdVisitor;

        impl Visitor<'_> for ProductIdVisitor {
            type Value = ProductId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a product id as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ProductId, E> {
                ProductId::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ProductId, E> {
                Ok(ProductId::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ProductId, E> {
                Ok(ProductId(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<ProductId, E> {
                if v.fract() == 0.0 && v >= 0.0 && v <= 9_007_199_254_740_992.0 {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let whole = v as u64;
                    return Ok(ProductId::from(whole));
                }
                Err(E::custom(format!("product id {v} is not an integer")))
            }
        }

        deserializer.deserialize_any(ProductIdVisitor)
    }
}

/// Human-facing order number issued by the backend (e.g. `GJ20240101ABCD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Wrap an order number returned by the backend.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_ids_are_equal() {
        let from_number: ProductId = serde_json::from_str("7").unwrap();
        let from_string: ProductId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(ProductId::parse(" 007 ").unwrap(), from_number);
    }

    #[test]
    fn test_zero_id_survives_normalization() {
        assert_eq!(ProductId::parse("000").unwrap().as_str(), "0");
    }

    #[test]
    fn test_slug_ids_are_trimmed_not_rewritten() {
        let id = ProductId::parse("  vitamin-c-serum ").unwrap();
        assert_eq!(id.as_str(), "vitamin-c-serum");
    }

    #[test]
    fn test_empty_id_rejected() {
        assert_eq!(ProductId::parse("   "), Err(ProductIdError::Empty));
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
    }

    #[test]
    fn test_product_id_serializes_as_string() {
        let id = ProductId::from(42_u64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn test_float_ids_from_javascript_storage() {
        let id: ProductId = serde_json::from_str("12.0").unwrap();
        assert_eq!(id.as_str(), "12");
        assert!(serde_json::from_str::<ProductId>("1.5").is_err());
    }

    #[test]
    fn test_define_id_display() {
        let user = UserId::new(12);
        assert_eq!(user.to_string(), "12");
        assert_eq!(i32::from(user), 12);
    }
}
