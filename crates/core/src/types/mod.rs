//! Core types for the GAOJIE storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod card;
pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use card::{
    CardExpiry, CardFieldError, card_number_digits, format_card_number, format_expiry,
    restrict_cvv, validate_cvv,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Amount, CurrencyCode};
pub use phone::{PhoneError, PhoneNumber};
pub use status::*;
