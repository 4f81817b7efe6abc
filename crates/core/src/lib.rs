//! GAOJIE Core - Shared types library.
//!
//! This crate provides common types used across the GAOJIE storefront:
//! - `storefront` - Cart engine, checkout flow and JSON handlers
//! - `integration-tests` - Cross-module scenarios against a mock backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product ids, order numbers, money,
//!   emails, phone numbers, payment card fields and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
