//! Checkout flow.
//!
//! - [`fields`] - form values, input formatting and per-step validation
//! - [`stepper`] - the four-step state machine
//! - [`submission`] - payment tokenization and order placement
//!
//! Progress (current step and the non-card form values) is kept in the
//! shopper's storage under [`keys::CHECKOUT`] so a reload resumes where the
//! shopper left off.

pub mod fields;
pub mod stepper;
pub mod submission;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gaojie_core::PhoneNumber;

pub use fields::{CheckoutForm, Field, FieldErrors};
pub use stepper::{CheckoutStep, CheckoutStepper, StepChange, StepRejected, validate_all};
pub use submission::{
    BackendOrders, CheckoutDetails, InFlightSubmissions, OrderConfirmation, OrderError,
    OrderGateway, OrderSubmission, SubmissionPermit,
};

use crate::api::ShippingInfo;
use crate::cart::{CartError, CartStorage, keys};

/// Country sent with every shipping address.
pub const SHIPPING_COUNTRY: &str = "Thailand";

/// Persisted checkout progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutState {
    pub stepper: CheckoutStepper,
    pub form: CheckoutForm,
    /// In-flight guard key when the request carries no session id.
    pub submission_key: String,
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self {
            stepper: CheckoutStepper::new(),
            form: CheckoutForm::default(),
            submission_key: Uuid::new_v4().to_string(),
        }
    }
}

impl CheckoutState {
    /// Load stored progress. Missing or unreadable state starts fresh.
    pub async fn load<S: CartStorage>(storage: &S) -> Self {
        match storage.read(keys::CHECKOUT).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Corrupt checkout entry, starting over");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Checkout storage unavailable, starting over");
                Self::default()
            }
        }
    }

    /// Persist progress. Card fields are never written.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StorageUnavailable`] if the entry cannot be saved.
    pub async fn save<S: CartStorage>(&self, storage: &S) -> Result<(), CartError> {
        let encoded = serde_json::to_string(self)?;
        storage.write(keys::CHECKOUT, encoded).await?;
        Ok(())
    }

    /// Forget progress after an order is placed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::StorageUnavailable`] if the entry cannot be removed.
    pub async fn reset<S: CartStorage>(storage: &S) -> Result<(), CartError> {
        storage.remove(keys::CHECKOUT).await?;
        Ok(())
    }
}

/// Shipping address for the order request.
///
/// Expects a form that passed contact and shipping validation.
#[must_use]
pub fn shipping_info(form: &CheckoutForm) -> ShippingInfo {
    let phone = PhoneNumber::normalize(&form.phone)
        .map_or_else(|_| form.phone.trim().to_string(), |p| p.as_str().to_string());

    ShippingInfo {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        company: form.company.trim().to_string(),
        address_line1: form.address.trim().to_string(),
        address_line2: form.address2.trim().to_string(),
        city: form.city.trim().to_string(),
        state: form.province.trim().to_string(),
        postal_code: form.postal_code.trim().to_string(),
        country: SHIPPING_COUNTRY.to_string(),
        phone,
        email: form.email.trim().to_string(),
    }
}
