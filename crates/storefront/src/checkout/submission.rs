//! Order placement.
//!
//! ```text
//! permit -> cart check -> tokenize card -> create order -> clear cart
//! ```
//!
//! A failure at any stage leaves the cart and promo in place so the shopper
//! can retry. The permit is released on every exit path.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use gaojie_core::OrderNumber;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::api::{
    ApiClient, ApiError, BackendCredential, CreateOrderRequest, CreatedOrder, OrderLineItem,
    ShippingInfo,
};
use crate::cart::{CartEngine, CartStorage, ShippingMethod};
use crate::payment::{PaymentSelection, PaymentTokenizer, TokenizationError};

/// Order submission errors.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A submission for this checkout is already in flight.
    #[error("Your order is already being placed")]
    AlreadySubmitting,

    /// Nothing to order.
    #[error("Your cart is empty")]
    EmptyCart,

    /// The payment provider refused the card. The order endpoint was not called.
    #[error("Payment failed: {0}")]
    PaymentTokenization(#[from] TokenizationError),

    /// The backend did not accept the order.
    #[error("Order submission failed: {0}")]
    Submission(#[from] ApiError),
}

// =============================================================================
// OrderGateway
// =============================================================================

/// Where orders are sent.
pub trait OrderGateway: Send + Sync {
    /// Create an order.
    fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<CreatedOrder, ApiError>> + Send;
}

/// The backend order endpoint, on behalf of one shopper.
pub struct BackendOrders<'a> {
    api: &'a ApiClient,
    credential: Option<&'a BackendCredential>,
}

impl<'a> BackendOrders<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, credential: Option<&'a BackendCredential>) -> Self {
        Self { api, credential }
    }
}

impl OrderGateway for BackendOrders<'_> {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreatedOrder, ApiError> {
        self.api.create_order(request, self.credential).await
    }
}

// =============================================================================
// InFlightSubmissions
// =============================================================================

/// Checkouts with a submission in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightSubmissions(Arc<Mutex<HashSet<String>>>);

impl InFlightSubmissions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `key`. `None` while another permit for it is alive.
    #[must_use]
    pub fn try_acquire(&self, key: &str) -> Option<SubmissionPermit> {
        let inserted = self
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string());

        inserted.then(|| SubmissionPermit {
            in_flight: Arc::clone(&self.0),
            key: key.to_string(),
        })
    }

    /// Whether a submission for `key` is in flight.
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Marks a submission in flight. Dropping it releases the slot.
#[derive(Debug)]
pub struct SubmissionPermit {
    in_flight: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for SubmissionPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

// =============================================================================
// OrderSubmission
// =============================================================================

/// Everything the order needs beyond the cart.
#[derive(Debug)]
pub struct CheckoutDetails {
    pub shipping_info: ShippingInfo,
    pub shipping_method: ShippingMethod,
    pub payment: PaymentSelection,
    pub notes: String,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderConfirmation {
    pub order_number: OrderNumber,
    /// Confirmation page for the order.
    pub redirect: String,
}

impl OrderConfirmation {
    #[must_use]
    pub fn new(order_number: OrderNumber) -> Self {
        let encoded: String = url::form_urlencoded::byte_serialize(order_number.as_str().as_bytes())
            .collect();
        Self {
            redirect: format!("/order-confirmation?order={encoded}"),
            order_number,
        }
    }
}

/// Places orders.
pub struct OrderSubmission<'a, G, T> {
    gateway: &'a G,
    tokenizer: &'a T,
    in_flight: &'a InFlightSubmissions,
}

impl<'a, G: OrderGateway, T: PaymentTokenizer> OrderSubmission<'a, G, T> {
    pub const fn new(gateway: &'a G, tokenizer: &'a T, in_flight: &'a InFlightSubmissions) -> Self {
        Self {
            gateway,
            tokenizer,
            in_flight,
        }
    }

    /// Submit the cart as an order.
    ///
    /// `submission_key` identifies the shopper's checkout; a second call with
    /// the same key while one is running is refused.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::AlreadySubmitting`], [`OrderError::EmptyCart`],
    /// [`OrderError::PaymentTokenization`] (order endpoint not contacted), or
    /// [`OrderError::Submission`] (cart kept for retry).
    #[instrument(skip(self, engine, details), fields(method = details.payment.method().as_str()))]
    pub async fn submit<S: CartStorage>(
        &self,
        submission_key: &str,
        engine: &CartEngine<S>,
        details: CheckoutDetails,
    ) -> Result<OrderConfirmation, OrderError> {
        let _permit = self
            .in_flight
            .try_acquire(submission_key)
            .ok_or(OrderError::AlreadySubmitting)?;

        let snapshot = engine.snapshot_for(details.shipping_method).await;
        if snapshot.is_empty {
            return Err(OrderError::EmptyCart);
        }

        let payment_method = details.payment.method();
        let payment_token = match &details.payment {
            PaymentSelection::CreditCard(card) => {
                let token = self.tokenizer.tokenize(card).await.inspect_err(|e| {
                    tracing::warn!(error = %e, "Card tokenization failed, order not sent");
                })?;
                Some(token.0)
            }
            PaymentSelection::BankTransfer | PaymentSelection::CashOnDelivery => None,
        };

        let request = CreateOrderRequest {
            items: snapshot.lines.iter().map(OrderLineItem::from).collect(),
            shipping_info: details.shipping_info,
            shipping_method: details.shipping_method,
            payment_method,
            payment_token,
            promo_code: snapshot.promo.as_ref().map(|p| p.code.clone()),
            notes: details.notes.trim().to_string(),
            totals: snapshot.totals,
        };

        let created = self.gateway.create_order(&request).await.inspect_err(|e| {
            tracing::warn!(error = %e, "Order submission failed, cart kept");
        })?;

        if let Err(e) = engine.clear().await {
            tracing::error!(
                order_number = %created.order_number,
                error = %e,
                "Order placed but cart could not be cleared"
            );
        }

        tracing::info!(
            order_number = %created.order_number,
            total = %snapshot.totals.grand_total,
            "Order placed"
        );
        Ok(OrderConfirmation::new(created.order_number))
    }
}
