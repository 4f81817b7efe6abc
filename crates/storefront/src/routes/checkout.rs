//! Checkout route handlers.
//!
//! The stepper and the entered values live in the session. Card fields are
//! accepted in request bodies but never stored, so the payment step and the
//! final submit both carry them.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::{CartSnapshot, ShippingMethod};
use crate::checkout::stepper::StepProgress;
use crate::checkout::{
    BackendOrders, CheckoutDetails, CheckoutForm, CheckoutState, CheckoutStep, Field,
    OrderConfirmation, OrderSubmission, StepChange, StepRejected, shipping_info, validate_all,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalCredential, SessionStorage};
use crate::payment::PaymentSelection;
use crate::state::AppState;

/// Checkout page query.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    #[serde(default)]
    pub demo: bool,
}

/// Field values sent with a step transition or submit.
#[derive(Debug, Default, Deserialize)]
pub struct FieldsRequest {
    #[serde(default)]
    pub fields: BTreeMap<Field, String>,
}

/// Checkout page data.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub progress: Vec<StepProgress>,
    pub form: CheckoutForm,
    pub cart: CartSnapshot,
}

/// Step transition response.
#[derive(Debug, Serialize)]
pub struct StepResponse {
    #[serde(flatten)]
    pub change: StepChange,
    pub cart: CartSnapshot,
}

/// Order placed response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(flatten)]
    pub confirmation: OrderConfirmation,
}

fn method(form: &CheckoutForm) -> ShippingMethod {
    form.shipping_method().unwrap_or_default()
}

/// Snapshot for the checkout summary. An empty cart has nothing to check out.
async fn checkout_cart(state: &AppState, session: &Session, form: &CheckoutForm) -> Result<CartSnapshot> {
    let cart = state.cart(session.clone()).snapshot_for(method(form)).await;
    if cart.is_empty {
        return Err(AppError::Conflict("Your cart is empty".to_string()));
    }
    Ok(cart)
}

/// Checkout page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CheckoutQuery>,
) -> Result<Json<CheckoutView>> {
    let storage = SessionStorage(session.clone());
    let mut checkout = CheckoutState::load(&storage).await;
    let cart = checkout_cart(&state, &session, &checkout.form).await?;

    if query.demo && checkout.form.email.trim().is_empty() {
        checkout.form = CheckoutForm {
            shipping_method: checkout.form.shipping_method.clone(),
            payment_method: checkout.form.payment_method.clone(),
            notes: checkout.form.notes.clone(),
            ..CheckoutForm::demo()
        };
        tracing::debug!("Checkout prefilled with demo values");
    }
    checkout.save(&storage).await?;

    Ok(Json(CheckoutView {
        step: checkout.stepper.current(),
        progress: checkout.stepper.progress(),
        form: checkout.form,
        cart,
    }))
}

/// Merge field values without changing step. Recomputes totals for the
/// selected shipping method.
#[instrument(skip(state, session, fields))]
pub async fn update_form(
    State(state): State<AppState>,
    session: Session,
    Json(fields): Json<BTreeMap<Field, String>>,
) -> Result<Json<CheckoutView>> {
    let storage = SessionStorage(session.clone());
    let mut checkout = CheckoutState::load(&storage).await;
    checkout.form.merge(fields);
    checkout.save(&storage).await?;

    let cart = checkout_cart(&state, &session, &checkout.form).await?;
    Ok(Json(CheckoutView {
        step: checkout.stepper.current(),
        progress: checkout.stepper.progress(),
        form: checkout.form,
        cart,
    }))
}

/// Validate the current step and move forward.
#[instrument(skip(state, session, body))]
pub async fn advance(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<FieldsRequest>,
) -> Result<Json<StepResponse>> {
    let storage = SessionStorage(session.clone());
    let mut checkout = CheckoutState::load(&storage).await;
    let cart = checkout_cart(&state, &session, &checkout.form).await?;

    checkout.form.merge(body.fields);
    let result = checkout.stepper.advance(&checkout.form);
    // Entered values are kept even when the step is refused.
    checkout.save(&storage).await?;
    let change = result?;

    tracing::debug!(step = ?change.step, "Checkout advanced");
    Ok(Json(StepResponse { change, cart }))
}

/// Go back one step.
#[instrument(skip(state, session))]
pub async fn retreat(State(state): State<AppState>, session: Session) -> Result<Json<StepResponse>> {
    let storage = SessionStorage(session.clone());
    let mut checkout = CheckoutState::load(&storage).await;
    let change = checkout.stepper.retreat();
    checkout.save(&storage).await?;

    let cart = state
        .cart(session)
        .snapshot_for(method(&checkout.form))
        .await;
    Ok(Json(StepResponse { change, cart }))
}

/// Jump back to a completed step.
#[instrument(skip(state, session))]
pub async fn go_to(
    State(state): State<AppState>,
    session: Session,
    Path(segment): Path<String>,
) -> Result<Json<StepResponse>> {
    let step = CheckoutStep::from_segment(&segment)
        .ok_or_else(|| AppError::NotFound(format!("Unknown checkout step: {segment}")))?;

    let storage = SessionStorage(session.clone());
    let mut checkout = CheckoutState::load(&storage).await;
    let change = checkout.stepper.go_to(step)?;
    checkout.save(&storage).await?;

    let cart = state
        .cart(session)
        .snapshot_for(method(&checkout.form))
        .await;
    Ok(Json(StepResponse { change, cart }))
}

/// Place the order.
///
/// Accepted from any step once every step's fields validate.
#[instrument(skip(state, session, credential, body))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalCredential(credential): OptionalCredential,
    Json(body): Json<FieldsRequest>,
) -> Result<Json<SubmitResponse>> {
    let storage = SessionStorage(session.clone());
    let mut checkout = CheckoutState::load(&storage).await;
    checkout.form.merge(body.fields);

    validate_all(&checkout.form)?;
    let payment = PaymentSelection::from_form(&checkout.form).map_err(|errors| {
        StepRejected::InvalidFields {
            step: CheckoutStep::Payment,
            errors,
        }
    })?;

    let details = CheckoutDetails {
        shipping_info: shipping_info(&checkout.form),
        shipping_method: method(&checkout.form),
        payment,
        notes: checkout.form.notes.clone(),
    };

    // Concurrent requests of one session only share the cookie id; session
    // writes from one are not visible to the other until its response ends.
    let key = session
        .id()
        .map_or_else(|| checkout.submission_key.clone(), |id| id.to_string());

    let engine = state.cart(session);
    let gateway = BackendOrders::new(state.api(), credential.as_ref());
    let confirmation = OrderSubmission::new(&gateway, state.tokenizer(), state.in_flight())
        .submit(&key, &engine, details)
        .await?;

    if let Err(e) = CheckoutState::reset(&storage).await {
        tracing::warn!(error = %e, "Checkout progress could not be reset");
    }

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", confirmation.order_number.as_str())]),
    );
    Ok(Json(SubmitResponse {
        status: "success",
        message: "Order placed successfully",
        confirmation,
    }))
}
