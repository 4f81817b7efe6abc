//! Checkout form fields and validation rules.

use std::collections::BTreeMap;
use std::fmt;

use gaojie_core::{
    CardExpiry, Email, PaymentMethod, PhoneNumber, card_number_digits, format_card_number,
    format_expiry, restrict_cvv, validate_cvv,
};
use serde::{Deserialize, Serialize};

use crate::cart::ShippingMethod;

pub const REQUIRED: &str = "This field is required";
pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const INVALID_PHONE: &str = "Please enter a valid phone number";
pub const INVALID_CARD_NUMBER: &str = "Please enter a valid card number";
pub const INVALID_EXPIRY: &str = "Please enter a valid expiry date (MM/YY)";
pub const INVALID_CVV: &str = "Please enter a valid security code";
pub const INVALID_PAYMENT_METHOD: &str = "Please select a payment method";
pub const INVALID_SHIPPING_METHOD: &str = "Please select a shipping method";

/// A checkout form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Phone,
    FirstName,
    LastName,
    Company,
    Address,
    Address2,
    City,
    Province,
    PostalCode,
    ShippingMethod,
    PaymentMethod,
    CardName,
    CardNumber,
    CardExpiry,
    CardCvv,
    Notes,
}

impl Field {
    /// Card fields are never persisted.
    #[must_use]
    pub const fn is_card_field(self) -> bool {
        matches!(
            self,
            Self::CardName | Self::CardNumber | Self::CardExpiry | Self::CardCvv
        )
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// Record a message for a field. The first message for a field wins.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for a field.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge another set of messages.
    pub fn extend(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }

    /// `Ok(())` when empty.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {message}", field_name(*field))?;
        }
        Ok(())
    }
}

fn field_name(field: Field) -> String {
    serde_json::to_value(field)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

/// Values the shopper has entered.
///
/// Card fields are accepted on input but skipped when the form is persisted.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address: String,
    pub address2: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub shipping_method: String,
    pub payment_method: String,
    #[serde(skip_serializing)]
    pub card_name: String,
    #[serde(skip_serializing)]
    pub card_number: String,
    #[serde(skip_serializing)]
    pub card_expiry: String,
    #[serde(skip_serializing)]
    pub card_cvv: String,
    pub notes: String,
}

impl fmt::Debug for CheckoutForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("city", &self.city)
            .field("shipping_method", &self.shipping_method)
            .field("payment_method", &self.payment_method)
            .field("card_number", &"[REDACTED]")
            .field("card_cvv", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl CheckoutForm {
    /// Demo values used when the checkout is opened with `?demo=true`.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            email: "demo@example.com".to_string(),
            phone: "+66 12 345 6789".to_string(),
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            address: "123 Demo Street".to_string(),
            city: "Bangkok".to_string(),
            province: "bangkok".to_string(),
            postal_code: "10110".to_string(),
            ..Self::default()
        }
    }

    /// Current value of a field.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Company => &self.company,
            Field::Address => &self.address,
            Field::Address2 => &self.address2,
            Field::City => &self.city,
            Field::Province => &self.province,
            Field::PostalCode => &self.postal_code,
            Field::ShippingMethod => &self.shipping_method,
            Field::PaymentMethod => &self.payment_method,
            Field::CardName => &self.card_name,
            Field::CardNumber => &self.card_number,
            Field::CardExpiry => &self.card_expiry,
            Field::CardCvv => &self.card_cvv,
            Field::Notes => &self.notes,
        }
    }

    /// Set a field, applying the input formatting the form does as the shopper types.
    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Company => &mut self.company,
            Field::Address => &mut self.address,
            Field::Address2 => &mut self.address2,
            Field::City => &mut self.city,
            Field::Province => &mut self.province,
            Field::PostalCode => &mut self.postal_code,
            Field::ShippingMethod => &mut self.shipping_method,
            Field::PaymentMethod => &mut self.payment_method,
            Field::CardName => &mut self.card_name,
            Field::CardNumber => {
                self.card_number = format_card_number(&value);
                return;
            }
            Field::CardExpiry => {
                self.card_expiry = format_expiry(&value);
                return;
            }
            Field::CardCvv => {
                self.card_cvv = restrict_cvv(&value);
                return;
            }
            Field::Notes => &mut self.notes,
        };
        *slot = value;
    }

    /// Merge submitted values into the form.
    pub fn merge(&mut self, values: BTreeMap<Field, String>) {
        for (field, value) in values {
            self.set(field, value);
        }
    }

    /// Copy of the form without card data.
    #[must_use]
    pub fn without_card_details(&self) -> Self {
        Self {
            card_name: String::new(),
            card_number: String::new(),
            card_expiry: String::new(),
            card_cvv: String::new(),
            ..self.clone()
        }
    }

    /// Selected shipping method (`standard` when unset).
    #[must_use]
    pub fn shipping_method(&self) -> Option<ShippingMethod> {
        ShippingMethod::from_form(&self.shipping_method)
    }

    /// Selected payment method (`credit_card` when unset).
    #[must_use]
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        if self.payment_method.trim().is_empty() {
            Some(PaymentMethod::default())
        } else {
            PaymentMethod::from_form(&self.payment_method)
        }
    }
}

fn require(form: &CheckoutForm, field: Field, errors: &mut FieldErrors) -> bool {
    if form.get(field).trim().is_empty() {
        errors.add(field, REQUIRED);
        false
    } else {
        true
    }
}

/// Validate the contact step.
pub fn validate_contact(form: &CheckoutForm) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if require(form, Field::Email, &mut errors) && Email::parse(form.email.trim()).is_err() {
        errors.add(Field::Email, INVALID_EMAIL);
    }
    if require(form, Field::Phone, &mut errors) && PhoneNumber::normalize(&form.phone).is_err() {
        errors.add(Field::Phone, INVALID_PHONE);
    }

    errors
}

/// Validate the shipping step.
pub fn validate_shipping(form: &CheckoutForm) -> FieldErrors {
    let mut errors = FieldErrors::default();

    for field in [
        Field::FirstName,
        Field::LastName,
        Field::Address,
        Field::City,
        Field::Province,
        Field::PostalCode,
    ] {
        require(form, field, &mut errors);
    }
    if form.shipping_method().is_none() {
        errors.add(Field::ShippingMethod, INVALID_SHIPPING_METHOD);
    }

    errors
}

/// Validate the payment step.
pub fn validate_payment(form: &CheckoutForm) -> FieldErrors {
    let mut errors = FieldErrors::default();

    let Some(method) = form.payment_method() else {
        errors.add(Field::PaymentMethod, INVALID_PAYMENT_METHOD);
        return errors;
    };
    if !method.requires_card() {
        return errors;
    }

    require(form, Field::CardName, &mut errors);
    if require(form, Field::CardNumber, &mut errors) && card_number_digits(&form.card_number).is_err()
    {
        errors.add(Field::CardNumber, INVALID_CARD_NUMBER);
    }
    if require(form, Field::CardExpiry, &mut errors) && CardExpiry::parse(&form.card_expiry).is_err()
    {
        errors.add(Field::CardExpiry, INVALID_EXPIRY);
    }
    if require(form, Field::CardCvv, &mut errors) && validate_cvv(&form.card_cvv).is_err() {
        errors.add(Field::CardCvv, INVALID_CVV);
    }

    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card_form() -> CheckoutForm {
        let mut form = CheckoutForm::demo();
        form.payment_method = "credit_card".to_string();
        form.set(Field::CardName, "Demo User".to_string());
        form.set(Field::CardNumber, "4242424242424242".to_string());
        form.set(Field::CardExpiry, "1229".to_string());
        form.set(Field::CardCvv, "123".to_string());
        form
    }

    #[test]
    fn test_demo_form_passes_contact_and_shipping() {
        let form = CheckoutForm::demo();
        assert!(validate_contact(&form).is_empty());
        assert!(validate_shipping(&form).is_empty());
    }

    #[test]
    fn test_required_fields() {
        let form = CheckoutForm::default();
        let errors = validate_contact(&form);
        assert_eq!(errors.get(Field::Email), Some(REQUIRED));
        assert_eq!(errors.get(Field::Phone), Some(REQUIRED));

        let errors = validate_shipping(&form);
        assert_eq!(errors.len(), 6);
        assert_eq!(errors.get(Field::Company), None);
        assert_eq!(errors.get(Field::Address2), None);
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let mut form = CheckoutForm::demo();
        form.city = "   ".to_string();
        assert_eq!(validate_shipping(&form).get(Field::City), Some(REQUIRED));
    }

    #[test]
    fn test_invalid_email_message() {
        let mut form = CheckoutForm::demo();
        form.email = "demo@example".to_string();
        assert_eq!(validate_contact(&form).get(Field::Email), Some(INVALID_EMAIL));

        form.email = " demo@example.com ".to_string();
        assert!(validate_contact(&form).is_empty());
    }

    #[test]
    fn test_invalid_phone_message() {
        let mut form = CheckoutForm::demo();
        form.phone = "12".to_string();
        assert_eq!(validate_contact(&form).get(Field::Phone), Some(INVALID_PHONE));
    }

    #[test]
    fn test_card_fields_formatted_on_set() {
        let form = card_form();
        assert_eq!(form.card_number, "4242 4242 4242 4242");
        assert_eq!(form.card_expiry, "12/29");
        assert!(validate_payment(&form).is_empty());
    }

    #[test]
    fn test_card_validation_messages() {
        let mut form = card_form();
        form.set(Field::CardNumber, "4242".to_string());
        form.set(Field::CardExpiry, "1329".to_string());
        form.set(Field::CardCvv, "1".to_string());
        form.card_name = String::new();

        let errors = validate_payment(&form);
        assert_eq!(errors.get(Field::CardName), Some(REQUIRED));
        assert_eq!(errors.get(Field::CardNumber), Some(INVALID_CARD_NUMBER));
        assert_eq!(errors.get(Field::CardExpiry), Some(INVALID_EXPIRY));
        assert_eq!(errors.get(Field::CardCvv), Some(INVALID_CVV));
    }

    #[test]
    fn test_non_card_payment_skips_card_fields() {
        let mut form = CheckoutForm::demo();
        form.payment_method = "bank_transfer".to_string();
        assert!(validate_payment(&form).is_empty());

        form.payment_method = "barter".to_string();
        assert_eq!(
            validate_payment(&form).get(Field::PaymentMethod),
            Some(INVALID_PAYMENT_METHOD)
        );
    }

    #[test]
    fn test_card_fields_not_serialized() {
        let form = card_form();
        let json = serde_json::to_string(&form).unwrap();
        assert!(!json.contains("4242"));
        assert!(!json.contains("card_cvv"));
        assert!(!format!("{form:?}").contains("4242"));
    }

    #[test]
    fn test_merge_and_errors_serialize_by_name() {
        let mut form = CheckoutForm::default();
        let values: BTreeMap<Field, String> =
            serde_json::from_str(r#"{"first_name": "Ann", "postal_code": "10110"}"#).unwrap();
        form.merge(values);
        assert_eq!(form.first_name, "Ann");

        let errors = validate_shipping(&form);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["last_name"], REQUIRED);
        assert!(errors.to_string().contains("last_name: This field is required"));
    }
}
