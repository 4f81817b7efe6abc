//! Card tokenization through the payment provider.
//!
//! Raw card data only ever goes to the provider's token endpoint. The order
//! backend receives the opaque token id.

use std::future::Future;
use std::time::Duration;

use gaojie_core::{CardExpiry, PaymentMethod, card_number_digits};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::checkout::fields::{CheckoutForm, FieldErrors, validate_payment};
use crate::config::PaymentConfig;

/// Errors from the payment provider.
#[derive(Debug, Error)]
pub enum TokenizationError {
    /// HTTP request failed.
    #[error("Payment provider unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider refused the card.
    #[error("{0}")]
    Declined(String),

    /// Unexpected response body.
    #[error("Unexpected payment provider response: {0}")]
    Parse(String),
}

impl TokenizationError {
    /// Message safe to show the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Declined(message) => message.clone(),
            Self::Http(_) | Self::Parse(_) => {
                "Payment could not be processed. Please try again.".to_string()
            }
        }
    }
}

/// Card fields for tokenization.
///
/// Number and security code are secrets and never appear in `Debug` output.
pub struct CardDetails {
    pub holder: String,
    pub number: SecretString,
    pub expiry: CardExpiry,
    pub cvv: SecretString,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("holder", &self.holder)
            .field("number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// How the shopper pays.
#[derive(Debug)]
pub enum PaymentSelection {
    CreditCard(CardDetails),
    BankTransfer,
    CashOnDelivery,
}

impl PaymentSelection {
    /// Build from the payment step of the form.
    ///
    /// # Errors
    ///
    /// Returns the payment step's field errors.
    pub fn from_form(form: &CheckoutForm) -> Result<Self, FieldErrors> {
        validate_payment(form).into_result()?;

        match form.payment_method().unwrap_or_default() {
            PaymentMethod::BankTransfer => Ok(Self::BankTransfer),
            PaymentMethod::CashOnDelivery => Ok(Self::CashOnDelivery),
            PaymentMethod::CreditCard => {
                let (Ok(number), Ok(expiry)) = (
                    card_number_digits(&form.card_number),
                    CardExpiry::parse(&form.card_expiry),
                ) else {
                    return Err(validate_payment(form));
                };
                Ok(Self::CreditCard(CardDetails {
                    holder: form.card_name.trim().to_string(),
                    number: SecretString::from(number),
                    expiry,
                    cvv: SecretString::from(form.card_cvv.trim().to_string()),
                }))
            }
        }
    }

    /// Wire value of the method.
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        match self {
            Self::CreditCard(_) => PaymentMethod::CreditCard,
            Self::BankTransfer => PaymentMethod::BankTransfer,
            Self::CashOnDelivery => PaymentMethod::CashOnDelivery,
        }
    }
}

/// Opaque token returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentToken(pub String);

impl PaymentToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Exchanges card details for a payment token.
pub trait PaymentTokenizer: Send + Sync {
    /// Tokenize a card.
    fn tokenize(
        &self,
        card: &CardDetails,
    ) -> impl Future<Output = Result<PaymentToken, TokenizationError>> + Send;
}

/// Provider response: a token object or an error object.
#[derive(Deserialize)]
struct TokenResponse {
    object: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Hosted token endpoint authenticated with the public key.
#[derive(Clone)]
pub struct HostedTokenizer {
    client: reqwest::Client,
    token_url: Url,
    public_key: SecretString,
}

impl HostedTokenizer {
    /// Create a tokenizer.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig, timeout: Duration) -> Result<Self, TokenizationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            public_key: config.public_key.clone(),
        })
    }
}

impl PaymentTokenizer for HostedTokenizer {
    #[instrument(skip(self, card), fields(expiry = %card.expiry))]
    async fn tokenize(&self, card: &CardDetails) -> Result<PaymentToken, TokenizationError> {
        let month = card.expiry.month.to_string();
        let year = card.expiry.full_year().to_string();
        let form = [
            ("card[name]", card.holder.as_str()),
            ("card[number]", card.number.expose_secret()),
            ("card[expiration_month]", month.as_str()),
            ("card[expiration_year]", year.as_str()),
            ("card[security_code]", card.cvv.expose_secret()),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .basic_auth(self.public_key.expose_secret(), Some(""))
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                status = %status,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse payment provider response"
            );
            TokenizationError::Parse(e.to_string())
        })?;

        match (parsed.object.as_str(), parsed.id) {
            ("token", Some(id)) if status.is_success() => {
                tracing::info!("Card tokenized");
                Ok(PaymentToken(id))
            }
            _ => {
                let message = parsed
                    .message
                    .unwrap_or_else(|| format!("Card was declined (HTTP {status})"));
                tracing::warn!(status = %status, message = %message, "Card tokenization refused");
                Err(TokenizationError::Declined(message))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::fields::{Field, INVALID_CVV};

    fn card_form() -> CheckoutForm {
        let mut form = CheckoutForm::demo();
        form.payment_method = "credit_card".to_string();
        form.set(Field::CardName, " Demo User ".to_string());
        form.set(Field::CardNumber, "4242 4242 4242 4242".to_string());
        form.set(Field::CardExpiry, "07/29".to_string());
        form.set(Field::CardCvv, "321".to_string());
        form
    }

    #[test]
    fn test_card_selection_from_form() {
        let selection = PaymentSelection::from_form(&card_form()).unwrap();
        let PaymentSelection::CreditCard(card) = &selection else {
            panic!("expected card payment");
        };
        assert_eq!(card.holder, "Demo User");
        assert_eq!(card.number.expose_secret(), "4242424242424242");
        assert_eq!(card.expiry, CardExpiry { month: 7, year: 29 });
        assert_eq!(selection.method(), PaymentMethod::CreditCard);
    }

    #[test]
    fn test_card_details_debug_is_redacted() {
        let selection = PaymentSelection::from_form(&card_form()).unwrap();
        let debug = format!("{selection:?}");
        assert!(!debug.contains("4242"));
        assert!(!debug.contains("321"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_invalid_card_rejected() {
        let mut form = card_form();
        form.set(Field::CardCvv, "9".to_string());
        let errors = PaymentSelection::from_form(&form).unwrap_err();
        assert_eq!(errors.get(Field::CardCvv), Some(INVALID_CVV));
    }

    #[test]
    fn test_non_card_selection() {
        let mut form = CheckoutForm::demo();
        form.payment_method = "bank_transfer".to_string();
        let selection = PaymentSelection::from_form(&form).unwrap();
        assert_eq!(selection.method(), PaymentMethod::BankTransfer);
    }

    #[test]
    fn test_declined_message_shown_to_shopper() {
        let err = TokenizationError::Declined("brand not supported".to_string());
        assert_eq!(err.user_message(), "brand not supported");
        let err = TokenizationError::Parse("eof".to_string());
        assert!(err.user_message().contains("try again"));
    }
}
