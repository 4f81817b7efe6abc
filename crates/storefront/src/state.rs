//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;

use crate::api::{ApiClient, ApiError};
use crate::cart::promo::PromoTableError;
use crate::cart::{CartEngine, PricingConfig, PromoTable};
use crate::checkout::InFlightSubmissions;
use crate::config::StorefrontConfig;
use crate::middleware::SessionStorage;
use crate::payment::{HostedTokenizer, TokenizationError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Api(#[from] ApiError),
    #[error("payment client: {0}")]
    Payment(#[from] TokenizationError),
    #[error("promo table: {0}")]
    PromoTable(#[from] PromoTableError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Every collaborator a handler needs is built
/// here at start-up, so a misconfigured server fails before it listens.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    tokenizer: HostedTokenizer,
    promos: Arc<PromoTable>,
    pricing: PricingConfig,
    in_flight: InFlightSubmissions,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the configured
    /// promo table cannot be loaded.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config.backend)?;
        let tokenizer = HostedTokenizer::new(&config.payment, config.backend.timeout)?;

        let promos = match &config.store.promo_table_path {
            Some(path) => {
                let table = PromoTable::load(path)?;
                tracing::info!(path = %path.display(), codes = table.len(), "Loaded promo table");
                table
            }
            None => PromoTable::default(),
        };
        let pricing = config.store.pricing();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                tokenizer,
                promos: Arc::new(promos),
                pricing,
                in_flight: InFlightSubmissions::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the payment tokenizer.
    #[must_use]
    pub fn tokenizer(&self) -> &HostedTokenizer {
        &self.inner.tokenizer
    }

    /// Get a reference to the in-flight submission guard.
    #[must_use]
    pub fn in_flight(&self) -> &InFlightSubmissions {
        &self.inner.in_flight
    }

    /// Cart engine over the shopper's session.
    #[must_use]
    pub fn cart(&self, session: Session) -> CartEngine<SessionStorage> {
        CartEngine::new(
            SessionStorage(session),
            Arc::clone(&self.inner.promos),
            self.inner.pricing,
        )
    }
}
