//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors, added by the binary)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. `Cache-Control: no-store`
//! 5. Session layer (tower-sessions with in-memory store)
//!
//! Auth extractors ([`RequireCredential`], [`OptionalCredential`]) are applied
//! per handler.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalCredential, RequireCredential, clear_backend_credential, set_backend_credential,
};
pub use request_id::request_id_middleware;
pub use session::{SessionStorage, create_session_layer};
