//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::db::Store;
use crate::services::auth::TokenKeys;
use crate::services::checkout::CheckoutService;
use crate::services::payment::PaymentProcessor;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, token keys and checkout service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    tokens: TokenKeys,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Store adapter (`PostgreSQL` or in-memory)
    /// * `tokens` - Keys used to verify bearer tokens
    /// * `payments` - Processor charged at checkout
    /// * `payment_timeout` - Upper bound on one payment attempt
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenKeys,
        payments: Arc<dyn PaymentProcessor>,
        payment_timeout: Duration,
    ) -> Self {
        let checkout = CheckoutService::new(Arc::clone(&store), payments, payment_timeout);
        Self {
            inner: Arc::new(AppStateInner {
                store,
                tokens,
                checkout,
            }),
        }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
