//! Debounced search.
//!
//! Interactive search fires on every keystroke. [`SearchDebouncer`] waits for a
//! quiet window before querying and lets only the latest term deliver a
//! result: starting a search cancels the token of the previous one. A search
//! that is already talking to the store runs to completion, but its result is
//! discarded if it has been superseded in the meantime.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::StoreConfig;
use crate::gateway::{QueryResult, ReadGateway};
use crate::store::ProductStore;

/// Default quiet window before a search runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What a debounced search produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The search ran and was still the latest when it finished.
    Completed(QueryResult),
    /// A newer search started first; there is no result.
    Superseded,
}

impl SearchOutcome {
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }

    #[must_use]
    pub fn into_result(self) -> Option<QueryResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Superseded => None,
        }
    }
}

/// Latest-wins wrapper around [`ReadGateway::search_query`].
#[derive(Debug)]
pub struct SearchDebouncer<S> {
    gateway: Arc<ReadGateway<S>>,
    window: Duration,
    latest: Mutex<Option<CancellationToken>>,
}

impl<S: ProductStore> SearchDebouncer<S> {
    #[must_use]
    pub const fn new(gateway: Arc<ReadGateway<S>>, window: Duration) -> Self {
        Self {
            gateway,
            window,
            latest: Mutex::new(None),
        }
    }

    /// Debouncer using the configured `search_debounce` window.
    #[must_use]
    pub const fn from_config(gateway: Arc<ReadGateway<S>>, config: &StoreConfig) -> Self {
        Self::new(gateway, config.search_debounce)
    }

    /// Quiet window in use.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Search for `term` once the window passes without a newer call.
    pub async fn search(&self, term: &str, limit: usize) -> SearchOutcome {
        let token = self.supersede_previous();

        tokio::select! {
            () = tokio::time::sleep(self.window) => {}
            () = token.cancelled() => {
                debug!(term, "Search superseded before it started");
                return SearchOutcome::Superseded;
            }
        }

        let result = self.gateway.search_query(term, limit).await;
        if token.is_cancelled() {
            debug!(term, "Discarding stale search result");
            return SearchOutcome::Superseded;
        }
        SearchOutcome::Completed(result)
    }

    /// Cancel any pending search without starting a new one.
    pub fn cancel(&self) {
        if let Some(token) = self.lock_latest().take() {
            token.cancel();
        }
    }

    fn supersede_previous(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.lock_latest().replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    fn lock_latest(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.latest
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
