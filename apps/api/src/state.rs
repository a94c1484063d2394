use std::sync::Arc;

use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::config::Config;
use crate::entitlement::EntitlementGate;
use crate::history::HistoryList;
use crate::llm_client::CompletionClient;
use crate::storage::KvStore;
use crate::throttle::{RequestThrottle, ThrottleConfig};

/// Shared application state injected into all route handlers via Axum extractors.
/// The gate, throttle, and history all share one storage scope and one clock.
#[derive(Clone)]
pub struct AppState {
    pub gate: EntitlementGate,
    pub throttle: RequestThrottle,
    pub history: HistoryList,
    /// Pluggable completion backend. Default: `LlmClient`.
    pub llm: Arc<dyn CompletionClient>,
    /// One generation at a time; the throttle check and record must not interleave.
    pub generation_lock: Arc<Mutex<()>>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        let gate = EntitlementGate::new(store.clone(), clock.clone(), config.entitlement_validity);
        let throttle = RequestThrottle::new(
            store.clone(),
            clock.clone(),
            ThrottleConfig {
                max_requests: config.rate_limit_max_requests,
                window: config.rate_limit_window,
            },
        );
        let history = HistoryList::new(store, clock, config.history_max_entries);

        Self {
            gate,
            throttle,
            history,
            llm,
            generation_lock: Arc::new(Mutex::new(())),
            config,
        }
    }
}
