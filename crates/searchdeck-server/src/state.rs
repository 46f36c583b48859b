use std::sync::Arc;

use searchdeck_core::analytics::{IntentClassifier, SearchAnalyticsSource};
use searchdeck_core::config::Config;
use searchdeck_core::report::ReportStore;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// The store and upstream clients sit behind trait objects so integration
/// tests can swap in in-memory fakes without touching the handlers.
pub struct AppState {
    pub store: Arc<dyn ReportStore>,

    /// Query-stats fetch client, one call per resolved time range.
    pub search: Arc<dyn SearchAnalyticsSource>,

    /// Batched intent classification client.
    pub intents: Arc<dyn IntentClassifier>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ReportStore>,
        search: Arc<dyn SearchAnalyticsSource>,
        intents: Arc<dyn IntentClassifier>,
        config: Config,
    ) -> Self {
        Self {
            store,
            search,
            intents,
            config: Arc::new(config),
        }
    }
}
