use std::sync::Arc;

use crate::config::Config;
use crate::layout::DocumentSettings;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Everything here is read-only. Per-request layout state (cursor, fence buffer,
/// font capability) is created inside the handler and never stored here.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Page geometry, pagination thresholds and fixed document labels.
    pub settings: Arc<DocumentSettings>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let settings = DocumentSettings::from_config(&config);
        AppState {
            config,
            settings: Arc::new(settings),
        }
    }
}
