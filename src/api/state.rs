use std::sync::Arc;

use crate::domain::{ChatProvider, GatewaySettings};

/// Shared application state: read-only settings and the upstream provider.
///
/// Requests are handled independently; nothing here is mutated after startup,
/// so concurrent handlers need no locking.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<GatewaySettings>,
    pub provider: Arc<dyn ChatProvider>,
}

impl AppState {
    pub fn new(settings: Arc<GatewaySettings>, provider: Arc<dyn ChatProvider>) -> Self {
        Self { settings, provider }
    }
}
