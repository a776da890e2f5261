//! Shared application state.

use std::sync::Arc;

use crate::service::CareerAgentService;

/// State shared across all request handlers. Cloning is cheap; the service
/// itself is behind an [`Arc`].
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CareerAgentService>,
}

impl AppState {
    pub fn new(service: Arc<CareerAgentService>) -> Self {
        Self { service }
    }
}
