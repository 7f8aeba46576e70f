//! Application state shared across handlers

use std::sync::Arc;

use crate::database::Store;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
