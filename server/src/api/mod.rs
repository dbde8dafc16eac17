pub mod rest;

use crate::config::Config;
use crate::storage::RootStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RootStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: RootStore, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }
}
