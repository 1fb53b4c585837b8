use std::sync::Arc;

use crate::config;
use crate::db::ProgressStore;
use crate::i18n::Localizer;
use crate::progression::ProgressionEngine;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProgressStore>,
    pub engine: Arc<ProgressionEngine>,
    pub env: Arc<config::Config>,
    pub localizer: Arc<Localizer>,
}

impl AppState {
    pub fn new(engine: ProgressionEngine, env: config::Config, localizer: Localizer) -> Self {
        Self {
            store: engine.store(),
            engine: Arc::new(engine),
            env: Arc::new(env),
            localizer: Arc::new(localizer),
        }
    }
}
