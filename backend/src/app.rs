// Application state shared by the HTTP handlers, the websocket endpoint and
// the background tasks.

use std::sync::Arc;

use viridis_core::palette::Palette;

use crate::engine::{Engine, EngineConfig};
use crate::hub::BroadcastHub;
use crate::store::SubmissionStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(
        config: EngineConfig,
        palette: Palette,
        store: Arc<dyn SubmissionStore>,
        now_ms: u64,
    ) -> Self {
        let engine = Engine::new(config, Arc::new(palette), store, BroadcastHub::new(), now_ms);
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn hub(&self) -> &BroadcastHub {
        self.engine.hub()
    }
}
