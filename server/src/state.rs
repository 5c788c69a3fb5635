// grocer_server/src/state.rs
use crate::config::AppConfig;
use grocer::Engine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub engine: Engine,
  pub config: Arc<AppConfig>,
}

impl AppState {
  pub fn new(engine: Engine, config: AppConfig) -> Self {
    Self {
      engine,
      config: Arc::new(config),
    }
  }
}
