use axum::extract::FromRef;

use crate::generator::DerivativeGenerator;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedGenerator = Arc<DerivativeGenerator>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub generator: GuardedGenerator,
}

impl ServerState {
    pub fn new(config: ServerConfig, generator: GuardedGenerator) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            generator,
        }
    }
}

impl FromRef<ServerState> for GuardedGenerator {
    fn from_ref(input: &ServerState) -> Self {
        input.generator.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
