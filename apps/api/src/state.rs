use std::sync::Arc;

use crate::ai_gateway::AiGateway;
use crate::config::Config;
use crate::repository::Repository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Interview, question and CV storage. `PgRepository` in production.
    pub repo: Arc<dyn Repository>,
    /// Question generation, follow-ups, analysis and feedback.
    pub ai: Arc<dyn AiGateway>,
    pub config: Config,
}
