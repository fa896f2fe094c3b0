use std::sync::Arc;

use kubegate_application::{
    ClusterClient, CommandGatewayService, HealthService, RateLimitService, TranslationService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway_service: CommandGatewayService,
    pub health_service: Arc<HealthService>,
    pub rate_limit_service: RateLimitService,
    pub translation_service: TranslationService,
    pub cluster_client: Arc<dyn ClusterClient>,
    pub cluster_name: String,
}
