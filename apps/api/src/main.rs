//! Kubegate API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use kubegate_application::{
    ClusterClient, CommandGatewayService, ExecutionDispatcher, HealthService, PermissionAuthority,
    RateLimitRule, RateLimitService, TranslationService,
};
use kubegate_core::AppError;
use kubegate_infrastructure::{
    InMemoryRateLimitRepository, KubeApiConfig, KubeHttpClient, OllamaConfig, OllamaTranslator,
    TracingAuditSink,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let kube_api_url = required_env("KUBE_API_URL")?;
    let kube_api_token = env::var("KUBE_API_TOKEN").ok().filter(|value| !value.is_empty());
    let kube_timeout_seconds = parse_env_or("KUBE_API_TIMEOUT_SECONDS", 15_u64)?;
    let kube_accept_invalid_certs = env::var("KUBE_INSECURE_SKIP_TLS_VERIFY")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let cluster_name = env::var("CLUSTER_NAME").unwrap_or_else(|_| "dev-cluster".to_owned());
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = parse_env_or("API_PORT", 8080_u16)?;

    let ollama_url =
        env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_owned());
    let ollama_model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3".to_owned());
    let ollama_timeout_seconds = parse_env_or("OLLAMA_TIMEOUT_SECONDS", 120_u64)?;

    let rate_limit_rule = RateLimitRule {
        max_admissions: parse_env_or("RATE_LIMIT_MAX", 10_u32)?,
        window_seconds: parse_env_or("RATE_LIMIT_WINDOW_SECONDS", 60_i64)?,
    };
    let health_cache_ttl_seconds = parse_env_or("HEALTH_CACHE_TTL_SECONDS", 30_i64)?;

    let kube_client = Arc::new(KubeHttpClient::new(KubeApiConfig {
        base_url: kube_api_url,
        bearer_token: kube_api_token,
        timeout_seconds: kube_timeout_seconds,
        accept_invalid_certs: kube_accept_invalid_certs,
    })?);
    let cluster_client: Arc<dyn ClusterClient> = kube_client.clone();
    let permission_authority: Arc<dyn PermissionAuthority> = kube_client;

    let gateway_service = CommandGatewayService::new(
        permission_authority,
        ExecutionDispatcher::new(cluster_client.clone()),
        Arc::new(TracingAuditSink::new()),
        cluster_name.clone(),
    );

    let health_service = Arc::new(HealthService::new(
        cluster_client.clone(),
        cluster_name.clone(),
        health_cache_ttl_seconds,
    ));

    let rate_limit_service = RateLimitService::new(
        Arc::new(InMemoryRateLimitRepository::new()),
        rate_limit_rule,
    );

    let translation_service = TranslationService::new(Arc::new(OllamaTranslator::new(
        OllamaConfig {
            base_url: ollama_url,
            model: ollama_model,
            timeout_seconds: ollama_timeout_seconds,
        },
    )?));

    let app_state = AppState {
        gateway_service,
        health_service,
        rate_limit_service: rate_limit_service.clone(),
        translation_service,
        cluster_client,
        cluster_name,
    };

    spawn_rate_limit_sweeper(rate_limit_service);

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-user-id")]);

    let app = build_router(app_state).layer(cors_layer);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "kubegate-api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

/// Assembles the route tree and middleware stack.
///
/// Every `/api/v1` route consumes the caller's admission budget; only the
/// root liveness probe is exempt.
fn build_router(app_state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/v1/execute",
            post(handlers::commands::execute_command_handler),
        )
        .route(
            "/api/v1/dry-run",
            post(handlers::commands::dry_run_command_handler),
        )
        .route(
            "/api/v1/translate",
            post(handlers::translate::translate_handler),
        )
        .route(
            "/api/v1/cluster-health",
            get(handlers::cluster::cluster_health_handler),
        )
        .route("/api/v1/context", get(handlers::cluster::context_handler))
        .route("/api/v1/insights", get(handlers::cluster::insights_handler))
        .route_layer(from_fn_with_state(app_state.clone(), middleware::rate_limit));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(api_routes)
        .layer(from_fn(middleware::resolve_caller_identity))
        .layer(from_fn(middleware::attach_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Evicts idle rate-limit identities once per window.
fn spawn_rate_limit_sweeper(service: RateLimitService) {
    let period = Duration::from_secs(u64::try_from(service.window_seconds()).unwrap_or(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match service.sweep().await {
                Ok(evicted) if evicted > 0 => {
                    debug!(evicted, "rate limiter swept idle identities");
                }
                Ok(_) => {}
                Err(sweep_error) => {
                    error!(error = %sweep_error, "rate limiter sweep failed");
                }
            }
        }
    });
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_or<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Validation(format!("invalid {name}: '{value}'"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::connect_info::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use kubegate_application::{
        AccessDecision, AccessRequest, ClusterClient, CommandGatewayService, CommandTranslator,
        ExecutionDispatcher, HealthService, PermissionAuthority, RateLimitRule, RateLimitService,
        TranslationService,
    };
    use kubegate_core::{AppError, AppResult};
    use kubegate_domain::{ConfigMapSummary, DeploymentSummary, NodeSummary, PodSummary};
    use kubegate_infrastructure::{InMemoryRateLimitRepository, TracingAuditSink};
    use tower::ServiceExt;

    use super::build_router;
    use crate::state::AppState;

    struct FakeClusterClient;

    #[async_trait]
    impl ClusterClient for FakeClusterClient {
        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }

        async fn list_pods(&self, _namespace: Option<&str>) -> AppResult<Vec<PodSummary>> {
            Ok(Vec::new())
        }

        async fn get_pod(&self, _namespace: &str, name: &str) -> AppResult<PodSummary> {
            Err(AppError::NotFound(format!("pod '{name}' not found")))
        }

        async fn list_config_maps(
            &self,
            _namespace: Option<&str>,
        ) -> AppResult<Vec<ConfigMapSummary>> {
            Ok(Vec::new())
        }

        async fn list_nodes(&self) -> AppResult<Vec<NodeSummary>> {
            Ok(Vec::new())
        }

        async fn list_namespaces(&self) -> AppResult<Vec<String>> {
            Ok(vec!["default".to_owned()])
        }

        async fn get_deployment(
            &self,
            _namespace: &str,
            name: &str,
        ) -> AppResult<DeploymentSummary> {
            Err(AppError::NotFound(format!("deployment '{name}' not found")))
        }

        async fn pod_logs(&self, _namespace: &str, _name: &str) -> AppResult<String> {
            Ok(String::new())
        }

        async fn scale_deployment(
            &self,
            _namespace: &str,
            _name: &str,
            _replicas: u32,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    struct FakeAuthority;

    #[async_trait]
    impl PermissionAuthority for FakeAuthority {
        async fn check(&self, _request: &AccessRequest) -> AppResult<AccessDecision> {
            Ok(AccessDecision {
                allowed: true,
                reason: String::new(),
            })
        }
    }

    struct FakeTranslator;

    #[async_trait]
    impl CommandTranslator for FakeTranslator {
        async fn translate(&self, _query: &str) -> AppResult<String> {
            Ok("kubectl get pods".to_owned())
        }
    }

    fn app_state(max_admissions: u32) -> AppState {
        let cluster: Arc<dyn ClusterClient> = Arc::new(FakeClusterClient);
        AppState {
            gateway_service: CommandGatewayService::new(
                Arc::new(FakeAuthority),
                ExecutionDispatcher::new(cluster.clone()),
                Arc::new(TracingAuditSink::new()),
                "dev-cluster",
            ),
            health_service: Arc::new(HealthService::new(cluster.clone(), "dev-cluster", 30)),
            rate_limit_service: RateLimitService::new(
                Arc::new(InMemoryRateLimitRepository::new()),
                RateLimitRule {
                    max_admissions,
                    window_seconds: 60,
                },
            ),
            translation_service: TranslationService::new(Arc::new(FakeTranslator)),
            cluster_client: cluster,
            cluster_name: "dev-cluster".to_owned(),
        }
    }

    fn get(uri: &str) -> Request<Body> {
        let mut request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap_or_else(|_| unreachable!());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        request
    }

    #[tokio::test]
    async fn every_api_route_consumes_the_admission_budget() {
        let app = build_router(app_state(2));

        for uri in ["/api/v1/cluster-health", "/api/v1/context"] {
            let response = app
                .clone()
                .oneshot(get(uri))
                .await
                .unwrap_or_else(|_| unreachable!());
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }

        // Budget exhausted: the dashboard surface is capped like commands.
        let response = app
            .clone()
            .oneshot(get("/api/v1/insights"))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn liveness_probe_is_exempt_from_the_rate_limit() {
        let app = build_router(app_state(1));

        let response = app
            .clone()
            .oneshot(get("/api/v1/cluster-health"))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.status(), StatusCode::OK);

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(get("/health"))
                .await
                .unwrap_or_else(|_| unreachable!());
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
