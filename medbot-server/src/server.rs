use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    error::ApiError,
    protocol::{ChatRequest, ChatResponse, HealthResponse, LegacyMessage, ServiceInfo},
    service::ServiceCell,
    settings::Settings,
};

#[derive(Clone)]
pub struct AppState {
    pub services: ServiceCell,
    pub version: Arc<str>,
}

impl AppState {
    pub fn new(services: ServiceCell) -> Self {
        Self { services, version: Arc::from(env!("CARGO_PKG_VERSION")) }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn app_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/chat/", post(chat))
        .route("/api/chat", post(chat))
        .route("/api/chat/health", get(health))
        .route("/get", get(legacy_chat).post(legacy_chat))
        .with_state(state)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let addr: SocketAddr = settings
        .bind_address()
        .parse()
        .with_context(|| format!("invalid host/port '{}'", settings.bind_address()))?;
    let app_name = settings.app_name.clone();
    let cors_origins = settings.cors_origins.clone();

    let state = AppState::new(ServiceCell::lazy(settings));
    let app = app_router(state, &cors_origins);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("{app_name} v{} listening on http://{addr}", env!("CARGO_PKG_VERSION"));
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "healthy".to_string(),
        version: state.version.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.validated().map_err(ApiError::BadRequest)?;
    info!(message = %preview(message), "received chat request");

    let service = state.services.get().await.map_err(|e| {
        error!(error = %e, "chat service unavailable");
        ApiError::internal(&e)
    })?;
    let exchange = service.process(message).await.map_err(|e| {
        error!(error = %e, "error in chat endpoint");
        ApiError::internal(&e)
    })?;
    Ok(Json(exchange.into()))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let service = match state.services.get().await {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "error in health check");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unhealthy(format!("Health check failed: {e}"))),
            );
        }
    };

    if service.health_check().await {
        (StatusCode::OK, Json(HealthResponse::healthy()))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::unhealthy("Chat service is not operational")),
        )
    }
}

/// Plain-text chat for older clients: the answer body and nothing else.
async fn legacy_chat(
    State(state): State<AppState>,
    LegacyMessage(msg): LegacyMessage,
) -> Result<String, ApiError> {
    info!(message = %preview(&msg), "legacy endpoint received message");

    let service = state.services.get().await.map_err(|e| {
        error!(error = %e, "error in legacy chat endpoint");
        ApiError::Internal(e.to_string())
    })?;
    let exchange = service.process(&msg).await.map_err(|e| {
        error!(error = %e, "error in legacy chat endpoint");
        ApiError::Internal(e.to_string())
    })?;
    Ok(exchange.answer)
}
