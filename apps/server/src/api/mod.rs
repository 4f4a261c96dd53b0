pub mod crypto;
pub mod health;

use std::sync::Arc;

use axum::{http::HeaderValue, routing::get, Json, Router};
use cryptotrack_market_data::{ChartPoint, MarketAsset};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};

use crate::{
    config::Config,
    error::{ApiError, ErrorBody},
    main_lib::AppState,
};

pub const WELCOME_MESSAGE: &str = "Crypto Price Tracker API";

#[derive(Serialize, ToSchema)]
pub struct Welcome {
    pub message: String,
}

/// Service banner, also answered for any unmatched `/api` path.
#[utoipa::path(get, path = "/api", responses((status = 200, description = "Service banner", body = Welcome)))]
pub async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: WELCOME_MESSAGE.to_string(),
    })
}

#[derive(OpenApi)]
#[openapi(
    paths(welcome, health::healthz, crypto::list_markets, crypto::get_chart),
    components(schemas(Welcome, ErrorBody, MarketAsset, ChartPoint)),
    tags((name="cryptotrack"))
)]
pub struct ApiDoc;

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/api", get(welcome))
        .route("/api/", get(welcome))
        .merge(health::router())
        .merge(crypto::router())
        .route("/api/{*rest}", get(welcome))
        .route("/openapi.json", get(|| async { Json(openapi) }))
        .fallback(|| async { ApiError::NotFound })
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
