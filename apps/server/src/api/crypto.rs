use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use cryptotrack_core::gateway::{Endpoint, GatewayServiceTrait, Served};
use cryptotrack_market_data::{ChartPoint, MarketAsset};
use serde::Serialize;

use crate::{
    error::{ApiResult, ErrorBody},
    main_lib::AppState,
};

/// Where the payload came from: `upstream`, `stale` or `fallback`.
pub const DATA_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-data-source");

/// `limit` as sent by the client. Anything that is not a non-negative
/// integer means "no limit given"; values past `u32` saturate and get
/// clamped downstream.
fn parse_limit(raw: Option<&String>) -> Option<u32> {
    raw?.trim()
        .parse::<u64>()
        .ok()
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn cached_json<T: Serialize>(
    gateway: &dyn GatewayServiceTrait,
    endpoint: Endpoint,
    served: Served<T>,
) -> Response {
    (
        [
            (
                header::CACHE_CONTROL,
                gateway.cache_control(endpoint, served.source),
            ),
            (DATA_SOURCE_HEADER, served.source.as_str().to_string()),
        ],
        Json(served.items),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/crypto/markets",
    params(("limit" = Option<u32>, Query, description = "Number of assets; defaults to 50, capped at 250")),
    responses((status = 200, description = "Top assets by market cap", body = [MarketAsset]))
)]
pub async fn list_markets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit = parse_limit(params.get("limit"));
    let served = state.gateway.market_listing(limit).await;
    cached_json(state.gateway.as_ref(), Endpoint::Markets, served)
}

#[utoipa::path(
    get,
    path = "/api/crypto/chart/{coin_id}",
    params(("coin_id" = String, Path, description = "Upstream coin identifier, e.g. bitcoin")),
    responses(
        (status = 200, description = "Daily prices for the last 7 days, oldest first", body = [ChartPoint]),
        (status = 400, description = "Missing coin identifier", body = ErrorBody)
    )
)]
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(coin_id): Path<String>,
) -> ApiResult<Response> {
    chart_response(&state, &coin_id).await
}

async fn get_chart_without_id(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    chart_response(&state, "").await
}

async fn chart_response(state: &AppState, coin_id: &str) -> ApiResult<Response> {
    let served = state.gateway.chart_series(coin_id).await?;
    Ok(cached_json(state.gateway.as_ref(), Endpoint::Chart, served))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/crypto/markets", get(list_markets))
        .route("/api/crypto/chart", get(get_chart_without_id))
        .route("/api/crypto/chart/", get(get_chart_without_id))
        .route("/api/crypto/chart/{coin_id}", get(get_chart))
}
