//! HTTP routes over a shared, read-only footpath graph

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use footpath_core::{
    BuildStats, FootpathConfig, FootpathGraph, LatLng, Route, RouteProgress, TourRoute,
    find_route, find_tour, route_progress,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ApiError, ErrorBody};

/// Durable graph and the engine settings every query runs with
pub struct AppState {
    pub graph: FootpathGraph,
    pub stats: BuildStats,
    pub config: FootpathConfig,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub origin: LatLng,
    pub destination: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct TourRequest {
    pub stops: Vec<LatLng>,
}

/// A route polyline held by the client and the walker's current position
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub points: Vec<LatLng>,
    pub position: LatLng,
}

#[derive(Debug, Serialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub components: usize,
    pub build: BuildStats,
}

pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // One semaphore for the whole router, not one per route
    let limits = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(GlobalConcurrencyLimitLayer::new(config.concurrency_limit));

    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/route", post(route))
        .route("/route/geojson", post(route_geojson))
        .route("/route/progress", post(progress))
        .route("/tour", post(tour))
        .layer(limits)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<ErrorBody>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorBody {
                error: "Request timed out".into(),
            }),
        )
    } else {
        tracing::error!("Unhandled middleware error: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        )
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<GraphSummary> {
    Json(GraphSummary {
        nodes: state.graph.node_count(),
        edges: state.graph.edge_count(),
        components: state.graph.component_count(),
        build: state.stats.clone(),
    })
}

/// Routing is CPU bound, so it runs off the async workers
async fn solve_route(state: Arc<AppState>, request: RouteRequest) -> Result<Route, ApiError> {
    let route = tokio::task::spawn_blocking(move || {
        find_route(
            &state.graph,
            request.origin,
            request.destination,
            &state.config,
        )
    })
    .await??;

    if route.degraded {
        tracing::warn!(
            "Degraded route served: {:?}, {:.0} m",
            route.stats.fallback,
            route.distance_m
        );
    }
    Ok(route)
}

async fn route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<Route>, ApiError> {
    Ok(Json(solve_route(state, request).await?))
}

async fn route_geojson(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let route = solve_route(state, request).await?;
    let body = route.to_geojson_string()?;
    Ok(([(header::CONTENT_TYPE, "application/geo+json")], body))
}

async fn progress(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<RouteProgress>, ApiError> {
    route_progress(&request.points, request.position, &state.config.route)?
        .map(Json)
        .ok_or_else(|| footpath_core::Error::InvalidQuery("route has no points".into()).into())
}

async fn tour(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TourRequest>,
) -> Result<Json<TourRoute>, ApiError> {
    let tour = tokio::task::spawn_blocking(move || {
        find_tour(&state.graph, &request.stops, &state.config)
    })
    .await??;
    Ok(Json(tour))
}
