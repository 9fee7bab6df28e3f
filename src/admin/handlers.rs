use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::gateway::StatsSnapshot;
use crate::routing::{Pillar, RouteFilter, RouteInfo, RouteStatus};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub api_prefix: String,
    pub api_version: String,
    pub pillars: Vec<Pillar>,
    pub routes: usize,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct PillarHealth {
    pub pillar: Pillar,
    pub routes: usize,
    pub maintenance: usize,
}

#[derive(Serialize)]
pub struct GatewayHealth {
    pub status: &'static str,
    pub pillars: Vec<PillarHealth>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoutesQuery {
    pub pillar: Option<String>,
    pub status: Option<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let gateway = &state.gateway;
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        api_prefix: gateway.prefix().to_string(),
        api_version: gateway.api_version().to_string(),
        pillars: gateway.registry().pillars(),
        routes: gateway.registry().len(),
        uptime_secs: gateway.stats().snapshot().uptime_secs,
    })
}

pub async fn get_routes(
    State(state): State<AdminState>,
    Query(query): Query<RoutesQuery>,
) -> Result<Json<Vec<RouteInfo>>, (StatusCode, String)> {
    let pillar = query
        .pillar
        .map(|p| p.parse::<Pillar>())
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let status = query
        .status
        .map(|s| s.parse::<RouteStatus>())
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    Ok(Json(state.gateway.routes(RouteFilter { pillar, status })))
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<StatsSnapshot> {
    Json(state.gateway.stats().snapshot())
}

/// Clear every counter and return the (empty) snapshot.
pub async fn reset_stats(State(state): State<AdminState>) -> Json<StatsSnapshot> {
    state.gateway.stats().reset();
    tracing::info!("Gateway statistics reset");
    Json(state.gateway.stats().snapshot())
}

pub async fn get_health(State(state): State<AdminState>) -> Json<GatewayHealth> {
    let routes = state.gateway.routes(RouteFilter::default());
    let pillars = state
        .gateway
        .registry()
        .pillars()
        .into_iter()
        .map(|pillar| {
            let of_pillar = routes.iter().filter(|r| r.pillar == pillar);
            PillarHealth {
                pillar,
                routes: of_pillar.clone().count(),
                maintenance: of_pillar
                    .filter(|r| r.status == RouteStatus::Maintenance)
                    .count(),
            }
        })
        .collect();

    Json(GatewayHealth {
        status: "healthy",
        pillars,
    })
}
