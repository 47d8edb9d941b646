//! HTTP request handlers and their request/response bodies.
//!
//! Handlers translate between JSON and the access engine; every decision is
//! made in `gatewatch-access`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use gatewatch_access::{AuditEntry, LocationOverview, ScanOutcome, OVERVIEW_RECENT_RECORDS};
use gatewatch_types::{
    GateType, Location, LocationId, OperatorId, PersonId, Presence,
};
use serde::{Deserialize, Serialize};

use crate::pagination::{Paginated, PaginationParams};
use crate::server::AppState;
use crate::RpcError;

/// Header carrying the authenticated operator id, set by the upstream proxy.
pub const OPERATOR_HEADER: &str = "x-operator-id";

type AppResult<T> = Result<T, RpcError>;

// ── Scan ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Raw value read from the card.
    pub person_id: String,
}

fn operator_from_headers(headers: &HeaderMap) -> AppResult<OperatorId> {
    headers
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(OperatorId::from)
        .ok_or(RpcError::MissingOperator)
}

/// POST /api/verify/scan
pub async fn scan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ScanRequest>,
) -> AppResult<Json<ScanOutcome>> {
    let operator = operator_from_headers(&headers)?;
    let engine = state.engine.clone();
    let started = Instant::now();

    // Waiting on a person's lock blocks the thread.
    let result = tokio::task::spawn_blocking(move || {
        engine.verify_at_operator_gate(&req.person_id, &operator)
    })
    .await
    .map_err(|e| RpcError::Server(format!("scan task failed: {e}")))?;

    state.metrics.observe_scan(&result, started.elapsed());
    if let Err(e) = &result {
        tracing::debug!(code = e.code(), "scan rejected: {e}");
    }
    Ok(Json(result?))
}

// ── Locations ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    #[serde(default, rename = "type")]
    pub gate_type: GateType,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub location_id: String,
    pub operator_id: String,
}

/// POST /api/locations
pub async fn create_location(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLocationRequest>,
) -> AppResult<(StatusCode, Json<Location>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(RpcError::InvalidRequest("location name is empty".into()));
    }
    let location = state.engine.registry().register_location(name, req.gate_type)?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// GET /api/locations
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<LocationOverview>>> {
    Ok(Json(state.history.locations_overview(OVERVIEW_RECENT_RECORDS)?))
}

/// POST /api/locations/assign
pub async fn assign_operator(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AssignRequest>,
) -> AppResult<Json<Location>> {
    let location = state.engine.registry().assign(
        &LocationId::from(req.location_id),
        &OperatorId::from(req.operator_id),
    )?;
    Ok(Json(location))
}

/// DELETE /api/locations/:id/security
pub async fn unassign_operator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Location>> {
    Ok(Json(state.engine.registry().unassign(&LocationId::from(id))?))
}

// ── Logs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct LocationLogsParams {
    /// Restrict to one UTC calendar day, `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
    pub cursor: Option<String>,
    pub count: Option<u32>,
}

/// GET /api/locations/:id/logs
pub async fn location_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<LocationLogsParams>,
) -> AppResult<Json<Paginated<AuditEntry>>> {
    let page = PaginationParams {
        cursor: params.cursor,
        count: params.count,
    }
    .page()?;
    let records = state
        .history
        .location_logs(&LocationId::from(id), params.date, Some(page))?;
    Ok(Json(Paginated::new(records, page)))
}

/// GET /api/locations/breaches
pub async fn breach_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<AuditEntry>>> {
    let page = params.page()?;
    let records = state.history.breach_logs(Some(page))?;
    Ok(Json(Paginated::new(records, page)))
}

/// GET /api/persons/:id/logs
pub async fn person_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<AuditEntry>>> {
    let page = params.page()?;
    let records = state
        .history
        .person_history(&PersonId::from(id), Some(page))?;
    Ok(Json(Paginated::new(records, page)))
}

// ── Presence ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub person_id: PersonId,
    pub presence: Presence,
    /// Where the person is checked in, if anywhere.
    pub location_id: Option<LocationId>,
}

/// GET /api/persons/:id/presence
pub async fn person_presence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<PresenceResponse>> {
    let person = PersonId::from(id);
    let location_id = state.presence.current_location(&person)?;
    let presence = if location_id.is_some() {
        Presence::Present
    } else {
        Presence::Absent
    };
    Ok(Json(PresenceResponse {
        person_id: person,
        presence,
        location_id,
    }))
}

// ── Metrics ──────────────────────────────────────────────────────────────

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let body = state.metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
