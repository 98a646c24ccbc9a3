use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::address::{calculate_address_history_coverage, AddressInterval};
use super::capacity::{validate_capacity, CapacityRatios, CapacityValidation, ProposedChildren};
use super::domain::PersonId;
use super::repository::{NotificationDispatcher, PersonRepository, RepositoryError};
use super::sweep::ComplianceSweep;

/// Optional body for a manual sweep trigger. A `today` other than the service date is
/// refused.
#[derive(Debug, Default, Deserialize)]
pub struct SweepRequest {
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CapacityRequest {
    #[serde(default)]
    pub works_with_others: bool,
    #[serde(default)]
    pub number_of_assistants: u32,
    #[serde(default)]
    pub proposed: ProposedChildren,
}

#[derive(Debug, Serialize)]
pub struct CapacityResponse {
    pub ratios: CapacityRatios,
    pub validation: CapacityValidation,
}

#[derive(Debug, Deserialize)]
pub struct AddressHistoryRequest {
    #[serde(default)]
    pub move_in: Option<NaiveDate>,
    #[serde(default)]
    pub history: Vec<AddressInterval>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Admin and registration-form endpoints backed by a shared sweep.
pub fn compliance_router<R, N>(sweep: Arc<ComplianceSweep<R, N>>) -> Router
where
    R: PersonRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/compliance/sweep", post(sweep_handler::<R, N>))
        .route(
            "/api/v1/compliance/people/:person_id",
            get(person_handler::<R, N>),
        )
        .route("/api/v1/compliance/overview", get(overview_handler::<R, N>))
        .route("/api/v1/forms/capacity", post(capacity_handler))
        .route(
            "/api/v1/forms/address-history",
            post(address_history_handler::<R, N>),
        )
        .with_state(sweep)
}

pub(crate) async fn sweep_handler<R, N>(
    State(sweep): State<Arc<ComplianceSweep<R, N>>>,
    request: Option<Json<SweepRequest>>,
) -> Response
where
    R: PersonRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    // Sweeps only run as of the service clock.
    let today = sweep.today();
    if let Some(requested) = request.and_then(|Json(request)| request.today) {
        if requested != today {
            let payload = json!({
                "error": "sweep date must match the service date",
                "requested": requested,
                "today": today,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    }

    let outcome = tokio::task::spawn_blocking(move || sweep.run_exclusive(today)).await;

    match outcome {
        Ok(Ok(summary)) => (StatusCode::OK, Json(summary)).into_response(),
        Ok(Err(busy)) => {
            let payload = json!({
                "error": busy.to_string(),
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": format!("compliance sweep task failed: {error}"),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn person_handler<R, N>(
    State(sweep): State<Arc<ComplianceSweep<R, N>>>,
    Path(person_id): Path<String>,
) -> Response
where
    R: PersonRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let id = PersonId::normalized(&person_id);
    match sweep.assess(&id, sweep.today()) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(RepositoryError::NotFound) => {
            let payload = json!({
                "person_id": id.0,
                "error": "person not found",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn overview_handler<R, N>(
    State(sweep): State<Arc<ComplianceSweep<R, N>>>,
) -> Response
where
    R: PersonRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    match sweep.overview(sweep.today()) {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn capacity_handler(Json(request): Json<CapacityRequest>) -> Response {
    let ratios =
        CapacityRatios::for_setting(request.works_with_others, request.number_of_assistants);
    let validation = validate_capacity(&request.proposed, &ratios);
    (StatusCode::OK, Json(CapacityResponse { ratios, validation })).into_response()
}

pub(crate) async fn address_history_handler<R, N>(
    State(sweep): State<Arc<ComplianceSweep<R, N>>>,
    Json(request): Json<AddressHistoryRequest>,
) -> Response
where
    R: PersonRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let today = request.today.unwrap_or_else(|| sweep.today());
    let coverage = calculate_address_history_coverage(request.move_in, &request.history, today);
    (StatusCode::OK, Json(coverage)).into_response()
}
