use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::compliance::router::compliance_router;
use crate::compliance::sweep::ComplianceSweep;

fn json_request(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn sweep_route_runs_with_explicit_date() {
    let (sweep, repository, _dispatcher) = build_sweep([household_adult("adult-1")]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(json_request(
            "/api/v1/compliance/sweep",
            json!({ "today": "2026-10-19" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("today"), Some(&json!("2026-10-19")));
    assert_eq!(payload.get("checked"), Some(&json!(1)));
    assert_eq!(
        repository.get("adult-1").follow_up_due_date,
        Some(today())
    );
}

#[tokio::test]
async fn sweep_route_accepts_empty_body() {
    let (sweep, _repository, _dispatcher) = build_sweep([household_adult("adult-2")]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(
            Request::post("/api/v1/compliance/sweep")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("today"), Some(&json!("2026-10-19")));
}

#[tokio::test]
async fn sweep_route_refuses_a_date_other_than_the_service_date() {
    let (sweep, repository, dispatcher) = build_sweep([requested_adult("adult-4", 7)]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(json_request(
            "/api/v1/compliance/sweep",
            json!({ "today": "2026-12-18" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("today"), Some(&json!("2026-10-19")));
    assert_eq!(payload.get("requested"), Some(&json!("2026-12-18")));
    assert!(dispatcher.sent().is_empty());
    assert!(repository.updates().is_empty());
    assert_eq!(repository.get("adult-4").last_reminder_date, None);
}

#[tokio::test]
async fn sweep_handler_returns_conflict_while_running() {
    let (sweep, _repository, dispatcher) = build_sweep([child_turning_16_in("child-1", 7)]);
    let sweep = Arc::new(sweep);
    let _permit = sweep.gate().try_acquire().expect("gate is free");

    let response = crate::compliance::router::sweep_handler::<MemoryRepository, MemoryDispatcher>(
        State(sweep.clone()),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("already running"));
    assert!(dispatcher.sent().is_empty());
}

#[tokio::test]
async fn person_route_returns_assessment_view() {
    let (sweep, _repository, _dispatcher) = build_sweep([child_turning_16_in("child-2", 45)]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(
            Request::get("/api/v1/compliance/people/CHILD-2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("not_applicable")));
    assert_eq!(payload.get("requires_check"), Some(&json!(false)));
    assert_eq!(payload.get("days_until_16"), Some(&json!(45)));
    assert_eq!(payload.get("age"), Some(&json!(15)));
}

#[tokio::test]
async fn person_route_returns_not_found() {
    let (sweep, _repository, _dispatcher) = build_sweep([household_adult("adult-3")]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(
            Request::get("/api/v1/compliance/people/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overview_handler_returns_internal_error_on_store_failure() {
    let sweep = Arc::new(ComplianceSweep::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryDispatcher::default()),
    ));

    let response = crate::compliance::router::overview_handler::<
        UnavailableRepository,
        MemoryDispatcher,
    >(State(sweep))
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn capacity_route_flags_exceeded_limits() {
    let (sweep, _repository, _dispatcher) = build_sweep([]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(json_request(
            "/api/v1/forms/capacity",
            json!({
                "works_with_others": true,
                "number_of_assistants": 1,
                "proposed": { "under1": 3, "under5": 4, "age5to8": 1, "age8plus": 2 }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["ratios"]["max_under1"], json!(2));
    assert_eq!(payload["ratios"]["max_under5"], json!(6));
    assert_eq!(payload["validation"]["is_valid"], json!(false));
    assert_eq!(payload["validation"]["total_under5"], json!(7));
    assert_eq!(
        payload["validation"]["errors"]
            .as_array()
            .map(Vec::len)
            .unwrap_or_default(),
        3
    );
}

#[tokio::test]
async fn address_history_route_reports_gaps() {
    let (sweep, _repository, _dispatcher) = build_sweep([]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(json_request(
            "/api/v1/forms/address-history",
            json!({
                "move_in": "2024-01-01",
                "history": [
                    { "start_date": "2021-01-01", "end_date": "2023-06-30" }
                ],
                "today": "2026-10-19"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["is_covered"], json!(false));
    assert_eq!(
        payload["gaps"].as_array().map(Vec::len).unwrap_or_default(),
        1
    );
}

#[tokio::test]
async fn address_history_route_returns_null_without_move_in() {
    let (sweep, _repository, _dispatcher) = build_sweep([]);
    let router = compliance_router(Arc::new(sweep));

    let response = router
        .oneshot(json_request(
            "/api/v1/forms/address-history",
            json!({ "history": [] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await, Value::Null);
}
