//! Tests de integración del cliente del solver contra un stub HTTP en proceso

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use serde_json::json;

use trip_scheduling::dto::optimizer_dto::{
    OptimizeJobRequest, OptimizerLocation, OptimizerRequest, OptimizerVehicle,
};
use trip_scheduling::services::trip_optimizer_service::{OptimizerClient, OptimizerConfig};
use trip_scheduling::utils::errors::AppError;

const API_KEY: &str = "test-api-key";

/// Comportamiento del stub: cuántos polls devuelven pending antes del estado final
#[derive(Clone)]
struct StubState {
    pending_polls: Arc<AtomicUsize>,
    final_status: &'static str,
}

async fn submit(
    State(_state): State<StubState>,
    headers: HeaderMap,
    Json(_job): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match headers.get("X-API-Key").and_then(|v| v.to_str().ok()) {
        Some(key) if key == API_KEY => Ok(Json(json!({ "job_id": "job-1" }))),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn status(
    State(state): State<StubState>,
    Path(job_id): Path<String>,
) -> Json<serde_json::Value> {
    let status = if state.pending_polls.load(Ordering::SeqCst) > 0 {
        state.pending_polls.fetch_sub(1, Ordering::SeqCst);
        "pending"
    } else {
        state.final_status
    };
    Json(json!({ "job_id": job_id, "status": status }))
}

async fn result(Path(_job_id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({
        "scheduled_trips": [{
            "vehicle_id": "VEH-1",
            "combined_request_ids": ["BR-1", "BR-2"],
            "trip_start_time": "2025-05-02T01:00:00Z",
            "trip_end_time": "2025-05-02T03:00:00Z",
            "total_duration_minutes": 120.0,
            "total_distance_meters": 45000.0,
            "route": [
                { "latitude": 13.70, "longitude": 100.50, "estimated_arrival_time": null, "type": "start" },
                { "location_id": "LOC-A", "latitude": 13.75, "longitude": 100.50,
                  "estimated_arrival_time": "2025-05-02T01:30:00Z", "type": "pickup" },
                { "location_id": "LOC-B", "latitude": 13.80, "longitude": 100.55,
                  "estimated_arrival_time": "2025-05-02T02:45:00Z", "type": "dropoff" }
            ]
        }]
    }))
}

async fn spawn_stub(pending_polls: usize, final_status: &'static str) -> SocketAddr {
    let state = StubState {
        pending_polls: Arc::new(AtomicUsize::new(pending_polls)),
        final_status,
    };
    let app = Router::new()
        .route("/optimizer/api/v1/optimize", post(submit))
        .route("/optimizer/api/v1/optimize/:job_id/status", get(status))
        .route("/optimizer/api/v1/optimize/:job_id/result", get(result))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });
    addr
}

fn client_for(addr: SocketAddr, poll_interval: Duration, poll_deadline: Duration) -> OptimizerClient {
    let config = OptimizerConfig {
        base_url: format!("http://{}", addr),
        api_key: API_KEY.to_string(),
        submit_timeout: Duration::from_secs(2),
        poll_interval,
        poll_deadline,
    };
    OptimizerClient::new(reqwest::Client::new(), config)
}

fn sample_job() -> OptimizeJobRequest {
    OptimizeJobRequest {
        vehicles: vec![OptimizerVehicle {
            id: "VEH-1".to_string(),
            capacity: 4,
            base_location: OptimizerLocation {
                id: "LOC-BASE".to_string(),
                latitude: 13.70,
                longitude: 100.50,
            },
            unavailability: None,
        }],
        requests: vec![OptimizerRequest {
            id: "BR-1".to_string(),
            pickup_location: OptimizerLocation {
                id: "LOC-A".to_string(),
                latitude: 13.75,
                longitude: 100.50,
            },
            dropoff_location: OptimizerLocation {
                id: "LOC-B".to_string(),
                latitude: 13.80,
                longitude: 100.55,
            },
            dropoff_time: Utc.with_ymd_and_hms(2025, 5, 2, 3, 0, 0).unwrap(),
            capacity_demand: 2,
        }],
    }
}

#[tokio::test]
async fn test_run_job_polls_until_completed() {
    let addr = spawn_stub(2, "completed").await;
    let client = client_for(addr, Duration::from_millis(1), Duration::from_secs(2));

    let result = client.run_job(&sample_job()).await.expect("job result");
    assert_eq!(result.scheduled_trips.len(), 1);
    let trip = &result.scheduled_trips[0];
    assert_eq!(trip.vehicle_id.as_deref(), Some("VEH-1"));
    assert_eq!(trip.combined_request_ids, vec!["BR-1", "BR-2"]);
    assert_eq!(trip.route.len(), 3);
}

#[tokio::test]
async fn test_run_job_fails_on_failed_status() {
    let addr = spawn_stub(1, "failed").await;
    let client = client_for(addr, Duration::from_millis(1), Duration::from_secs(2));

    let error = client.run_job(&sample_job()).await.expect_err("must fail");
    assert!(matches!(error, AppError::ExternalApi(_)), "got: {:?}", error);
}

#[tokio::test]
async fn test_poll_deadline_times_out() {
    // El stub queda en pending para siempre; el deadline corta el loop
    let addr = spawn_stub(usize::MAX, "completed").await;
    let client = client_for(addr, Duration::from_millis(5), Duration::from_millis(30));

    let error = client.run_job(&sample_job()).await.expect_err("must time out");
    assert!(
        matches!(error, AppError::ExternalTimeout(_)),
        "got: {:?}",
        error
    );
}

#[tokio::test]
async fn test_submit_requires_api_key() {
    let addr = spawn_stub(0, "completed").await;
    let config = OptimizerConfig {
        base_url: format!("http://{}", addr),
        api_key: "wrong-key".to_string(),
        submit_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(1),
        poll_deadline: Duration::from_secs(1),
    };
    let client = OptimizerClient::new(reqwest::Client::new(), config);

    let error = client.submit_job(&sample_job()).await.expect_err("must reject");
    assert!(matches!(error, AppError::ExternalApi(_)), "got: {:?}", error);
}
