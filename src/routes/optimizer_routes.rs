use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::controllers::optimizer_controller::OptimizerController;
use crate::dto::common::ApiResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_optimizer_router() -> Router<AppState> {
    Router::new()
        .route("/run", post(run))
        .route("/available-vehicles", get(available_vehicles))
}

fn controller(state: &AppState) -> OptimizerController {
    OptimizerController::new(
        state.pool.clone(),
        state.optimizer.clone(),
        state.config.tz_offset_hours,
    )
}

async fn run(State(state): State<AppState>) -> Result<Json<ApiResponse<()>>, AppError> {
    let response = controller(&state).run().await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct AvailableVehiclesQuery {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    capacity: Option<i32>,
}

async fn available_vehicles(
    State(state): State<AppState>,
    Query(query): Query<AvailableVehiclesQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let response = controller(&state)
        .get_available_vehicles(query.start, query.end, query.capacity.unwrap_or(1))
        .await?;
    Ok(Json(response))
}
