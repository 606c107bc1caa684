use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};

use crate::controllers::optimizer_controller::OptimizerController;
use crate::controllers::trip_controller::TripController;
use crate::dto::common::ApiResponse;
use crate::dto::trip_dto::{AddBookingRequestToTrip, CreateCombinedTripRequest, TripResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;
use validator::Validate;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/combined", post(create_combined))
        .route("/:id", get(get_by_id))
        .route("/:id/approve", post(approve))
        .route("/:id/start", post(start))
        .route("/:id/end", post(end))
        .route("/:id/cancel", post(cancel))
        .route("/:id/uncombine", post(uncombine))
        .route("/:id/booking-request", post(add_booking_request))
        .route(
            "/:id/booking-request/:booking_request_id",
            delete(remove_booking_request),
        )
}

fn controller(state: &AppState) -> TripController {
    TripController::new(state.pool.clone(), state.estimator.clone())
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let response = controller(&state).get(&id).await?;
    Ok(Json(response))
}

async fn create_combined(
    State(state): State<AppState>,
    Json(request): Json<CreateCombinedTripRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let response = controller(&state).create_combined(request).await?;
    Ok(Json(response))
}

async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let response = controller(&state).approve(&id).await?;
    Ok(Json(response))
}

async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let response = controller(&state).start(&id).await?;
    Ok(Json(response))
}

async fn end(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let response = controller(&state).end(&id).await?;
    Ok(Json(response))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let response = controller(&state).cancel(&id).await?;
    Ok(Json(response))
}

async fn uncombine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let response = controller(&state).uncombine(&id).await?;
    Ok(Json(response))
}

async fn add_booking_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddBookingRequestToTrip>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    request.validate()?;
    let optimizer = OptimizerController::new(
        state.pool.clone(),
        state.optimizer.clone(),
        state.config.tz_offset_hours,
    );
    let response = optimizer
        .add_booking_request_to_trip(&request.booking_request_id, &id)
        .await?;
    Ok(Json(response))
}

async fn remove_booking_request(
    State(state): State<AppState>,
    Path((id, booking_request_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let response = controller(&state)
        .remove_booking_request(&id, &booking_request_id)
        .await?;
    Ok(Json(response))
}
