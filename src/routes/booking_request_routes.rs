use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::controllers::booking_request_controller::BookingRequestController;
use crate::controllers::optimizer_controller::OptimizerController;
use crate::dto::booking_request_dto::{
    BookingRequestResponse, CreateBookingRequest, UpdateBookingRequest,
};
use crate::dto::common::ApiResponse;
use crate::dto::trip_dto::TripResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_request_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/:id", get(get_by_id))
        .route("/:id", put(update))
        .route("/:id", delete(delete_by_id))
        .route("/:id/reject", post(reject))
        .route("/:id/cancel", post(cancel))
        .route("/:id/combinable-trips", get(combinable_trips))
}

async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<ApiResponse<BookingRequestResponse>>, AppError> {
    let controller = BookingRequestController::new(state.pool.clone(), state.config.tz_offset_hours);
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingRequestResponse>>, AppError> {
    let controller = BookingRequestController::new(state.pool.clone(), state.config.tz_offset_hours);
    let response = controller.get(&id).await?;
    Ok(Json(response))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<ApiResponse<BookingRequestResponse>>, AppError> {
    let controller = BookingRequestController::new(state.pool.clone(), state.config.tz_offset_hours);
    let response = controller.update(&id, request).await?;
    Ok(Json(response))
}

async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingRequestResponse>>, AppError> {
    let controller = BookingRequestController::new(state.pool.clone(), state.config.tz_offset_hours);
    let response = controller.reject(&id).await?;
    Ok(Json(response))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingRequestResponse>>, AppError> {
    let controller = BookingRequestController::new(state.pool.clone(), state.config.tz_offset_hours);
    let response = controller.cancel(&id).await?;
    Ok(Json(response))
}

async fn combinable_trips(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<TripResponse>>>, AppError> {
    let controller = OptimizerController::new(
        state.pool.clone(),
        state.optimizer.clone(),
        state.config.tz_offset_hours,
    );
    let response = controller.get_combinable_trips(&id).await?;
    Ok(Json(response))
}

async fn delete_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = BookingRequestController::new(state.pool.clone(), state.config.tz_offset_hours);
    let response = controller.delete(&id).await?;
    Ok(Json(response))
}
