//! Controlador de trips
//!
//! Arma las transacciones de las operaciones de ciclo de vida y delega la
//! materialización en trip_service.

use std::sync::Arc;

use sqlx::PgPool;

use crate::dto::common::ApiResponse;
use crate::dto::trip_dto::{CreateCombinedTripRequest, TripResponse};
use crate::models::booking_request::{BookingKind, RequestStatus};
use crate::repositories::booking_request_repository::BookingRequestRepository;
use crate::repositories::trip_repository::TripRepository;
use crate::services::notification_service::{self, NotificationBody};
use crate::services::routing_service::RouteEstimator;
use crate::services::trip_service;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use validator::Validate;

pub struct TripController {
    pool: PgPool,
    estimator: Arc<dyn RouteEstimator>,
}

impl TripController {
    pub fn new(pool: PgPool, estimator: Arc<dyn RouteEstimator>) -> Self {
        Self { pool, estimator }
    }

    pub async fn get(&self, id: &str) -> AppResult<ApiResponse<TripResponse>> {
        let mut conn = self.pool.acquire().await?;
        let detail = TripRepository::find_detail(&mut *conn, id)
            .await?
            .ok_or_else(|| not_found_error("Trip", id))?;
        Ok(ApiResponse::success(detail.into()))
    }

    pub async fn create_combined(
        &self,
        request: CreateCombinedTripRequest,
    ) -> AppResult<ApiResponse<TripResponse>> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let requests =
            BookingRequestRepository::find_many_by_ids(&mut *tx, &request.booking_request_ids)
                .await?;
        if requests.len() != request.booking_request_ids.len() {
            return Err(AppError::NotFound(
                "Some booking requests do not exist".to_string(),
            ));
        }
        for br in &requests {
            if br.kind != BookingKind::OneWay || br.status != RequestStatus::Pending {
                return Err(AppError::InvalidState(format!(
                    "Booking request {} is not a pending one-way request",
                    br.id
                )));
            }
        }

        let trip = trip_service::create_combined_trip(
            &mut *tx,
            &request.vehicle_id,
            &requests,
            request.departure_time,
            &request.trip_stop_orders,
            self.estimator.as_ref(),
        )
        .await?;

        let detail = TripRepository::find_detail(&mut *tx, &trip.id)
            .await?
            .ok_or_else(|| crate::utils::errors::refetch_error("Trip", &trip.id))?;
        tx.commit().await?;

        Ok(ApiResponse::success_with_message(
            detail.into(),
            "Trip combinado creado".to_string(),
        ))
    }

    /// Aprobación explícita de un trip provisional (mismo camino que el
    /// finalizador nocturno)
    pub async fn approve(&self, id: &str) -> AppResult<ApiResponse<TripResponse>> {
        let mut tx = self.pool.begin().await?;

        let promoted = trip_service::approve_scheduling_trip(&mut *tx, id).await?;

        let detail = TripRepository::find_detail(&mut *tx, &promoted.id)
            .await?
            .ok_or_else(|| crate::utils::errors::refetch_error("Trip", &promoted.id))?;

        let body = NotificationBody {
            title: "Trip scheduled".to_string(),
            template_key: "trip_scheduled".to_string(),
            data: serde_json::json!({ "trip_id": promoted.id }),
            entity_id: Some(promoted.id.clone()),
            priority: crate::models::booking_request::Priority::Normal,
        };
        if let Some(driver_id) = &promoted.driver_id {
            notification_service::send_user_notification(&mut *tx, &body, driver_id).await?;
        }
        let request_ids = detail.booking_request_ids();
        let requests = BookingRequestRepository::find_many_by_ids(&mut *tx, &request_ids).await?;
        for request in &requests {
            notification_service::send_user_notification(&mut *tx, &body, &request.requester_id)
                .await?;
        }

        tx.commit().await?;
        Ok(ApiResponse::success_with_message(
            detail.into(),
            "Trip provisional aprobado".to_string(),
        ))
    }

    pub async fn start(&self, id: &str) -> AppResult<ApiResponse<TripResponse>> {
        let mut tx = self.pool.begin().await?;
        trip_service::start_trip(&mut *tx, id).await?;
        let detail = TripRepository::find_detail(&mut *tx, id)
            .await?
            .ok_or_else(|| crate::utils::errors::refetch_error("Trip", id))?;
        tx.commit().await?;
        Ok(ApiResponse::success(detail.into()))
    }

    pub async fn end(&self, id: &str) -> AppResult<ApiResponse<TripResponse>> {
        let mut tx = self.pool.begin().await?;
        trip_service::end_trip(&mut *tx, id).await?;
        let detail = TripRepository::find_detail(&mut *tx, id)
            .await?
            .ok_or_else(|| crate::utils::errors::refetch_error("Trip", id))?;
        tx.commit().await?;
        Ok(ApiResponse::success(detail.into()))
    }

    pub async fn cancel(&self, id: &str) -> AppResult<ApiResponse<TripResponse>> {
        let mut tx = self.pool.begin().await?;
        trip_service::cancel_trip(&mut *tx, id).await?;
        let detail = TripRepository::find_detail(&mut *tx, id)
            .await?
            .ok_or_else(|| crate::utils::errors::refetch_error("Trip", id))?;
        tx.commit().await?;
        Ok(ApiResponse::success(detail.into()))
    }

    pub async fn uncombine(&self, id: &str) -> AppResult<ApiResponse<()>> {
        let mut tx = self.pool.begin().await?;
        let request_ids = trip_service::uncombine_trip(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(ApiResponse::message_only(format!(
            "Trip descombinado, {} solicitudes vuelven a pending",
            request_ids.len()
        )))
    }

    pub async fn remove_booking_request(
        &self,
        trip_id: &str,
        booking_request_id: &str,
    ) -> AppResult<ApiResponse<TripResponse>> {
        let mut tx = self.pool.begin().await?;
        trip_service::remove_booking_request_from_trip(&mut *tx, booking_request_id, trip_id)
            .await?;
        BookingRequestRepository::set_status(&mut *tx, booking_request_id, RequestStatus::Pending)
            .await?;
        let detail = TripRepository::find_detail(&mut *tx, trip_id)
            .await?
            .ok_or_else(|| crate::utils::errors::refetch_error("Trip", trip_id))?;
        tx.commit().await?;
        Ok(ApiResponse::success(detail.into()))
    }
}
