//! Controlador de booking requests

use sqlx::PgPool;

use crate::dto::booking_request_dto::{
    BookingRequestResponse, CreateBookingRequest, UpdateBookingRequest,
};
use crate::dto::common::ApiResponse;
use crate::services::booking_request_service;
use crate::utils::errors::AppResult;

pub struct BookingRequestController {
    pool: PgPool,
    offset_hours: i32,
}

impl BookingRequestController {
    pub fn new(pool: PgPool, offset_hours: i32) -> Self {
        Self { pool, offset_hours }
    }

    pub async fn create(
        &self,
        request: CreateBookingRequest,
    ) -> AppResult<ApiResponse<BookingRequestResponse>> {
        let created =
            booking_request_service::create_booking_request(&self.pool, request, self.offset_hours)
                .await?;
        Ok(ApiResponse::success_with_message(
            created.into(),
            "Solicitud creada y despachada".to_string(),
        ))
    }

    pub async fn get(&self, id: &str) -> AppResult<ApiResponse<BookingRequestResponse>> {
        let request = booking_request_service::get_booking_request(&self.pool, id).await?;
        Ok(ApiResponse::success(request.into()))
    }

    pub async fn update(
        &self,
        id: &str,
        request: UpdateBookingRequest,
    ) -> AppResult<ApiResponse<BookingRequestResponse>> {
        let updated = booking_request_service::update_booking_request(
            &self.pool,
            id,
            request,
            self.offset_hours,
        )
        .await?;
        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Solicitud actualizada y re-despachada".to_string(),
        ))
    }

    pub async fn reject(&self, id: &str) -> AppResult<ApiResponse<BookingRequestResponse>> {
        let rejected = booking_request_service::reject_booking_request(&self.pool, id).await?;
        Ok(ApiResponse::success(rejected.into()))
    }

    pub async fn cancel(&self, id: &str) -> AppResult<ApiResponse<BookingRequestResponse>> {
        let cancelled = booking_request_service::cancel_booking_request(&self.pool, id).await?;
        Ok(ApiResponse::success(cancelled.into()))
    }

    pub async fn delete(&self, id: &str) -> AppResult<ApiResponse<()>> {
        booking_request_service::delete_booking_request(&self.pool, id).await?;
        Ok(ApiResponse::message_only("Solicitud eliminada".to_string()))
    }
}
