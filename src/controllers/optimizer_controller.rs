//! Controlador del optimizador

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::PgPool;

use crate::dto::common::ApiResponse;
use crate::dto::trip_dto::TripResponse;
use crate::services::trip_optimizer_service::{self, OptimizerClient};
use crate::utils::errors::AppResult;

pub struct OptimizerController {
    pool: PgPool,
    client: OptimizerClient,
    offset_hours: i32,
}

impl OptimizerController {
    pub fn new(pool: PgPool, client: OptimizerClient, offset_hours: i32) -> Self {
        Self {
            pool,
            client,
            offset_hours,
        }
    }

    /// Dispara a demanda la misma corrida que ejecuta el cron nocturno
    pub async fn run(&self) -> AppResult<ApiResponse<()>> {
        let mut rng = StdRng::from_entropy();
        trip_optimizer_service::run_nightly_optimization(
            &self.pool,
            &self.client,
            self.offset_hours,
            &mut rng,
        )
        .await?;
        Ok(ApiResponse::message_only(
            "Corrida de optimización completada".to_string(),
        ))
    }

    pub async fn get_combinable_trips(
        &self,
        booking_request_id: &str,
    ) -> AppResult<ApiResponse<Vec<TripResponse>>> {
        let details = trip_optimizer_service::get_combinable_trips(
            &self.pool,
            booking_request_id,
            self.offset_hours,
        )
        .await?;
        Ok(ApiResponse::success(
            details.into_iter().map(TripResponse::from).collect(),
        ))
    }

    pub async fn add_booking_request_to_trip(
        &self,
        booking_request_id: &str,
        trip_id: &str,
    ) -> AppResult<ApiResponse<()>> {
        trip_optimizer_service::add_booking_request_to_trip(
            &self.pool,
            booking_request_id,
            trip_id,
            self.offset_hours,
        )
        .await?;
        Ok(ApiResponse::message_only(format!(
            "Solicitud {} sumada al trip {}",
            booking_request_id, trip_id
        )))
    }

    pub async fn get_available_vehicles(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        capacity: i32,
    ) -> AppResult<ApiResponse<Vec<String>>> {
        let candidates =
            trip_optimizer_service::get_available_vehicles(&self.pool, start, end, capacity)
                .await?;
        Ok(ApiResponse::success(
            candidates.into_iter().map(|c| c.vehicle.id).collect(),
        ))
    }
}
