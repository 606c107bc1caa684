//! Repositorio de vehículos, conductores y vehículos tercerizados

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::models::vehicle::{Driver, DriverAvailability, OutsourcedVehicle, Vehicle, VehicleCandidate};
use crate::repositories::schedule_repository::ScheduleRepository;
use crate::utils::errors::AppResult;

pub struct VehicleRepository;

impl VehicleRepository {
    pub async fn find_by_id(conn: &mut PgConnection, id: &str) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(vehicle)
    }

    pub async fn find_driver(conn: &mut PgConnection, id: &str) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(driver)
    }

    pub async fn set_driver_availability(
        conn: &mut PgConnection,
        driver_id: &str,
        availability: DriverAvailability,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE drivers SET availability = $2 WHERE id = $1")
            .bind(driver_id)
            .bind(availability)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn find_outsourced_by_id(
        conn: &mut PgConnection,
        id: &str,
    ) -> AppResult<Option<OutsourcedVehicle>> {
        let vehicle = sqlx::query_as::<_, OutsourcedVehicle>(
            "SELECT * FROM outsourced_vehicles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(vehicle)
    }

    /// Carga todos los vehículos con conductor asignado junto a su conductor
    /// y los schedules futuros de ese conductor. El filtro de disponibilidad
    /// (estado, executive, capacidad, solapamiento) se aplica en memoria.
    pub async fn find_dispatch_candidates(
        conn: &mut PgConnection,
        schedules_ending_after: DateTime<Utc>,
    ) -> AppResult<Vec<VehicleCandidate>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles WHERE driver_id IS NOT NULL ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        let driver_ids: Vec<String> = vehicles
            .iter()
            .filter_map(|v| v.driver_id.clone())
            .collect();

        let drivers = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = ANY($1)")
            .bind(&driver_ids)
            .fetch_all(&mut *conn)
            .await?;

        let schedules = ScheduleRepository::find_by_drivers_ending_after(
            &mut *conn,
            &driver_ids,
            schedules_ending_after,
        )
        .await?;

        let mut candidates = Vec::with_capacity(vehicles.len());
        for vehicle in vehicles {
            let driver_id = match &vehicle.driver_id {
                Some(id) => id.clone(),
                None => continue,
            };
            let driver = match drivers.iter().find(|d| d.id == driver_id) {
                Some(d) => d.clone(),
                None => continue,
            };
            let driver_schedules = schedules
                .iter()
                .filter(|s| s.driver_id.as_deref() == Some(driver_id.as_str()))
                .cloned()
                .collect();
            candidates.push(VehicleCandidate {
                vehicle,
                driver,
                schedules: driver_schedules,
            });
        }

        Ok(candidates)
    }
}
