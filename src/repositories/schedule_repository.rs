//! Repositorio de schedules (bloques de agenda de conductores y vehículos)

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::models::schedule::Schedule;
use crate::utils::errors::AppResult;

pub struct ScheduleRepository;

impl ScheduleRepository {
    pub async fn create(conn: &mut PgConnection, schedule: &Schedule) -> AppResult<Schedule> {
        let created = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (
                id, title, description, start_time, end_time,
                driver_id, vehicle_id, trip_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&schedule.id)
        .bind(&schedule.title)
        .bind(&schedule.description)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(&schedule.driver_id)
        .bind(&schedule.vehicle_id)
        .bind(&schedule.trip_id)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    /// Schedules de un conjunto de conductores que terminan después del
    /// instante dado. Insumo del filtro de disponibilidad.
    pub async fn find_by_drivers_ending_after(
        conn: &mut PgConnection,
        driver_ids: &[String],
        after: DateTime<Utc>,
    ) -> AppResult<Vec<Schedule>> {
        let schedules = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT * FROM schedules
            WHERE driver_id = ANY($1) AND end_time > $2
            ORDER BY start_time
            "#,
        )
        .bind(driver_ids)
        .bind(after)
        .fetch_all(conn)
        .await?;

        Ok(schedules)
    }

    pub async fn delete_by_trip(conn: &mut PgConnection, trip_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM schedules WHERE trip_id = $1")
            .bind(trip_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
