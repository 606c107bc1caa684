//! Repositorio de paradas de trip

use sqlx::PgConnection;

use crate::models::trip::TripStop;
use crate::utils::errors::AppResult;

pub struct TripStopRepository;

impl TripStopRepository {
    pub async fn create(conn: &mut PgConnection, stop: &TripStop) -> AppResult<TripStop> {
        let created = sqlx::query_as::<_, TripStop>(
            r#"
            INSERT INTO trip_stops (
                id, trip_id, stop_type, stop_order, location_id,
                planned_arrival_time, actual_arrival_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&stop.id)
        .bind(&stop.trip_id)
        .bind(stop.stop_type)
        .bind(stop.stop_order)
        .bind(&stop.location_id)
        .bind(stop.planned_arrival_time)
        .bind(stop.actual_arrival_time)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    pub async fn find_by_trip(
        conn: &mut PgConnection,
        trip_id: &str,
    ) -> AppResult<Vec<TripStop>> {
        let stops = sqlx::query_as::<_, TripStop>(
            "SELECT * FROM trip_stops WHERE trip_id = $1 ORDER BY stop_order",
        )
        .bind(trip_id)
        .fetch_all(conn)
        .await?;

        Ok(stops)
    }

    /// Mueve todas las paradas de un trip provisional al trip definitivo.
    pub async fn reparent(
        conn: &mut PgConnection,
        from_trip_id: &str,
        to_trip_id: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE trip_stops SET trip_id = $2 WHERE trip_id = $1")
            .bind(from_trip_id)
            .bind(to_trip_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(conn: &mut PgConnection, id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM trip_stops WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
