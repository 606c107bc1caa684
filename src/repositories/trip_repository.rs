//! Repositorio de trips
//!
//! Además de los accesos fila a fila, expone `find_detail`, que arma el
//! agregado completo (paradas ordenadas, tickets, capacidad del vehículo y
//! presencia de tickets HIGH) que consumen el matcher y el materializador.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::models::trip::{Trip, TripDetail, TripStatus, TripStop, TripTicket};
use crate::utils::errors::AppResult;

pub struct TripRepository;

impl TripRepository {
    pub async fn create(conn: &mut PgConnection, trip: &Trip) -> AppResult<Trip> {
        let created = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (
                id, status, departure_time, arrival_time,
                actual_departure_time, actual_arrival_time,
                driver_id, vehicle_id, outsourced_vehicle_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&trip.id)
        .bind(trip.status)
        .bind(trip.departure_time)
        .bind(trip.arrival_time)
        .bind(trip.actual_departure_time)
        .bind(trip.actual_arrival_time)
        .bind(&trip.driver_id)
        .bind(&trip.vehicle_id)
        .bind(&trip.outsourced_vehicle_id)
        .bind(trip.created_at)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: &str) -> AppResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(trip)
    }

    /// Carga el agregado completo del trip. Devuelve None si el trip no existe.
    pub async fn find_detail(
        conn: &mut PgConnection,
        id: &str,
    ) -> AppResult<Option<TripDetail>> {
        let trip = match Self::find_by_id(&mut *conn, id).await? {
            Some(trip) => trip,
            None => return Ok(None),
        };

        let stops = sqlx::query_as::<_, TripStop>(
            "SELECT * FROM trip_stops WHERE trip_id = $1 ORDER BY stop_order",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let tickets = sqlx::query_as::<_, TripTicket>(
            "SELECT * FROM trip_tickets WHERE trip_id = $1 ORDER BY pickup_time",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let vehicle_capacity: Option<i32> = match &trip.vehicle_id {
            Some(vehicle_id) => {
                sqlx::query_scalar::<_, i32>("SELECT capacity FROM vehicles WHERE id = $1")
                    .bind(vehicle_id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            None => match &trip.outsourced_vehicle_id {
                Some(outsourced_id) => sqlx::query_scalar::<_, i32>(
                    "SELECT capacity FROM outsourced_vehicles WHERE id = $1",
                )
                .bind(outsourced_id)
                .fetch_optional(&mut *conn)
                .await?,
                None => None,
            },
        };

        let has_high_priority_ticket: bool = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM trip_tickets tt
                JOIN booking_requests br ON br.id = tt.booking_request_id
                WHERE tt.trip_id = $1 AND br.priority = 'high'
            )
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(TripDetail {
            trip,
            stops,
            tickets,
            vehicle_capacity,
            has_high_priority_ticket,
        }))
    }

    /// Trips en un estado dado que salen dentro de la ventana `[from, to)`.
    pub async fn find_by_status_in_window(
        conn: &mut PgConnection,
        status: TripStatus,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE status = $1 AND departure_time >= $2 AND departure_time < $3
            ORDER BY departure_time
            "#,
        )
        .bind(status)
        .bind(from)
        .bind(to)
        .fetch_all(conn)
        .await?;

        Ok(trips)
    }

    /// Trips scheduled que salen después del instante dado. Universo de
    /// candidatos para combinar una solicitud con un trip existente.
    pub async fn find_scheduled_departing_after(
        conn: &mut PgConnection,
        after: DateTime<Utc>,
    ) -> AppResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE status = 'scheduled' AND departure_time > $1
            ORDER BY departure_time
            "#,
        )
        .bind(after)
        .fetch_all(conn)
        .await?;

        Ok(trips)
    }

    /// IDs de trips que transportan a una solicitud dada.
    pub async fn find_ids_by_booking_request(
        conn: &mut PgConnection,
        booking_request_id: &str,
    ) -> AppResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT trip_id FROM trip_tickets WHERE booking_request_id = $1",
        )
        .bind(booking_request_id)
        .fetch_all(conn)
        .await?;

        Ok(ids)
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: &str,
        status: TripStatus,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE trips SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_actual_departure(
        conn: &mut PgConnection,
        id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE trips SET status = 'on_going', actual_departure_time = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_actual_arrival(
        conn: &mut PgConnection,
        id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE trips SET status = 'completed', actual_arrival_time = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Borra el trip; paradas, tickets y schedules caen por cascada.
    pub async fn delete(conn: &mut PgConnection, id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
