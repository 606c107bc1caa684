//! Repositorio de booking requests
//!
//! Todas las funciones reciben `&mut PgConnection`: el llamador decide la
//! unidad de trabajo (transacción o conexión suelta del pool).

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::models::booking_request::{BookingRequest, RequestStatus};
use crate::utils::errors::AppResult;

pub struct BookingRequestRepository;

impl BookingRequestRepository {
    pub async fn create(
        conn: &mut PgConnection,
        request: &BookingRequest,
    ) -> AppResult<BookingRequest> {
        let created = sqlx::query_as::<_, BookingRequest>(
            r#"
            INSERT INTO booking_requests (
                id, kind, status, priority, number_of_passengers, requester_id,
                contact_name, contact_phone, trip_purpose, note,
                departure_time, arrival_time, departure_location_id, arrival_location_id,
                is_reserved, return_departure_time, return_arrival_time,
                return_departure_location_id, return_arrival_location_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(&request.id)
        .bind(request.kind)
        .bind(request.status)
        .bind(request.priority)
        .bind(request.number_of_passengers)
        .bind(&request.requester_id)
        .bind(&request.contact_name)
        .bind(&request.contact_phone)
        .bind(&request.trip_purpose)
        .bind(&request.note)
        .bind(request.departure_time)
        .bind(request.arrival_time)
        .bind(&request.departure_location_id)
        .bind(&request.arrival_location_id)
        .bind(request.is_reserved)
        .bind(request.return_departure_time)
        .bind(request.return_arrival_time)
        .bind(&request.return_departure_location_id)
        .bind(&request.return_arrival_location_id)
        .bind(request.created_at)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: &str,
    ) -> AppResult<Option<BookingRequest>> {
        let request =
            sqlx::query_as::<_, BookingRequest>("SELECT * FROM booking_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await?;

        Ok(request)
    }

    pub async fn find_many_by_ids(
        conn: &mut PgConnection,
        ids: &[String],
    ) -> AppResult<Vec<BookingRequest>> {
        let requests = sqlx::query_as::<_, BookingRequest>(
            "SELECT * FROM booking_requests WHERE id = ANY($1) ORDER BY departure_time",
        )
        .bind(ids)
        .fetch_all(conn)
        .await?;

        Ok(requests)
    }

    /// Solicitudes pendientes cuya llegada cae dentro de la ventana dada.
    /// Es el universo que consume la corrida nocturna del optimizador.
    pub async fn find_pending_in_window(
        conn: &mut PgConnection,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<BookingRequest>> {
        let requests = sqlx::query_as::<_, BookingRequest>(
            r#"
            SELECT * FROM booking_requests
            WHERE status = 'pending' AND arrival_time >= $1 AND arrival_time < $2
            ORDER BY arrival_time
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(conn)
        .await?;

        Ok(requests)
    }

    pub async fn update(
        conn: &mut PgConnection,
        request: &BookingRequest,
    ) -> AppResult<BookingRequest> {
        let updated = sqlx::query_as::<_, BookingRequest>(
            r#"
            UPDATE booking_requests SET
                priority = $2,
                number_of_passengers = $3,
                contact_name = $4,
                contact_phone = $5,
                trip_purpose = $6,
                note = $7,
                departure_time = $8,
                arrival_time = $9,
                departure_location_id = $10,
                arrival_location_id = $11,
                return_departure_time = $12,
                return_arrival_time = $13,
                return_departure_location_id = $14,
                return_arrival_location_id = $15
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(&request.id)
        .bind(request.priority)
        .bind(request.number_of_passengers)
        .bind(&request.contact_name)
        .bind(&request.contact_phone)
        .bind(&request.trip_purpose)
        .bind(&request.note)
        .bind(request.departure_time)
        .bind(request.arrival_time)
        .bind(&request.departure_location_id)
        .bind(&request.arrival_location_id)
        .bind(request.return_departure_time)
        .bind(request.return_arrival_time)
        .bind(&request.return_departure_location_id)
        .bind(&request.return_arrival_location_id)
        .fetch_one(conn)
        .await?;

        Ok(updated)
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: &str,
        status: RequestStatus,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE booking_requests SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(conn: &mut PgConnection, id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM booking_requests WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_status_many(
        conn: &mut PgConnection,
        ids: &[String],
        status: RequestStatus,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE booking_requests SET status = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
