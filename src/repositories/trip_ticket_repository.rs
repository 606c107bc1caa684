//! Repositorio de tickets de pasajero

use sqlx::PgConnection;

use crate::models::trip::{TicketStatus, TripTicket};
use crate::utils::errors::AppResult;

pub struct TripTicketRepository;

impl TripTicketRepository {
    pub async fn create(conn: &mut PgConnection, ticket: &TripTicket) -> AppResult<TripTicket> {
        let created = sqlx::query_as::<_, TripTicket>(
            r#"
            INSERT INTO trip_tickets (
                id, trip_id, booking_request_id, ticket_status,
                pickup_time, dropoff_time, pickup_location_id, dropoff_location_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&ticket.id)
        .bind(&ticket.trip_id)
        .bind(&ticket.booking_request_id)
        .bind(ticket.ticket_status)
        .bind(ticket.pickup_time)
        .bind(ticket.dropoff_time)
        .bind(&ticket.pickup_location_id)
        .bind(&ticket.dropoff_location_id)
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    pub async fn find_by_trip(
        conn: &mut PgConnection,
        trip_id: &str,
    ) -> AppResult<Vec<TripTicket>> {
        let tickets = sqlx::query_as::<_, TripTicket>(
            "SELECT * FROM trip_tickets WHERE trip_id = $1 ORDER BY pickup_time",
        )
        .bind(trip_id)
        .fetch_all(conn)
        .await?;

        Ok(tickets)
    }

    /// Mueve todos los tickets de un trip provisional al trip definitivo.
    pub async fn reparent(
        conn: &mut PgConnection,
        from_trip_id: &str,
        to_trip_id: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE trip_tickets SET trip_id = $2 WHERE trip_id = $1")
            .bind(from_trip_id)
            .bind(to_trip_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_status_by_trip(
        conn: &mut PgConnection,
        trip_id: &str,
        status: TicketStatus,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE trip_tickets SET ticket_status = $2 WHERE trip_id = $1")
            .bind(trip_id)
            .bind(status)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Los tickets aún pendientes de un trip que arranca pasan a picked_up
    pub async fn mark_picked_up(conn: &mut PgConnection, trip_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE trip_tickets SET ticket_status = $2 WHERE trip_id = $1 AND ticket_status = $3",
        )
        .bind(trip_id)
        .bind(TicketStatus::PickedUp)
        .bind(TicketStatus::Pending)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Los tickets abiertos de un trip que termina pasan a dropped_off
    pub async fn mark_dropped_off(conn: &mut PgConnection, trip_id: &str) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE trip_tickets SET ticket_status = $2
            WHERE trip_id = $1 AND ticket_status IN ($3, $4)
            "#,
        )
        .bind(trip_id)
        .bind(TicketStatus::DroppedOff)
        .bind(TicketStatus::Pending)
        .bind(TicketStatus::PickedUp)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_for_request_in_trip(
        conn: &mut PgConnection,
        trip_id: &str,
        booking_request_id: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM trip_tickets WHERE trip_id = $1 AND booking_request_id = $2",
        )
        .bind(trip_id)
        .bind(booking_request_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

}
