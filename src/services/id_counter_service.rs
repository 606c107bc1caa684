//! Emisión de IDs legibles "PREFIX-N"
//!
//! El contador vive en la tabla id_counters y se toma con FOR UPDATE dentro
//! de la transacción del llamador. La variante en lote emite N números
//! consecutivos con un solo lock.

use sqlx::PgConnection;

use crate::repositories::id_counter_repository::IdCounterRepository;
use crate::utils::errors::{AppError, AppResult};

/// Clase de entidad que recibe IDs legibles
#[derive(Debug, Clone, Copy)]
pub struct IdKind {
    pub table_name: &'static str,
    pub prefix: &'static str,
}

pub const BOOKING_REQUESTS: IdKind = IdKind {
    table_name: "booking_requests",
    prefix: "BR",
};
pub const TRIPS: IdKind = IdKind {
    table_name: "trips",
    prefix: "TRP",
};
/// Trips provisionales (estado scheduling): ID temporal con prefijo propio
pub const SCHEDULING_TRIPS: IdKind = IdKind {
    table_name: "scheduling_trips",
    prefix: "TMP",
};
pub const TRIP_STOPS: IdKind = IdKind {
    table_name: "trip_stops",
    prefix: "STP",
};
pub const TRIP_TICKETS: IdKind = IdKind {
    table_name: "trip_tickets",
    prefix: "TKT",
};
pub const SCHEDULES: IdKind = IdKind {
    table_name: "schedules",
    prefix: "SCH",
};

pub async fn generate_id(conn: &mut PgConnection, kind: IdKind) -> AppResult<String> {
    let mut ids = generate_ids(conn, kind, 1).await?;
    ids.pop()
        .ok_or_else(|| AppError::Internal("id batch came back empty".to_string()))
}

pub async fn generate_ids(
    conn: &mut PgConnection,
    kind: IdKind,
    count: usize,
) -> AppResult<Vec<String>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    IdCounterRepository::ensure(&mut *conn, kind.table_name, kind.prefix).await?;
    let counter = IdCounterRepository::fetch_for_update(&mut *conn, kind.table_name)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!("id counter for '{}' missing", kind.table_name))
        })?;

    let start = counter.current_id + 1;
    let end = counter.current_id + count as i64;
    IdCounterRepository::advance(&mut *conn, kind.table_name, end).await?;

    Ok((start..=end)
        .map(|n| format!("{}-{}", counter.prefix, n))
        .collect())
}
