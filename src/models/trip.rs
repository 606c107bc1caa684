//! Modelos de Trip, TripStop y TripTicket
//!
//! Un trip es una corrida de vehículo con paradas ordenadas y tickets de
//! pasajero. Los trips en estado `scheduling` son provisionales y llevan un
//! ID temporal hasta que el finalizador (o una aprobación explícita) los
//! promueve a `scheduled` con ID permanente.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Estado del trip - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduling,
    Scheduled,
    OnGoing,
    Completed,
    Cancelled,
}

/// Tipo de parada - mapea al ENUM trip_stop_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "trip_stop_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStopType {
    Pickup,
    DropOff,
}

/// Estado del ticket - mapea al ENUM ticket_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Pending,
    PickedUp,
    DroppedOff,
    NoShow,
    Cancelled,
}

/// Trip principal - mapea a la tabla trips
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: String,
    pub status: TripStatus,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub actual_departure_time: Option<DateTime<Utc>>,
    pub actual_arrival_time: Option<DateTime<Utc>>,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub outsourced_vehicle_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Un trip fuera de `scheduling` debe tener vehículo propio o tercerizado
    pub fn has_assignment(&self) -> bool {
        self.vehicle_id.is_some() || self.outsourced_vehicle_id.is_some()
    }
}

/// Parada del trip - mapea a la tabla trip_stops
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripStop {
    pub id: String,
    pub trip_id: String,
    pub stop_type: TripStopType,
    pub stop_order: i32,
    pub location_id: String,
    pub planned_arrival_time: DateTime<Utc>,
    pub actual_arrival_time: Option<DateTime<Utc>>,
}

/// Ticket de pasajero - mapea a la tabla trip_tickets
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TripTicket {
    pub id: String,
    pub trip_id: String,
    pub booking_request_id: String,
    pub ticket_status: TicketStatus,
    pub pickup_time: DateTime<Utc>,
    pub dropoff_time: DateTime<Utc>,
    pub pickup_location_id: String,
    pub dropoff_location_id: String,
}

/// Trip con sus agregados cargados (paradas ordenadas, tickets y prioridad
/// máxima de sus solicitudes), tal como lo consumen el matcher y el
/// materializador.
#[derive(Debug, Clone)]
pub struct TripDetail {
    pub trip: Trip,
    pub stops: Vec<TripStop>,
    pub tickets: Vec<TripTicket>,
    pub vehicle_capacity: Option<i32>,
    pub has_high_priority_ticket: bool,
}

impl TripDetail {
    /// IDs de booking request distintos que financian este trip
    pub fn booking_request_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for ticket in &self.tickets {
            if !ids.contains(&ticket.booking_request_id) {
                ids.push(ticket.booking_request_id.clone());
            }
        }
        ids
    }

    /// true si el trip sirve a más de una solicitud (trip combinado)
    pub fn is_combined(&self) -> bool {
        self.booking_request_ids().len() > 1
    }
}
