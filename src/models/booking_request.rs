//! Modelo de BookingRequest
//!
//! Una solicitud de transporte (ida simple o ida y vuelta). En lugar de una
//! jerarquía de herencia, la fila lleva un discriminador `kind` y los campos
//! del tramo de regreso son opcionales (solo presentes para round_trip).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Tipo de solicitud - mapea al ENUM booking_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_kind", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingKind {
    OneWay,
    RoundTrip,
}

/// Estado de la solicitud - mapea al ENUM request_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Completed,
}

/// Prioridad de la solicitud - mapea al ENUM request_priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "request_priority", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Normal,
    Urgent,
    High,
}

/// BookingRequest principal - mapea a la tabla booking_requests
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingRequest {
    pub id: String,
    pub kind: BookingKind,
    pub status: RequestStatus,
    pub priority: Priority,
    pub number_of_passengers: i32,
    pub requester_id: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub trip_purpose: Option<String>,
    pub note: Option<String>,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub departure_location_id: String,
    pub arrival_location_id: String,
    pub is_reserved: bool,
    pub return_departure_time: Option<DateTime<Utc>>,
    pub return_arrival_time: Option<DateTime<Utc>>,
    pub return_departure_location_id: Option<String>,
    pub return_arrival_location_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BookingRequest {
    pub fn is_round_trip(&self) -> bool {
        self.kind == BookingKind::RoundTrip
    }

    /// Ventana completa que ocupa la solicitud: para round trip reservado
    /// el vehículo queda tomado hasta la llegada del regreso.
    pub fn occupancy_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        match self.return_arrival_time {
            Some(return_arrival) if self.is_round_trip() => {
                (self.departure_time, return_arrival)
            }
            _ => (self.departure_time, self.arrival_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_request() -> BookingRequest {
        BookingRequest {
            id: "BR-1".to_string(),
            kind: BookingKind::OneWay,
            status: RequestStatus::Pending,
            priority: Priority::Normal,
            number_of_passengers: 2,
            requester_id: "USR-1".to_string(),
            contact_name: "Ana".to_string(),
            contact_phone: "555-0100".to_string(),
            trip_purpose: None,
            note: None,
            departure_time: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
            arrival_time: Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap(),
            departure_location_id: "LOC-1".to_string(),
            arrival_location_id: "LOC-2".to_string(),
            is_reserved: false,
            return_departure_time: None,
            return_arrival_time: None,
            return_departure_location_id: None,
            return_arrival_location_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_occupancy_window_one_way() {
        let request = base_request();
        let (start, end) = request.occupancy_window();
        assert_eq!(start, request.departure_time);
        assert_eq!(end, request.arrival_time);
    }

    #[test]
    fn test_occupancy_window_round_trip_extends_to_return() {
        let mut request = base_request();
        request.kind = BookingKind::RoundTrip;
        request.return_departure_time =
            Some(Utc.with_ymd_and_hms(2025, 5, 2, 15, 0, 0).unwrap());
        request.return_arrival_time =
            Some(Utc.with_ymd_and_hms(2025, 5, 2, 17, 0, 0).unwrap());
        let (_, end) = request.occupancy_window();
        assert_eq!(end, request.return_arrival_time.unwrap());
    }
}
