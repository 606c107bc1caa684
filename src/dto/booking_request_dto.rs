//! DTOs de booking requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::booking_request::{BookingKind, BookingRequest, Priority, RequestStatus};

/// Request para crear una nueva solicitud de transporte
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub kind: BookingKind,

    pub priority: Option<Priority>,

    #[validate(range(min = 1, max = 60))]
    pub number_of_passengers: i32,

    #[validate(length(min = 1, max = 100))]
    pub requester_id: String,

    #[validate(length(min = 1, max = 100))]
    pub contact_name: String,

    #[validate(length(min = 5, max = 20))]
    pub contact_phone: String,

    pub trip_purpose: Option<String>,
    pub note: Option<String>,

    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub departure_location_id: String,
    pub arrival_location_id: String,

    /// Solo para round trip: reservar el regreso como un bloque fijo
    #[serde(default)]
    pub is_reserved: bool,
    pub return_departure_time: Option<DateTime<Utc>>,
    pub return_arrival_time: Option<DateTime<Utc>>,
    pub return_departure_location_id: Option<String>,
    pub return_arrival_location_id: Option<String>,
}

/// Request para editar una solicitud existente (campos opcionales)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBookingRequest {
    pub priority: Option<Priority>,

    #[validate(range(min = 1, max = 60))]
    pub number_of_passengers: Option<i32>,

    #[validate(length(min = 1, max = 100))]
    pub contact_name: Option<String>,

    #[validate(length(min = 5, max = 20))]
    pub contact_phone: Option<String>,

    pub trip_purpose: Option<String>,
    pub note: Option<String>,

    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub departure_location_id: Option<String>,
    pub arrival_location_id: Option<String>,

    pub return_departure_time: Option<DateTime<Utc>>,
    pub return_arrival_time: Option<DateTime<Utc>>,
    pub return_departure_location_id: Option<String>,
    pub return_arrival_location_id: Option<String>,
}

/// Respuesta con la solicitud persistida
#[derive(Debug, Serialize)]
pub struct BookingRequestResponse {
    pub id: String,
    pub kind: BookingKind,
    pub status: RequestStatus,
    pub priority: Priority,
    pub number_of_passengers: i32,
    pub contact_name: String,
    pub contact_phone: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub departure_location_id: String,
    pub arrival_location_id: String,
    pub is_reserved: bool,
    pub return_departure_time: Option<DateTime<Utc>>,
    pub return_arrival_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<BookingRequest> for BookingRequestResponse {
    fn from(br: BookingRequest) -> Self {
        Self {
            id: br.id,
            kind: br.kind,
            status: br.status,
            priority: br.priority,
            number_of_passengers: br.number_of_passengers,
            contact_name: br.contact_name,
            contact_phone: br.contact_phone,
            departure_time: br.departure_time,
            arrival_time: br.arrival_time,
            departure_location_id: br.departure_location_id,
            arrival_location_id: br.arrival_location_id,
            is_reserved: br.is_reserved,
            return_departure_time: br.return_departure_time,
            return_arrival_time: br.return_arrival_time,
            created_at: br.created_at,
        }
    }
}
