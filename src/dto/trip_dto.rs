//! DTOs de trips

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::trip::{
    TicketStatus, Trip, TripDetail, TripStatus, TripStop, TripStopType, TripTicket,
};

/// Una parada pedida por el coordinador al crear un trip combinado
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopOrderRequest {
    pub stop_type: TripStopType,
    /// Orden 1-based dentro del trip
    pub order: i32,
    pub location_id: String,
}

/// Request para crear un trip combinado manualmente
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCombinedTripRequest {
    #[validate(length(min = 1, max = 100))]
    pub vehicle_id: String,

    #[validate(length(min = 2))]
    pub booking_request_ids: Vec<String>,

    pub departure_time: DateTime<Utc>,

    #[validate(length(min = 2))]
    pub trip_stop_orders: Vec<StopOrderRequest>,
}

/// Request para sumar una solicitud a un trip existente
#[derive(Debug, Deserialize, Validate)]
pub struct AddBookingRequestToTrip {
    #[validate(length(min = 1, max = 100))]
    pub booking_request_id: String,
}

#[derive(Debug, Serialize)]
pub struct TripStopResponse {
    pub id: String,
    pub stop_type: TripStopType,
    pub stop_order: i32,
    pub location_id: String,
    pub planned_arrival_time: DateTime<Utc>,
    pub actual_arrival_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TripTicketResponse {
    pub id: String,
    pub booking_request_id: String,
    pub ticket_status: TicketStatus,
    pub pickup_location_id: String,
    pub dropoff_location_id: String,
}

/// Respuesta detallada de un trip con paradas y tickets
#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: String,
    pub status: TripStatus,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub actual_departure_time: Option<DateTime<Utc>>,
    pub actual_arrival_time: Option<DateTime<Utc>>,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub outsourced_vehicle_id: Option<String>,
    pub stops: Vec<TripStopResponse>,
    pub tickets: Vec<TripTicketResponse>,
}

impl From<TripDetail> for TripResponse {
    fn from(detail: TripDetail) -> Self {
        let TripDetail {
            trip,
            stops,
            tickets,
            ..
        } = detail;
        Self::from_parts(trip, stops, tickets)
    }
}

impl TripResponse {
    pub fn from_parts(trip: Trip, stops: Vec<TripStop>, tickets: Vec<TripTicket>) -> Self {
        Self {
            id: trip.id,
            status: trip.status,
            departure_time: trip.departure_time,
            arrival_time: trip.arrival_time,
            actual_departure_time: trip.actual_departure_time,
            actual_arrival_time: trip.actual_arrival_time,
            driver_id: trip.driver_id,
            vehicle_id: trip.vehicle_id,
            outsourced_vehicle_id: trip.outsourced_vehicle_id,
            stops: stops
                .into_iter()
                .map(|s| TripStopResponse {
                    id: s.id,
                    stop_type: s.stop_type,
                    stop_order: s.stop_order,
                    location_id: s.location_id,
                    planned_arrival_time: s.planned_arrival_time,
                    actual_arrival_time: s.actual_arrival_time,
                })
                .collect(),
            tickets: tickets
                .into_iter()
                .map(|t| TripTicketResponse {
                    id: t.id,
                    booking_request_id: t.booking_request_id,
                    ticket_status: t.ticket_status,
                    pickup_location_id: t.pickup_location_id,
                    dropoff_location_id: t.dropoff_location_id,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stop_order(stop_type: TripStopType, order: i32, loc: &str) -> StopOrderRequest {
        StopOrderRequest {
            stop_type,
            order,
            location_id: loc.to_string(),
        }
    }

    #[test]
    fn test_create_combined_requires_two_stops_and_two_requests() {
        let valid = CreateCombinedTripRequest {
            vehicle_id: "VEH-1".to_string(),
            booking_request_ids: vec!["BR-1".to_string(), "BR-2".to_string()],
            departure_time: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
            trip_stop_orders: vec![
                stop_order(TripStopType::Pickup, 1, "LOC-A"),
                stop_order(TripStopType::DropOff, 2, "LOC-B"),
            ],
        };
        assert!(valid.validate().is_ok());

        let mut single_request = CreateCombinedTripRequest {
            booking_request_ids: vec!["BR-1".to_string()],
            ..valid
        };
        assert!(single_request.validate().is_err());

        single_request.booking_request_ids =
            vec!["BR-1".to_string(), "BR-2".to_string()];
        single_request.trip_stop_orders =
            vec![stop_order(TripStopType::Pickup, 1, "LOC-A")];
        assert!(single_request.validate().is_err());
    }

    #[test]
    fn test_add_booking_request_rejects_empty_id() {
        let payload = AddBookingRequestToTrip {
            booking_request_id: String::new(),
        };
        assert!(payload.validate().is_err());

        let ok = AddBookingRequestToTrip {
            booking_request_id: "BR-1".to_string(),
        };
        assert!(ok.validate().is_ok());
    }
}
