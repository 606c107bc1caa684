//! Matching de solicitudes contra trips combinables
//!
//! Dada una solicitud one-way pendiente, busca trips ya agendados del mismo
//! día local a los que se pueda sumar sin violar el orden de paradas ni la
//! capacidad del vehículo. Funciones puras sobre agregados ya cargados.

use std::cmp::Ordering;

use crate::models::booking_request::{BookingKind, BookingRequest, RequestStatus};
use crate::models::trip::{TripDetail, TripStopType};
use crate::utils::time::date_key;

/// Comparador de desempate entre trips igualmente cercanos en hora de
/// llegada. El default conserva el orden de iteración de entrada.
pub type TieBreak = dyn Fn(&TripDetail, &TripDetail) -> Ordering;

/// Desempate por defecto: nunca prefiere al candidato nuevo, o sea gana el
/// primero encontrado en el orden de entrada.
pub fn keep_first_tie_break(_candidate: &TripDetail, _current: &TripDetail) -> Ordering {
    Ordering::Greater
}

/// Par de paradas (pickup, dropoff) del trip que sirven a la solicitud, con
/// pickup estrictamente antes que dropoff en el orden del recorrido. El
/// pickup se busca de adelante hacia atrás y el dropoff de atrás hacia
/// adelante, para maximizar la distancia entre ambos.
pub fn match_stops<'a>(
    request: &BookingRequest,
    detail: &'a TripDetail,
) -> Option<(&'a crate::models::trip::TripStop, &'a crate::models::trip::TripStop)> {
    let pickup = detail.stops.iter().find(|stop| {
        stop.stop_type == TripStopType::Pickup && stop.location_id == request.departure_location_id
    })?;
    let dropoff = detail.stops.iter().rev().find(|stop| {
        stop.stop_type == TripStopType::DropOff && stop.location_id == request.arrival_location_id
    })?;
    if pickup.stop_order < dropoff.stop_order {
        Some((pickup, dropoff))
    } else {
        None
    }
}

/// true si la solicitud puede sumarse al trip sin romper ningún invariante.
pub fn is_combinable(request: &BookingRequest, detail: &TripDetail, offset_hours: i32) -> bool {
    if request.kind != BookingKind::OneWay || request.status != RequestStatus::Pending {
        return false;
    }
    // Mismo día de calendario local que la solicitud
    if date_key(detail.trip.departure_time, offset_hours)
        != date_key(request.departure_time, offset_hours)
    {
        return false;
    }
    // Solo trips con vehículo propio y conductor ya asignados
    if detail.trip.vehicle_id.is_none() || detail.trip.driver_id.is_none() {
        return false;
    }
    if detail.has_high_priority_ticket {
        return false;
    }
    let capacity = match detail.vehicle_capacity {
        Some(c) => c,
        None => return false,
    };
    if detail.tickets.len() as i32 + request.number_of_passengers > capacity {
        return false;
    }
    match_stops(request, detail).is_some()
}

/// Todos los trips del universo dado a los que la solicitud podría sumarse,
/// en el orden de entrada.
pub fn find_combinable<'a>(
    request: &BookingRequest,
    trips: &'a [TripDetail],
    offset_hours: i32,
) -> Vec<&'a TripDetail> {
    trips
        .iter()
        .filter(|detail| is_combinable(request, detail, offset_hours))
        .collect()
}

/// Elige entre los trips elegibles el de hora de llegada más cercana a la de
/// la solicitud; los empates exactos se resuelven con el comparador dado.
pub fn select_best<'a>(
    request: &BookingRequest,
    eligible: &[&'a TripDetail],
    tie_break: &TieBreak,
) -> Option<&'a TripDetail> {
    let mut best: Option<(&TripDetail, i64)> = None;
    for candidate in eligible {
        let diff = (candidate.trip.arrival_time - request.arrival_time)
            .num_seconds()
            .abs();
        best = match best {
            None => Some((candidate, diff)),
            Some((current, best_diff)) => {
                if diff < best_diff
                    || (diff == best_diff && tie_break(candidate, current) == Ordering::Less)
                {
                    Some((candidate, diff))
                } else {
                    Some((current, best_diff))
                }
            }
        };
    }
    best.map(|(detail, _)| detail)
}

/// Candidato de combinación para una solicitud dentro del universo dado:
/// filtra los trips elegibles y se queda con el de llegada más cercana,
/// con el desempate por defecto.
pub fn pick_combination_target<'a>(
    request: &BookingRequest,
    trips: &'a [TripDetail],
    offset_hours: i32,
) -> Option<&'a TripDetail> {
    let eligible = find_combinable(request, trips, offset_hours);
    select_best(request, &eligible, &keep_first_tie_break)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking_request::Priority;
    use crate::models::trip::{Trip, TripStatus, TripStop};
    use chrono::{TimeZone, Utc};

    fn request(passengers: i32, from: &str, to: &str) -> BookingRequest {
        BookingRequest {
            id: "BR-1".to_string(),
            kind: BookingKind::OneWay,
            status: RequestStatus::Pending,
            priority: Priority::Normal,
            number_of_passengers: passengers,
            requester_id: "USR-1".to_string(),
            contact_name: "Ana".to_string(),
            contact_phone: "555-0100".to_string(),
            trip_purpose: None,
            note: None,
            departure_time: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
            arrival_time: Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap(),
            departure_location_id: from.to_string(),
            arrival_location_id: to.to_string(),
            is_reserved: false,
            return_departure_time: None,
            return_arrival_time: None,
            return_departure_location_id: None,
            return_arrival_location_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    fn stop(trip_id: &str, stop_type: TripStopType, order: i32, location: &str) -> TripStop {
        TripStop {
            id: format!("STP-{}-{}", trip_id, order),
            trip_id: trip_id.to_string(),
            stop_type,
            stop_order: order,
            location_id: location.to_string(),
            planned_arrival_time: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
            actual_arrival_time: None,
        }
    }

    fn detail(id: &str, arrival_hour: u32, capacity: i32) -> TripDetail {
        TripDetail {
            trip: Trip {
                id: id.to_string(),
                status: TripStatus::Scheduled,
                departure_time: Utc.with_ymd_and_hms(2025, 5, 2, 7, 0, 0).unwrap(),
                arrival_time: Utc.with_ymd_and_hms(2025, 5, 2, arrival_hour, 0, 0).unwrap(),
                actual_departure_time: None,
                actual_arrival_time: None,
                driver_id: Some("DRV-1".to_string()),
                vehicle_id: Some("VEH-1".to_string()),
                outsourced_vehicle_id: None,
                created_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            },
            stops: vec![
                stop(id, TripStopType::Pickup, 1, "LOC-A"),
                stop(id, TripStopType::Pickup, 2, "LOC-B"),
                stop(id, TripStopType::DropOff, 3, "LOC-C"),
                stop(id, TripStopType::DropOff, 4, "LOC-D"),
            ],
            tickets: Vec::new(),
            vehicle_capacity: Some(capacity),
            has_high_priority_ticket: false,
        }
    }

    #[test]
    fn test_pickup_must_precede_dropoff() {
        // LOC-C es dropoff en orden 3 y LOC-A pickup en orden 1: combinable
        let ok = request(1, "LOC-A", "LOC-C");
        // Pedir subir en un dropoff no matchea ninguna parada pickup
        let bad = request(1, "LOC-C", "LOC-A");
        let trip = detail("TRP-1", 10, 4);
        assert!(match_stops(&ok, &trip).is_some());
        assert!(match_stops(&bad, &trip).is_none());
    }

    #[test]
    fn test_pickup_after_dropoff_in_route_is_rejected() {
        let mut trip = detail("TRP-1", 10, 4);
        // Recorrido que deja pasajeros antes de levantar en LOC-B
        trip.stops = vec![
            stop("TRP-1", TripStopType::Pickup, 1, "LOC-A"),
            stop("TRP-1", TripStopType::DropOff, 2, "LOC-C"),
            stop("TRP-1", TripStopType::Pickup, 3, "LOC-B"),
            stop("TRP-1", TripStopType::DropOff, 4, "LOC-D"),
        ];
        let req = request(1, "LOC-B", "LOC-C");
        assert!(match_stops(&req, &trip).is_none());
        assert!(!is_combinable(&req, &trip, 7));
    }

    #[test]
    fn test_capacity_and_high_priority_exclusions() {
        let req = request(3, "LOC-A", "LOC-C");

        let small = detail("TRP-1", 10, 2);
        assert!(!is_combinable(&req, &small, 7));

        let mut high = detail("TRP-2", 10, 6);
        high.has_high_priority_ticket = true;
        assert!(!is_combinable(&req, &high, 7));

        let ok = detail("TRP-3", 10, 6);
        assert!(is_combinable(&req, &ok, 7));
    }

    #[test]
    fn test_rejects_other_calendar_date() {
        let req = request(1, "LOC-A", "LOC-C");
        let mut trip = detail("TRP-1", 10, 4);
        trip.trip.departure_time = Utc.with_ymd_and_hms(2025, 5, 3, 7, 0, 0).unwrap();
        trip.trip.arrival_time = Utc.with_ymd_and_hms(2025, 5, 3, 10, 0, 0).unwrap();
        assert!(!is_combinable(&req, &trip, 7));
    }

    #[test]
    fn test_selects_closest_arrival() {
        let req = request(1, "LOC-A", "LOC-C");
        let trips = vec![detail("TRP-1", 13, 4), detail("TRP-2", 11, 4)];
        let eligible = find_combinable(&req, &trips, 7);
        let best = select_best(&req, &eligible, &keep_first_tie_break).unwrap();
        assert_eq!(best.trip.id, "TRP-2");
    }

    #[test]
    fn test_tie_break_keeps_input_order_by_default() {
        let req = request(1, "LOC-A", "LOC-C");
        // Llegadas equidistantes de las 10:00 (09:00 y 11:00)
        let trips = vec![detail("TRP-1", 9, 4), detail("TRP-2", 11, 4)];
        let eligible = find_combinable(&req, &trips, 7);
        let best = select_best(&req, &eligible, &keep_first_tie_break).unwrap();
        assert_eq!(best.trip.id, "TRP-1");
    }

    #[test]
    fn test_pick_combination_target_prefers_closest_arrival() {
        let req = request(1, "LOC-A", "LOC-C");
        let trips = vec![
            detail("TRP-1", 13, 4),
            detail("TRP-2", 11, 4),
            detail("TRP-3", 12, 4),
        ];
        let best = pick_combination_target(&req, &trips, 7).unwrap();
        assert_eq!(best.trip.id, "TRP-2");
    }

    #[test]
    fn test_pick_combination_target_none_when_nothing_fits() {
        // Ningún trip sirve el par de paradas pedido
        let req = request(1, "LOC-C", "LOC-A");
        let trips = vec![detail("TRP-1", 10, 4)];
        assert!(pick_combination_target(&req, &trips, 7).is_none());
    }

    #[test]
    fn test_injected_tie_break_can_prefer_later_candidate() {
        let req = request(1, "LOC-A", "LOC-C");
        let trips = vec![detail("TRP-1", 9, 4), detail("TRP-2", 11, 4)];
        let eligible = find_combinable(&req, &trips, 7);
        let prefer_by_id = |a: &TripDetail, b: &TripDetail| a.trip.id.cmp(&b.trip.id).reverse();
        let best = select_best(&req, &eligible, &prefer_by_id).unwrap();
        assert_eq!(best.trip.id, "TRP-2");
    }
}
