//! Materialización y ciclo de vida de trips
//!
//! Convierte una solicitud (más el vehículo elegido) o un resultado del
//! solver en agregados Trip/TripStop/TripTicket/Schedule persistidos, y
//! maneja la máquina de estados del trip. Todas las funciones reciben
//! `&mut PgConnection`: el llamador abre la transacción y cualquier error
//! aborta la secuencia completa, nunca queda un trip a medias.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgConnection;

use crate::dto::optimizer_dto::{OptimizedTrip, RoutePointType};
use crate::dto::trip_dto::StopOrderRequest;
use crate::models::booking_request::{BookingRequest, RequestStatus};
use crate::models::location::Location;
use crate::models::schedule::Schedule;
use crate::models::trip::{
    TicketStatus, Trip, TripDetail, TripStatus, TripStop, TripStopType, TripTicket,
};
use crate::models::vehicle::{DriverAvailability, TripAssignment};
use crate::repositories::booking_request_repository::BookingRequestRepository;
use crate::repositories::location_repository::LocationRepository;
use crate::repositories::schedule_repository::ScheduleRepository;
use crate::repositories::trip_repository::TripRepository;
use crate::repositories::trip_stop_repository::TripStopRepository;
use crate::repositories::trip_ticket_repository::TripTicketRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::id_counter_service;
use crate::services::routing_service::RouteEstimator;
use crate::services::trip_matching_service;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Caída al estimar la llegada de una parada sin ETA del solver
const ETA_FALLBACK_MINUTES: i64 = 10;
/// Permanencia en cada parada al reconstruir la ruta del solver
const STOP_DWELL_MINUTES: i64 = 5;

/// Un tramo de viaje: ida, o regreso de un round trip
#[derive(Debug, Clone)]
struct Leg {
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    from_location_id: String,
    to_location_id: String,
}

fn legs_for(request: &BookingRequest) -> Vec<Leg> {
    let mut legs = vec![Leg {
        departure_time: request.departure_time,
        arrival_time: request.arrival_time,
        from_location_id: request.departure_location_id.clone(),
        to_location_id: request.arrival_location_id.clone(),
    }];
    if request.is_round_trip() {
        if let (Some(dep), Some(arr), Some(from), Some(to)) = (
            request.return_departure_time,
            request.return_arrival_time,
            request.return_departure_location_id.clone(),
            request.return_arrival_location_id.clone(),
        ) {
            legs.push(Leg {
                departure_time: dep,
                arrival_time: arr,
                from_location_id: from,
                to_location_id: to,
            });
        }
    }
    legs
}

async fn insert_stop(
    conn: &mut PgConnection,
    trip_id: &str,
    stop_type: TripStopType,
    order: i32,
    location_id: &str,
    planned_arrival: DateTime<Utc>,
) -> AppResult<TripStop> {
    let id = id_counter_service::generate_id(&mut *conn, id_counter_service::TRIP_STOPS).await?;
    TripStopRepository::create(
        conn,
        &TripStop {
            id,
            trip_id: trip_id.to_string(),
            stop_type,
            stop_order: order,
            location_id: location_id.to_string(),
            planned_arrival_time: planned_arrival,
            actual_arrival_time: None,
        },
    )
    .await
}

/// Un ticket por pasajero de la solicitud, todos con el mismo par de paradas
async fn insert_tickets(
    conn: &mut PgConnection,
    trip_id: &str,
    request: &BookingRequest,
    pickup_time: DateTime<Utc>,
    dropoff_time: DateTime<Utc>,
    pickup_location_id: &str,
    dropoff_location_id: &str,
) -> AppResult<Vec<TripTicket>> {
    let ids = id_counter_service::generate_ids(
        &mut *conn,
        id_counter_service::TRIP_TICKETS,
        request.number_of_passengers as usize,
    )
    .await?;

    let mut tickets = Vec::with_capacity(ids.len());
    for id in ids {
        let ticket = TripTicketRepository::create(
            &mut *conn,
            &TripTicket {
                id,
                trip_id: trip_id.to_string(),
                booking_request_id: request.id.clone(),
                ticket_status: TicketStatus::Pending,
                pickup_time,
                dropoff_time,
                pickup_location_id: pickup_location_id.to_string(),
                dropoff_location_id: dropoff_location_id.to_string(),
            },
        )
        .await?;
        tickets.push(ticket);
    }
    Ok(tickets)
}

async fn insert_schedule(
    conn: &mut PgConnection,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    driver_id: Option<String>,
    vehicle_id: Option<String>,
    trip_id: Option<String>,
) -> AppResult<Schedule> {
    let id = id_counter_service::generate_id(&mut *conn, id_counter_service::SCHEDULES).await?;
    ScheduleRepository::create(
        conn,
        &Schedule {
            id,
            title,
            description: None,
            start_time: start,
            end_time: end,
            driver_id,
            vehicle_id,
            trip_id,
        },
    )
    .await
}

async fn build_leg_trip(
    conn: &mut PgConnection,
    request: &BookingRequest,
    assignment: &TripAssignment,
    leg: &Leg,
    status: TripStatus,
) -> AppResult<Trip> {
    let id_kind = match status {
        TripStatus::Scheduling => id_counter_service::SCHEDULING_TRIPS,
        _ => id_counter_service::TRIPS,
    };
    let trip_id = id_counter_service::generate_id(&mut *conn, id_kind).await?;

    let trip = TripRepository::create(
        &mut *conn,
        &Trip {
            id: trip_id.clone(),
            status,
            departure_time: leg.departure_time,
            arrival_time: leg.arrival_time,
            actual_departure_time: None,
            actual_arrival_time: None,
            driver_id: assignment.driver_id().map(|s| s.to_string()),
            vehicle_id: assignment.vehicle_id().map(|s| s.to_string()),
            outsourced_vehicle_id: assignment.outsourced_id().map(|s| s.to_string()),
            created_at: Utc::now(),
        },
    )
    .await?;

    insert_stop(
        &mut *conn,
        &trip_id,
        TripStopType::Pickup,
        1,
        &leg.from_location_id,
        leg.departure_time,
    )
    .await?;
    insert_stop(
        &mut *conn,
        &trip_id,
        TripStopType::DropOff,
        2,
        &leg.to_location_id,
        leg.arrival_time,
    )
    .await?;

    insert_tickets(
        &mut *conn,
        &trip_id,
        request,
        leg.departure_time,
        leg.arrival_time,
        &leg.from_location_id,
        &leg.to_location_id,
    )
    .await?;

    Ok(trip)
}

/// Materializa la solicitud como trip(s) provisionales (estado scheduling,
/// ID temporal, sin schedule). Un round trip produce un trip por tramo.
pub async fn create_scheduling_trips(
    conn: &mut PgConnection,
    request: &BookingRequest,
    assignment: &TripAssignment,
) -> AppResult<Vec<Trip>> {
    if assignment.capacity() < request.number_of_passengers {
        return Err(AppError::Conflict(format!(
            "Vehicle capacity {} cannot take {} passengers",
            assignment.capacity(),
            request.number_of_passengers
        )));
    }

    let mut trips = Vec::new();
    for leg in legs_for(request) {
        let trip =
            build_leg_trip(&mut *conn, request, assignment, &leg, TripStatus::Scheduling).await?;
        trips.push(trip);
    }
    log::info!(
        "🚐 Solicitud {} materializada en {} trip(s) provisionales",
        request.id,
        trips.len()
    );
    Ok(trips)
}

/// Materializa la solicitud directamente como trip(s) agendados, con su
/// schedule por tramo. Para round trips reservados agrega además un bloque
/// "buffer" entre la llegada de la ida y la salida del regreso, para que el
/// vehículo no se tome en ese hueco.
pub async fn create_scheduled_trips(
    conn: &mut PgConnection,
    request: &BookingRequest,
    assignment: &TripAssignment,
) -> AppResult<Vec<Trip>> {
    if assignment.capacity() < request.number_of_passengers {
        return Err(AppError::Conflict(format!(
            "Vehicle capacity {} cannot take {} passengers",
            assignment.capacity(),
            request.number_of_passengers
        )));
    }

    let legs = legs_for(request);
    let mut trips = Vec::new();
    for leg in &legs {
        let trip =
            build_leg_trip(&mut *conn, request, assignment, leg, TripStatus::Scheduled).await?;
        insert_schedule(
            &mut *conn,
            format!("Trip {}", trip.id),
            leg.departure_time,
            leg.arrival_time,
            assignment.driver_id().map(|s| s.to_string()),
            assignment.vehicle_id().map(|s| s.to_string()),
            Some(trip.id.clone()),
        )
        .await?;
        trips.push(trip);
    }

    if request.is_reserved && legs.len() == 2 {
        let gap_start = legs[0].arrival_time;
        let gap_end = legs[1].departure_time;
        if gap_start < gap_end {
            insert_schedule(
                &mut *conn,
                format!("Reserved wait for {}", request.id),
                gap_start,
                gap_end,
                assignment.driver_id().map(|s| s.to_string()),
                assignment.vehicle_id().map(|s| s.to_string()),
                None,
            )
            .await?;
        }
    }

    Ok(trips)
}

/// Crea un trip combinado con el orden de paradas que eligió el coordinador.
/// La llegada planificada de cada parada posterior a la primera se estima
/// acumulando la duración de ruta entre paradas consecutivas.
pub async fn create_combined_trip(
    conn: &mut PgConnection,
    vehicle_id: &str,
    requests: &[BookingRequest],
    departure_time: DateTime<Utc>,
    stop_orders: &[StopOrderRequest],
    estimator: &dyn RouteEstimator,
) -> AppResult<Trip> {
    // El ID puede referir a un vehículo propio (con conductor) o, si no
    // existe en la flota, a uno tercerizado (sin conductor propio)
    let assignment = match VehicleRepository::find_by_id(&mut *conn, vehicle_id).await? {
        Some(vehicle) => {
            let driver_id = vehicle
                .driver_id
                .clone()
                .ok_or_else(|| AppError::Conflict("Vehicle has no assigned driver".to_string()))?;
            let driver = VehicleRepository::find_driver(&mut *conn, &driver_id)
                .await?
                .ok_or_else(|| not_found_error("Driver", &driver_id))?;
            TripAssignment::Company { vehicle, driver }
        }
        None => {
            let outsourced = VehicleRepository::find_outsourced_by_id(&mut *conn, vehicle_id)
                .await?
                .ok_or_else(|| not_found_error("Vehicle", vehicle_id))?;
            TripAssignment::Outsourced(outsourced)
        }
    };

    let total_passengers: i32 = requests.iter().map(|r| r.number_of_passengers).sum();
    if total_passengers > assignment.capacity() {
        return Err(AppError::Conflict(format!(
            "Combined trip needs {} seats but vehicle {} has {}",
            total_passengers, vehicle_id, assignment.capacity()
        )));
    }

    let mut ordered: Vec<&StopOrderRequest> = stop_orders.iter().collect();
    ordered.sort_by_key(|s| s.order);

    let location_ids: Vec<String> = ordered.iter().map(|s| s.location_id.clone()).collect();
    let locations = LocationRepository::find_many_by_ids(&mut *conn, &location_ids).await?;
    let location_by_id: HashMap<&str, &Location> =
        locations.iter().map(|l| (l.id.as_str(), l)).collect();
    for id in &location_ids {
        if !location_by_id.contains_key(id.as_str()) {
            return Err(not_found_error("Location", id));
        }
    }

    // Reloj corrido: cada parada llega la duración estimada después de la anterior
    let mut planned_times = Vec::with_capacity(ordered.len());
    let mut clock = departure_time;
    planned_times.push(clock);
    for pair in ordered.windows(2) {
        let from = location_by_id[pair[0].location_id.as_str()];
        let to = location_by_id[pair[1].location_id.as_str()];
        let details = estimator.estimate_route_details(from, to).await?;
        clock += Duration::seconds((details.duration_minutes * 60.0).round() as i64);
        planned_times.push(clock);
    }
    let arrival_time = *planned_times.last().unwrap_or(&departure_time);

    let trip_id = id_counter_service::generate_id(&mut *conn, id_counter_service::TRIPS).await?;
    let trip = TripRepository::create(
        &mut *conn,
        &Trip {
            id: trip_id.clone(),
            status: TripStatus::Scheduled,
            departure_time,
            arrival_time,
            actual_departure_time: None,
            actual_arrival_time: None,
            driver_id: assignment.driver_id().map(|s| s.to_string()),
            vehicle_id: assignment.vehicle_id().map(|s| s.to_string()),
            outsourced_vehicle_id: assignment.outsourced_id().map(|s| s.to_string()),
            created_at: Utc::now(),
        },
    )
    .await?;

    let mut stops = Vec::with_capacity(ordered.len());
    for (i, (order, planned)) in ordered.iter().zip(&planned_times).enumerate() {
        let stop = insert_stop(
            &mut *conn,
            &trip_id,
            order.stop_type,
            (i + 1) as i32,
            &order.location_id,
            *planned,
        )
        .await?;
        stops.push(stop);
    }

    for request in requests {
        let (pickup, dropoff) = ticket_stops_for(request, &stops)?;
        insert_tickets(
            &mut *conn,
            &trip_id,
            request,
            pickup.planned_arrival_time,
            dropoff.planned_arrival_time,
            &pickup.location_id,
            &dropoff.location_id,
        )
        .await?;
        BookingRequestRepository::set_status(&mut *conn, &request.id, RequestStatus::Approved)
            .await?;
    }

    insert_schedule(
        &mut *conn,
        format!("Trip {}", trip_id),
        departure_time,
        arrival_time,
        assignment.driver_id().map(|s| s.to_string()),
        assignment.vehicle_id().map(|s| s.to_string()),
        Some(trip_id.clone()),
    )
    .await?;

    log::info!(
        "🧩 Trip combinado {} creado para {} solicitudes",
        trip_id,
        requests.len()
    );
    Ok(trip)
}

/// Paradas (pickup, dropoff) de la secuencia que sirven a la solicitud, con
/// pickup estrictamente antes del dropoff
fn ticket_stops_for<'a>(
    request: &BookingRequest,
    stops: &'a [TripStop],
) -> AppResult<(&'a TripStop, &'a TripStop)> {
    let pickup = stops
        .iter()
        .find(|s| {
            s.stop_type == TripStopType::Pickup
                && s.location_id == request.departure_location_id
        })
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "No pickup stop matches booking request {}",
                request.id
            ))
        })?;
    let dropoff = stops
        .iter()
        .rev()
        .find(|s| {
            s.stop_type == TripStopType::DropOff
                && s.location_id == request.arrival_location_id
        })
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "No dropoff stop matches booking request {}",
                request.id
            ))
        })?;
    if pickup.stop_order >= dropoff.stop_order {
        return Err(AppError::BadRequest(format!(
            "Pickup stop for {} comes after its dropoff",
            request.id
        )));
    }
    Ok((pickup, dropoff))
}

fn coordinate_key(latitude: f64, longitude: f64) -> String {
    format!("{:.6},{:.6}", latitude, longitude)
}

/// Reconstruye un trip a partir de una propuesta del solver, re-atando cada
/// punto de ruta a su location por ID o, si el solver no lo trae, por
/// coordenadas redondeadas a 6 decimales. Devuelve None si la propuesta
/// viene sin vehículo (se descarta, no es fatal para el resto del lote).
pub async fn create_trip_from_optimizer_result(
    conn: &mut PgConnection,
    optimized: &OptimizedTrip,
    requests_by_id: &HashMap<String, BookingRequest>,
) -> AppResult<Option<Trip>> {
    let vehicle_id = match &optimized.vehicle_id {
        Some(id) => id.clone(),
        None => {
            log::warn!("⚠️ El solver devolvió un trip sin vehículo, se descarta");
            return Ok(None);
        }
    };
    let vehicle = VehicleRepository::find_by_id(&mut *conn, &vehicle_id)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", &vehicle_id))?;
    let driver_id = vehicle
        .driver_id
        .clone()
        .ok_or_else(|| AppError::Conflict("Vehicle has no assigned driver".to_string()))?;

    let requests: Vec<&BookingRequest> = optimized
        .combined_request_ids
        .iter()
        .map(|id| {
            requests_by_id
                .get(id)
                .ok_or_else(|| not_found_error("BookingRequest", id))
        })
        .collect::<AppResult<_>>()?;

    // Índice por coordenadas de las locations involucradas, para los puntos
    // de ruta que vienen sin location_id
    let mut location_ids: Vec<String> = Vec::new();
    for request in &requests {
        for id in [
            request.departure_location_id.clone(),
            request.arrival_location_id.clone(),
        ] {
            if !location_ids.contains(&id) {
                location_ids.push(id);
            }
        }
    }
    let locations = LocationRepository::find_many_by_ids(&mut *conn, &location_ids).await?;
    let by_coordinates: HashMap<String, &Location> = locations
        .iter()
        .map(|l| (coordinate_key(l.latitude, l.longitude), l))
        .collect();

    let trip_id = id_counter_service::generate_id(&mut *conn, id_counter_service::TRIPS).await?;
    let trip = TripRepository::create(
        &mut *conn,
        &Trip {
            id: trip_id.clone(),
            status: TripStatus::Scheduled,
            departure_time: optimized.trip_start_time,
            arrival_time: optimized.trip_end_time,
            actual_departure_time: None,
            actual_arrival_time: None,
            driver_id: Some(driver_id.clone()),
            vehicle_id: Some(vehicle.id.clone()),
            outsourced_vehicle_id: None,
            created_at: Utc::now(),
        },
    )
    .await?;

    let mut stops: Vec<TripStop> = Vec::new();
    let mut clock = optimized.trip_start_time;
    let mut order = 1;
    for point in &optimized.route {
        let stop_type = match point.point_type {
            RoutePointType::Start => continue, // la base del vehículo no es parada
            RoutePointType::Pickup => TripStopType::Pickup,
            RoutePointType::Dropoff => TripStopType::DropOff,
        };
        let location_id = match &point.location_id {
            Some(id) => id.clone(),
            None => by_coordinates
                .get(&coordinate_key(point.latitude, point.longitude))
                .map(|l| l.id.clone())
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "No location matches route point ({}, {})",
                        point.latitude, point.longitude
                    ))
                })?,
        };
        let arrival = point
            .estimated_arrival_time
            .unwrap_or(clock + Duration::minutes(ETA_FALLBACK_MINUTES));
        let stop =
            insert_stop(&mut *conn, &trip_id, stop_type, order, &location_id, arrival).await?;
        stops.push(stop);
        clock = arrival + Duration::minutes(STOP_DWELL_MINUTES);
        order += 1;
    }

    for request in &requests {
        let (pickup, dropoff) = ticket_stops_for(request, &stops)?;
        insert_tickets(
            &mut *conn,
            &trip_id,
            request,
            pickup.planned_arrival_time,
            dropoff.planned_arrival_time,
            &pickup.location_id,
            &dropoff.location_id,
        )
        .await?;
        BookingRequestRepository::set_status(&mut *conn, &request.id, RequestStatus::Approved)
            .await?;
    }

    insert_schedule(
        &mut *conn,
        format!("Trip {}", trip_id),
        optimized.trip_start_time,
        optimized.trip_end_time,
        Some(driver_id),
        Some(vehicle.id.clone()),
        Some(trip_id.clone()),
    )
    .await?;

    Ok(Some(trip))
}

/// Suma una solicitud ya validada por el matcher a un trip agendado
pub async fn add_request_to_trip(
    conn: &mut PgConnection,
    request: &BookingRequest,
    detail: &TripDetail,
) -> AppResult<()> {
    let capacity = detail
        .vehicle_capacity
        .ok_or_else(|| AppError::Conflict("Trip has no vehicle capacity".to_string()))?;
    if detail.tickets.len() as i32 + request.number_of_passengers > capacity {
        return Err(AppError::Conflict(format!(
            "Trip {} cannot take {} more passengers",
            detail.trip.id, request.number_of_passengers
        )));
    }
    let (pickup, dropoff) = trip_matching_service::match_stops(request, detail)
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Trip {} has no usable stop pair for request {}",
                detail.trip.id, request.id
            ))
        })?;

    insert_tickets(
        &mut *conn,
        &detail.trip.id,
        request,
        pickup.planned_arrival_time,
        dropoff.planned_arrival_time,
        &pickup.location_id,
        &dropoff.location_id,
    )
    .await?;
    BookingRequestRepository::set_status(&mut *conn, &request.id, RequestStatus::Approved).await?;
    Ok(())
}

/// Deshace un trip combinado: cada solicitud vuelve a PENDING y el trip se
/// borra con sus paradas, tickets y schedule.
pub async fn uncombine_trip(conn: &mut PgConnection, trip_id: &str) -> AppResult<Vec<String>> {
    let detail = TripRepository::find_detail(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", trip_id))?;
    if !matches!(
        detail.trip.status,
        TripStatus::Scheduling | TripStatus::Scheduled
    ) {
        return Err(AppError::InvalidState(format!(
            "Trip {} can no longer be uncombined",
            trip_id
        )));
    }

    let request_ids = detail.booking_request_ids();
    BookingRequestRepository::set_status_many(&mut *conn, &request_ids, RequestStatus::Pending)
        .await?;
    ScheduleRepository::delete_by_trip(&mut *conn, trip_id).await?;
    TripRepository::delete(&mut *conn, trip_id).await?;

    log::info!("↩️ Trip {} descombinado, {} solicitudes vuelven a pending", trip_id, request_ids.len());
    Ok(request_ids)
}

/// Saca una sola solicitud de un trip: borra sus tickets y las paradas que
/// ya no referencia ningún ticket restante.
pub async fn remove_booking_request_from_trip(
    conn: &mut PgConnection,
    booking_request_id: &str,
    trip_id: &str,
) -> AppResult<()> {
    let deleted =
        TripTicketRepository::delete_for_request_in_trip(&mut *conn, trip_id, booking_request_id)
            .await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "Booking request '{}' has no tickets on trip '{}'",
            booking_request_id, trip_id
        )));
    }

    let remaining = TripTicketRepository::find_by_trip(&mut *conn, trip_id).await?;
    let stops = TripStopRepository::find_by_trip(&mut *conn, trip_id).await?;
    for stop in stops {
        let still_used = remaining.iter().any(|t| match stop.stop_type {
            TripStopType::Pickup => t.pickup_location_id == stop.location_id,
            TripStopType::DropOff => t.dropoff_location_id == stop.location_id,
        });
        if !still_used {
            TripStopRepository::delete(&mut *conn, &stop.id).await?;
        }
    }
    Ok(())
}

/// Promueve un trip provisional a agendado: ID permanente nuevo, paradas y
/// tickets re-colgados de la nueva identidad, schedule creado y fila vieja
/// borrada. Corre dentro de la transacción del llamador, así que o pasa todo
/// o el trip provisional queda intacto.
pub async fn approve_scheduling_trip(conn: &mut PgConnection, trip_id: &str) -> AppResult<Trip> {
    let old = TripRepository::find_by_id(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", trip_id))?;
    if old.status != TripStatus::Scheduling {
        return Err(AppError::InvalidState(format!(
            "Trip {} is not in scheduling status",
            trip_id
        )));
    }
    if !old.has_assignment() {
        return Err(AppError::InvalidState(format!(
            "Trip {} has no vehicle to be scheduled with",
            trip_id
        )));
    }

    let new_id = id_counter_service::generate_id(&mut *conn, id_counter_service::TRIPS).await?;
    let promoted = TripRepository::create(
        &mut *conn,
        &Trip {
            id: new_id.clone(),
            status: TripStatus::Scheduled,
            departure_time: old.departure_time,
            arrival_time: old.arrival_time,
            actual_departure_time: None,
            actual_arrival_time: None,
            driver_id: old.driver_id.clone(),
            vehicle_id: old.vehicle_id.clone(),
            outsourced_vehicle_id: old.outsourced_vehicle_id.clone(),
            created_at: old.created_at,
        },
    )
    .await?;

    TripStopRepository::reparent(&mut *conn, trip_id, &new_id).await?;
    TripTicketRepository::reparent(&mut *conn, trip_id, &new_id).await?;

    insert_schedule(
        &mut *conn,
        format!("Trip {}", new_id),
        old.departure_time,
        old.arrival_time,
        old.driver_id.clone(),
        old.vehicle_id.clone(),
        Some(new_id.clone()),
    )
    .await?;

    TripRepository::delete(&mut *conn, trip_id).await?;

    // Las solicitudes que financian el trip quedan aprobadas
    let tickets = TripTicketRepository::find_by_trip(&mut *conn, &new_id).await?;
    let mut request_ids: Vec<String> = Vec::new();
    for ticket in &tickets {
        if !request_ids.contains(&ticket.booking_request_id) {
            request_ids.push(ticket.booking_request_id.clone());
        }
    }
    BookingRequestRepository::set_status_many(&mut *conn, &request_ids, RequestStatus::Approved)
        .await?;

    log::info!("✅ Trip provisional {} promovido a {}", trip_id, new_id);
    Ok(promoted)
}

/// SCHEDULED → ON_GOING: estampa la salida real, marca los tickets como
/// recogidos y ocupa al conductor. Los trips tercerizados no tienen conductor
/// propio, así que ahí no hay nada que ocupar.
pub async fn start_trip(conn: &mut PgConnection, trip_id: &str) -> AppResult<Trip> {
    let trip = TripRepository::find_by_id(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", trip_id))?;
    if trip.status != TripStatus::Scheduled {
        return Err(AppError::InvalidState(format!(
            "Trip {} cannot start from its current status",
            trip_id
        )));
    }
    TripRepository::set_actual_departure(&mut *conn, trip_id, Utc::now()).await?;
    TripTicketRepository::mark_picked_up(&mut *conn, trip_id).await?;
    if let Some(driver_id) = &trip.driver_id {
        VehicleRepository::set_driver_availability(
            &mut *conn,
            driver_id,
            DriverAvailability::OnTrip,
        )
        .await?;
    }
    TripRepository::find_by_id(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| crate::utils::errors::refetch_error("Trip", trip_id))
}

/// ON_GOING → COMPLETED: estampa la llegada real, cierra los tickets
/// abiertos, libera al conductor y completa las solicitudes.
pub async fn end_trip(conn: &mut PgConnection, trip_id: &str) -> AppResult<Trip> {
    let trip = TripRepository::find_by_id(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", trip_id))?;
    if trip.status != TripStatus::OnGoing {
        return Err(AppError::InvalidState(format!(
            "Trip {} is not on going",
            trip_id
        )));
    }
    TripRepository::set_actual_arrival(&mut *conn, trip_id, Utc::now()).await?;
    if let Some(driver_id) = &trip.driver_id {
        VehicleRepository::set_driver_availability(
            &mut *conn,
            driver_id,
            DriverAvailability::Available,
        )
        .await?;
    }

    let tickets = TripTicketRepository::find_by_trip(&mut *conn, trip_id).await?;
    let mut request_ids: Vec<String> = Vec::new();
    for ticket in &tickets {
        if ticket.ticket_status != TicketStatus::Cancelled
            && !request_ids.contains(&ticket.booking_request_id)
        {
            request_ids.push(ticket.booking_request_id.clone());
        }
    }
    TripTicketRepository::mark_dropped_off(&mut *conn, trip_id).await?;
    BookingRequestRepository::set_status_many(&mut *conn, &request_ids, RequestStatus::Completed)
        .await?;

    TripRepository::find_by_id(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| crate::utils::errors::refetch_error("Trip", trip_id))
}

/// Cancela un trip aún no iniciado y libera la agenda del conductor/vehículo
pub async fn cancel_trip(conn: &mut PgConnection, trip_id: &str) -> AppResult<Trip> {
    let trip = TripRepository::find_by_id(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", trip_id))?;
    if !matches!(trip.status, TripStatus::Scheduling | TripStatus::Scheduled) {
        return Err(AppError::InvalidState(format!(
            "Trip {} can no longer be cancelled",
            trip_id
        )));
    }

    TripRepository::set_status(&mut *conn, trip_id, TripStatus::Cancelled).await?;
    TripTicketRepository::set_status_by_trip(&mut *conn, trip_id, TicketStatus::Cancelled).await?;
    ScheduleRepository::delete_by_trip(&mut *conn, trip_id).await?;

    TripRepository::find_by_id(&mut *conn, trip_id)
        .await?
        .ok_or_else(|| crate::utils::errors::refetch_error("Trip", trip_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking_request::{BookingKind, Priority};
    use chrono::TimeZone;

    fn round_trip_request() -> BookingRequest {
        BookingRequest {
            id: "BR-1".to_string(),
            kind: BookingKind::RoundTrip,
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
            departure_location_id: "LOC-A".to_string(),
            arrival_location_id: "LOC-B".to_string(),
            is_reserved: false,
            return_departure_time: Some(Utc.with_ymd_and_hms(2025, 5, 2, 15, 0, 0).unwrap()),
            return_arrival_time: Some(Utc.with_ymd_and_hms(2025, 5, 2, 17, 0, 0).unwrap()),
            return_departure_location_id: Some("LOC-B".to_string()),
            return_arrival_location_id: Some("LOC-A".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_round_trip_produces_two_legs() {
        let legs = legs_for(&round_trip_request());
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].from_location_id, "LOC-A");
        assert_eq!(legs[0].to_location_id, "LOC-B");
        assert_eq!(legs[1].from_location_id, "LOC-B");
        assert_eq!(legs[1].to_location_id, "LOC-A");
    }

    #[test]
    fn test_one_way_produces_single_leg() {
        let mut request = round_trip_request();
        request.kind = BookingKind::OneWay;
        request.return_departure_time = None;
        request.return_arrival_time = None;
        request.return_departure_location_id = None;
        request.return_arrival_location_id = None;
        assert_eq!(legs_for(&request).len(), 1);
    }

    #[test]
    fn test_ticket_stops_require_pickup_before_dropoff() {
        let request = {
            let mut r = round_trip_request();
            r.kind = BookingKind::OneWay;
            r
        };
        let stop = |stop_type, order: i32, loc: &str| TripStop {
            id: format!("STP-{}", order),
            trip_id: "TRP-1".to_string(),
            stop_type,
            stop_order: order,
            location_id: loc.to_string(),
            planned_arrival_time: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
            actual_arrival_time: None,
        };

        let good = vec![
            stop(TripStopType::Pickup, 1, "LOC-A"),
            stop(TripStopType::DropOff, 2, "LOC-B"),
        ];
        assert!(ticket_stops_for(&request, &good).is_ok());

        let inverted = vec![
            stop(TripStopType::DropOff, 1, "LOC-B"),
            stop(TripStopType::Pickup, 2, "LOC-A"),
        ];
        assert!(ticket_stops_for(&request, &inverted).is_err());
    }
}
