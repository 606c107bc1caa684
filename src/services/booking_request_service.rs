//! Alta, edición y despacho de booking requests
//!
//! El despacho es el punto de entrada del orquestador: HIGH y URGENT
//! (salida a menos de 24h) primero se intentan sumar a un trip agendado
//! combinable del mismo día y recién si no hay candidato se asignan contra
//! el filtro de disponibilidad; el resto queda pendiente para la corrida
//! nocturna. La edición o baja de una solicitud ya asignada primero deshace
//! los trips que financiaba, dentro de la misma transacción.

use chrono::{Duration, Utc};
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use crate::dto::booking_request_dto::{CreateBookingRequest, UpdateBookingRequest};
use crate::models::booking_request::{BookingKind, BookingRequest, Priority, RequestStatus};
use crate::models::trip::TripStatus;
use crate::models::vehicle::TripAssignment;
use crate::repositories::booking_request_repository::BookingRequestRepository;
use crate::repositories::trip_repository::TripRepository;
use crate::repositories::schedule_repository::ScheduleRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::availability_service;
use crate::services::id_counter_service;
use crate::services::notification_service::{self, NotificationBody};
use crate::services::trip_matching_service;
use crate::services::trip_service;
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Umbral de urgencia: salida a menos de este plazo fuerza asignación inmediata
const URGENT_WINDOW_HOURS: i64 = 24;

fn validate_times(request: &BookingRequest) -> AppResult<()> {
    if request.departure_time >= request.arrival_time {
        return Err(AppError::BadRequest(
            "departure_time must be before arrival_time".to_string(),
        ));
    }
    if request.kind == BookingKind::RoundTrip {
        let (return_departure, return_arrival) =
            match (request.return_departure_time, request.return_arrival_time) {
                (Some(d), Some(a)) => (d, a),
                _ => {
                    return Err(AppError::BadRequest(
                        "Round trip requests need a return leg".to_string(),
                    ))
                }
            };
        if request.return_departure_location_id.is_none()
            || request.return_arrival_location_id.is_none()
        {
            return Err(AppError::BadRequest(
                "Round trip requests need return locations".to_string(),
            ));
        }
        if return_departure < request.arrival_time {
            return Err(AppError::BadRequest(
                "Return leg cannot depart before the outbound arrival".to_string(),
            ));
        }
        if return_departure >= return_arrival {
            return Err(AppError::BadRequest(
                "return_departure_time must be before return_arrival_time".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn create_booking_request(
    pool: &PgPool,
    payload: CreateBookingRequest,
    offset_hours: i32,
) -> AppResult<BookingRequest> {
    payload.validate()?;

    let mut tx = pool.begin().await?;

    let id =
        id_counter_service::generate_id(&mut *tx, id_counter_service::BOOKING_REQUESTS).await?;
    let request = BookingRequest {
        id,
        kind: payload.kind,
        status: RequestStatus::Pending,
        priority: payload.priority.unwrap_or(Priority::Normal),
        number_of_passengers: payload.number_of_passengers,
        requester_id: payload.requester_id,
        contact_name: payload.contact_name,
        contact_phone: payload.contact_phone,
        trip_purpose: payload.trip_purpose,
        note: payload.note,
        departure_time: payload.departure_time,
        arrival_time: payload.arrival_time,
        departure_location_id: payload.departure_location_id,
        arrival_location_id: payload.arrival_location_id,
        is_reserved: payload.kind == BookingKind::RoundTrip && payload.is_reserved,
        return_departure_time: payload.return_departure_time,
        return_arrival_time: payload.return_arrival_time,
        return_departure_location_id: payload.return_departure_location_id,
        return_arrival_location_id: payload.return_arrival_location_id,
        created_at: Utc::now(),
    };
    validate_times(&request)?;

    let created = BookingRequestRepository::create(&mut *tx, &request).await?;
    let dispatched = dispatch(&mut *tx, created, offset_hours).await?;

    tx.commit().await?;
    log::info!("📝 Solicitud {} creada y despachada", dispatched.id);
    Ok(dispatched)
}

/// Despacho por prioridad. HIGH y URGENT van por asignación inmediata; las
/// normales quedan pendientes y solo se avisa a coordinación.
pub async fn dispatch(
    conn: &mut PgConnection,
    mut request: BookingRequest,
    offset_hours: i32,
) -> AppResult<BookingRequest> {
    let now = Utc::now();

    let immediate = if request.priority == Priority::High {
        true
    } else if request.departure_time - now <= Duration::hours(URGENT_WINDOW_HOURS) {
        // Salida inminente: se fuerza URGENT y se persiste antes de asignar
        request.priority = Priority::Urgent;
        request = BookingRequestRepository::update(&mut *conn, &request).await?;
        true
    } else {
        false
    };

    if !immediate {
        notification_service::send_coordinator_and_admin_notification(
            &mut *conn,
            &NotificationBody {
                title: "New booking request".to_string(),
                template_key: "booking_request_pending".to_string(),
                data: serde_json::json!({ "booking_request_id": request.id }),
                entity_id: Some(request.id.clone()),
                priority: request.priority,
            },
        )
        .await?;
        return Ok(request);
    }

    assign_immediately(conn, request, offset_hours).await
}

/// Intento de combinación: carga los trips agendados próximos y, si el
/// matcher encuentra candidatos, suma la solicitud al de llegada más
/// cercana. Devuelve el ID del trip elegido, o None si no hay ninguno.
async fn combine_into_scheduled(
    conn: &mut PgConnection,
    request: &BookingRequest,
    offset_hours: i32,
) -> AppResult<Option<String>> {
    // Las HIGH viajan solas; solo las urgentes one-way se combinan
    if request.kind != BookingKind::OneWay || request.priority == Priority::High {
        return Ok(None);
    }

    let trips = TripRepository::find_scheduled_departing_after(&mut *conn, Utc::now()).await?;
    let mut details = Vec::with_capacity(trips.len());
    for trip in trips {
        if let Some(detail) = TripRepository::find_detail(&mut *conn, &trip.id).await? {
            details.push(detail);
        }
    }

    let best = match trip_matching_service::pick_combination_target(request, &details, offset_hours)
    {
        Some(detail) => detail,
        None => return Ok(None),
    };
    trip_service::add_request_to_trip(&mut *conn, request, best).await?;
    Ok(Some(best.trip.id.clone()))
}

/// Camino sincrónico: primero intenta sumar la solicitud a un trip agendado
/// combinable; si no hay, filtro de disponibilidad + materialización
/// provisional. Quedarse sin vehículo no es un error: la solicitud sigue
/// pendiente y se avisa a coordinación para el manejo manual.
async fn assign_immediately(
    conn: &mut PgConnection,
    mut request: BookingRequest,
    offset_hours: i32,
) -> AppResult<BookingRequest> {
    if let Some(trip_id) = combine_into_scheduled(&mut *conn, &request, offset_hours).await? {
        log::info!("🤝 Solicitud {} sumada al trip {}", request.id, trip_id);
        notification_service::send_user_notification(
            &mut *conn,
            &NotificationBody {
                title: "Trip assigned".to_string(),
                template_key: "trip_assigned".to_string(),
                data: serde_json::json!({
                    "booking_request_id": request.id,
                    "trip_ids": [trip_id],
                }),
                entity_id: Some(request.id.clone()),
                priority: request.priority,
            },
            &request.requester_id,
        )
        .await?;
        request.status = RequestStatus::Approved;
        return Ok(request);
    }

    let (window_start, window_end) = request.occupancy_window();
    let candidates = VehicleRepository::find_dispatch_candidates(&mut *conn, window_start).await?;
    let available = availability_service::filter_available(
        candidates,
        window_start,
        window_end,
        request.number_of_passengers,
    );

    let chosen = match available.into_iter().next() {
        Some(candidate) => candidate,
        None => {
            log::warn!("⚠️ Sin vehículo disponible para la solicitud {}", request.id);
            notification_service::send_coordinator_and_admin_notification(
                &mut *conn,
                &NotificationBody {
                    title: "No vehicle available".to_string(),
                    template_key: "no_vehicle_available".to_string(),
                    data: serde_json::json!({ "booking_request_id": request.id }),
                    entity_id: Some(request.id.clone()),
                    priority: request.priority,
                },
            )
            .await?;
            return Ok(request);
        }
    };

    let driver_id = chosen.driver.id.clone();
    let assignment = TripAssignment::Company {
        vehicle: chosen.vehicle,
        driver: chosen.driver,
    };
    let trips = trip_service::create_scheduling_trips(&mut *conn, &request, &assignment).await?;

    let body = NotificationBody {
        title: "Trip assigned".to_string(),
        template_key: "trip_assigned".to_string(),
        data: serde_json::json!({
            "booking_request_id": request.id,
            "trip_ids": trips.iter().map(|t| t.id.clone()).collect::<Vec<_>>(),
        }),
        entity_id: Some(request.id.clone()),
        priority: request.priority,
    };
    notification_service::send_user_notification(&mut *conn, &body, &driver_id).await?;
    notification_service::send_user_notification(&mut *conn, &body, &request.requester_id).await?;

    Ok(request)
}

/// Deshace los trips que la solicitud financiaba: un trip provisional o del
/// que era la única ocupante se borra entero; de un trip compartido solo se
/// sacan sus tickets y las paradas que quedaron huérfanas.
async fn unwind_trips(conn: &mut PgConnection, request: &BookingRequest) -> AppResult<()> {
    let trip_ids = TripRepository::find_ids_by_booking_request(&mut *conn, &request.id).await?;
    for trip_id in trip_ids {
        let detail = match TripRepository::find_detail(&mut *conn, &trip_id).await? {
            Some(detail) => detail,
            None => continue,
        };
        let sole_occupant = detail.booking_request_ids() == vec![request.id.clone()];
        if detail.trip.status == TripStatus::Scheduling || sole_occupant {
            ScheduleRepository::delete_by_trip(&mut *conn, &trip_id).await?;
            TripRepository::delete(&mut *conn, &trip_id).await?;
            log::info!("🗑️ Trip {} eliminado al deshacer la solicitud {}", trip_id, request.id);
        } else {
            trip_service::remove_booking_request_from_trip(&mut *conn, &request.id, &trip_id)
                .await?;
        }
    }
    Ok(())
}

pub async fn update_booking_request(
    pool: &PgPool,
    id: &str,
    payload: UpdateBookingRequest,
    offset_hours: i32,
) -> AppResult<BookingRequest> {
    payload.validate()?;

    let mut tx = pool.begin().await?;

    let mut request = BookingRequestRepository::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| not_found_error("BookingRequest", id))?;
    if !matches!(
        request.status,
        RequestStatus::Pending | RequestStatus::Approved
    ) {
        return Err(AppError::InvalidState(format!(
            "Booking request {} can no longer be edited",
            id
        )));
    }

    unwind_trips(&mut *tx, &request).await?;

    if let Some(priority) = payload.priority {
        request.priority = priority;
    }
    if let Some(passengers) = payload.number_of_passengers {
        request.number_of_passengers = passengers;
    }
    if let Some(name) = payload.contact_name {
        request.contact_name = name;
    }
    if let Some(phone) = payload.contact_phone {
        request.contact_phone = phone;
    }
    if payload.trip_purpose.is_some() {
        request.trip_purpose = payload.trip_purpose;
    }
    if payload.note.is_some() {
        request.note = payload.note;
    }
    if let Some(t) = payload.departure_time {
        request.departure_time = t;
    }
    if let Some(t) = payload.arrival_time {
        request.arrival_time = t;
    }
    if let Some(l) = payload.departure_location_id {
        request.departure_location_id = l;
    }
    if let Some(l) = payload.arrival_location_id {
        request.arrival_location_id = l;
    }
    if payload.return_departure_time.is_some() {
        request.return_departure_time = payload.return_departure_time;
    }
    if payload.return_arrival_time.is_some() {
        request.return_arrival_time = payload.return_arrival_time;
    }
    if payload.return_departure_location_id.is_some() {
        request.return_departure_location_id = payload.return_departure_location_id;
    }
    if payload.return_arrival_location_id.is_some() {
        request.return_arrival_location_id = payload.return_arrival_location_id;
    }
    validate_times(&request)?;

    let updated = BookingRequestRepository::update(&mut *tx, &request).await?;
    BookingRequestRepository::set_status(&mut *tx, id, RequestStatus::Pending).await?;

    // La solicitud editada vuelve a despacharse como si fuera nueva
    let mut refreshed = updated;
    refreshed.status = RequestStatus::Pending;
    let dispatched = dispatch(&mut *tx, refreshed, offset_hours).await?;

    tx.commit().await?;
    Ok(dispatched)
}

pub async fn reject_booking_request(pool: &PgPool, id: &str) -> AppResult<BookingRequest> {
    close_booking_request(pool, id, RequestStatus::Rejected, "booking_request_rejected").await
}

pub async fn cancel_booking_request(pool: &PgPool, id: &str) -> AppResult<BookingRequest> {
    close_booking_request(pool, id, RequestStatus::Cancelled, "booking_request_cancelled").await
}

async fn close_booking_request(
    pool: &PgPool,
    id: &str,
    status: RequestStatus,
    template_key: &str,
) -> AppResult<BookingRequest> {
    let mut tx = pool.begin().await?;

    let request = BookingRequestRepository::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| not_found_error("BookingRequest", id))?;
    if matches!(
        request.status,
        RequestStatus::Completed | RequestStatus::Rejected | RequestStatus::Cancelled
    ) {
        return Err(AppError::InvalidState(format!(
            "Booking request {} is already closed",
            id
        )));
    }

    unwind_trips(&mut *tx, &request).await?;
    BookingRequestRepository::set_status(&mut *tx, id, status).await?;

    notification_service::send_user_notification(
        &mut *tx,
        &NotificationBody {
            title: "Booking request closed".to_string(),
            template_key: template_key.to_string(),
            data: serde_json::json!({ "booking_request_id": id }),
            entity_id: Some(id.to_string()),
            priority: request.priority,
        },
        &request.requester_id,
    )
    .await?;

    let refreshed = BookingRequestRepository::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| crate::utils::errors::refetch_error("BookingRequest", id))?;
    tx.commit().await?;
    Ok(refreshed)
}

pub async fn get_booking_request(pool: &PgPool, id: &str) -> AppResult<BookingRequest> {
    let mut conn = pool.acquire().await?;
    BookingRequestRepository::find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| not_found_error("BookingRequest", id))
}

/// Solo se borran solicitudes que ya no financian ningún trip
pub async fn delete_booking_request(pool: &PgPool, id: &str) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let request = BookingRequestRepository::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| not_found_error("BookingRequest", id))?;
    if !matches!(
        request.status,
        RequestStatus::Pending | RequestStatus::Cancelled | RequestStatus::Rejected
    ) {
        return Err(AppError::InvalidState(format!(
            "Booking request {} cannot be deleted in its current status",
            id
        )));
    }

    unwind_trips(&mut *tx, &request).await?;
    BookingRequestRepository::delete(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(())
}
