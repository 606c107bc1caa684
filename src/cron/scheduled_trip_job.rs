//! Finalizador de trips provisionales
//!
//! Poco antes de la salida, promueve los trips en estado scheduling (ID
//! temporal) a scheduled con ID permanente. Cada trip se promueve en su
//! propia transacción: un trip que falla no frena a los demás.

use chrono::{Duration, Utc};

use crate::models::setting::keys;
use crate::models::trip::TripStatus;
use crate::repositories::booking_request_repository::BookingRequestRepository;
use crate::repositories::trip_repository::TripRepository;
use crate::services::notification_service::{self, NotificationBody};
use crate::services::setting_service;
use crate::services::trip_service;
use crate::state::AppState;
use crate::utils::errors::AppResult;

const DEFAULT_LEAD_HOURS: i64 = 24;

pub async fn run_loop(state: AppState) {
    loop {
        let (hour, minute) = match run_time(&state).await {
            Ok(time) => time,
            Err(e) => {
                log::error!("❌ No se pudo leer la hora del finalizador: {}", e);
                (21, 0)
            }
        };

        let delay = super::delay_until_next(Utc::now(), hour, minute, state.config.tz_offset_hours);
        log::info!(
            "⏰ Próxima corrida del finalizador en {} minutos",
            delay.as_secs() / 60
        );
        tokio::time::sleep(delay).await;

        match run_once(&state).await {
            Ok(promoted) => {
                if promoted > 0 {
                    log::info!("✅ Finalizador promovió {} trip(s)", promoted);
                }
            }
            Err(e) => log::error!("❌ Corrida del finalizador falló: {}", e),
        }
    }
}

async fn run_time(state: &AppState) -> AppResult<(u32, u32)> {
    let mut conn = state.pool.acquire().await?;
    setting_service::get_time(&mut *conn, keys::TRIP_FINALIZER_TIME, (21, 0)).await
}

/// Una pasada del finalizador: devuelve cuántos trips promovió
pub async fn run_once(state: &AppState) -> AppResult<usize> {
    let now = Utc::now();
    let mut conn = state.pool.acquire().await?;

    let enabled =
        setting_service::get_bool(&mut *conn, keys::TRIP_FINALIZER_ENABLED, true).await?;
    if !enabled {
        log::info!("🌙 Finalizador deshabilitado por configuración");
        return Ok(0);
    }
    let lead_hours = setting_service::get_i64(
        &mut *conn,
        keys::TRIP_FINALIZER_LEAD_HOURS,
        DEFAULT_LEAD_HOURS,
    )
    .await?;

    let candidates = TripRepository::find_by_status_in_window(
        &mut *conn,
        TripStatus::Scheduling,
        now,
        now + Duration::hours(lead_hours),
    )
    .await?;
    drop(conn);

    let mut promoted = 0usize;
    for trip in candidates {
        if !trip.has_assignment() {
            log::warn!("⚠️ Trip provisional {} sin vehículo, no se promueve", trip.id);
            continue;
        }
        match promote_one(state, &trip.id).await {
            Ok(()) => promoted += 1,
            Err(e) => log::error!("❌ No se pudo promover el trip {}: {}", trip.id, e),
        }
    }
    Ok(promoted)
}

async fn promote_one(state: &AppState, trip_id: &str) -> AppResult<()> {
    let mut tx = state.pool.begin().await?;

    let new_trip = trip_service::approve_scheduling_trip(&mut *tx, trip_id).await?;
    let detail = TripRepository::find_detail(&mut *tx, &new_trip.id)
        .await?
        .ok_or_else(|| crate::utils::errors::refetch_error("Trip", &new_trip.id))?;

    let body = NotificationBody {
        title: "Trip scheduled".to_string(),
        template_key: "trip_scheduled".to_string(),
        data: serde_json::json!({ "trip_id": new_trip.id }),
        entity_id: Some(new_trip.id.clone()),
        priority: crate::models::booking_request::Priority::Normal,
    };
    if let Some(driver_id) = &new_trip.driver_id {
        notification_service::send_user_notification(&mut *tx, &body, driver_id).await?;
    }
    let request_ids = detail.booking_request_ids();
    let requests = BookingRequestRepository::find_many_by_ids(&mut *tx, &request_ids).await?;
    for request in &requests {
        notification_service::send_user_notification(&mut *tx, &body, &request.requester_id)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
