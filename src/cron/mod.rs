//! Jobs programados
//!
//! Dos loops sobre tareas de tokio: la corrida nocturna del optimizador y el
//! finalizador de trips provisionales. La hora de corrida se relee de la
//! tabla settings en cada vuelta, así un cambio aplica sin reiniciar.

pub mod scheduled_trip_job;
pub mod trip_optimize_job;

use chrono::{DateTime, Duration, Utc};

use crate::state::AppState;
use crate::utils::time::fixed_offset;

pub fn start(state: AppState) {
    tokio::spawn(trip_optimize_job::run_loop(state.clone()));
    tokio::spawn(scheduled_trip_job::run_loop(state));
}

/// Espera hasta la próxima ocurrencia de la hora local `HH:mm` en la zona de
/// offset fijo. Si la hora ya pasó hoy, apunta a mañana.
pub fn delay_until_next(
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
    offset_hours: i32,
) -> std::time::Duration {
    let tz = fixed_offset(offset_hours);
    let local_now = now.with_timezone(&tz);
    let today_target = local_now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .and_then(|naive| naive.and_local_timezone(tz).single());

    let target = match today_target {
        Some(t) if t > local_now => t,
        Some(t) => t + Duration::days(1),
        // Hora inválida: reintento en un minuto
        None => return std::time::Duration::from_secs(60),
    };

    (target - local_now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_delay_targets_today_when_in_future() {
        // 10:00 UTC = 17:00 en UTC+7; faltan 6 horas para las 23:00 locales
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();
        let delay = delay_until_next(now, 23, 0, 7);
        assert_eq!(delay, std::time::Duration::from_secs(6 * 3600));
    }

    #[test]
    fn test_delay_rolls_over_to_tomorrow() {
        // 17:30 UTC = 00:30 del día siguiente en UTC+7; las 23:00 ya pasaron
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 17, 30, 0).unwrap();
        let delay = delay_until_next(now, 23, 0, 7);
        assert_eq!(delay, std::time::Duration::from_secs(22 * 3600 + 30 * 60));
    }
}
