//! Corrida nocturna del optimizador

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::models::setting::keys;
use crate::services::setting_service;
use crate::services::trip_optimizer_service;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub async fn run_loop(state: AppState) {
    loop {
        let (hour, minute) = match run_time(&state).await {
            Ok(time) => time,
            Err(e) => {
                log::error!("❌ No se pudo leer la hora del optimizador: {}", e);
                (23, 0)
            }
        };

        let delay = super::delay_until_next(Utc::now(), hour, minute, state.config.tz_offset_hours);
        log::info!(
            "⏰ Próxima corrida del optimizador en {} minutos",
            delay.as_secs() / 60
        );
        tokio::time::sleep(delay).await;

        match run_once(&state).await {
            Ok(()) => {}
            Err(e) => log::error!("❌ Corrida del optimizador falló: {}", e),
        }
    }
}

async fn run_time(state: &AppState) -> AppResult<(u32, u32)> {
    let mut conn = state.pool.acquire().await?;
    setting_service::get_time(&mut *conn, keys::TRIP_OPTIMIZER_TIME, (23, 0)).await
}

async fn run_once(state: &AppState) -> AppResult<()> {
    let mut conn = state.pool.acquire().await?;
    let enabled =
        setting_service::get_bool(&mut *conn, keys::TRIP_OPTIMIZER_ENABLED, true).await?;
    drop(conn);
    if !enabled {
        log::info!("🌙 Optimizador deshabilitado por configuración, se saltea la corrida");
        return Ok(());
    }

    let mut rng = StdRng::from_entropy();
    trip_optimizer_service::run_nightly_optimization(
        &state.pool,
        &state.optimizer,
        state.config.tz_offset_hours,
        &mut rng,
    )
    .await
}
