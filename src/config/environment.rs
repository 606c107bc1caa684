//! Configuración de variables de entorno

use std::env;
use std::time::Duration;

use crate::services::trip_optimizer_service::OptimizerConfig;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub host: String,
    pub port: u16,
    pub optimizer_base_url: String,
    pub optimizer_api_key: String,
    pub optimizer_submit_timeout_secs: u64,
    pub optimizer_poll_interval_ms: u64,
    pub optimizer_poll_deadline_secs: u64,
    /// Offset UTC fijo para la fecha de calendario local
    pub tz_offset_hours: i32,
    /// Velocidad promedio para la estimación de rutas por gran círculo
    pub avg_speed_kmh: f64,
}

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl EnvironmentConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            optimizer_base_url: env::var("OPTIMIZER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            optimizer_api_key: env::var("OPTIMIZER_API_KEY").unwrap_or_default(),
            optimizer_submit_timeout_secs: env_or("OPTIMIZER_SUBMIT_TIMEOUT_SECS", 10),
            optimizer_poll_interval_ms: env_or("OPTIMIZER_POLL_INTERVAL_MS", 300),
            optimizer_poll_deadline_secs: env_or("OPTIMIZER_POLL_DEADLINE_SECS", 300),
            tz_offset_hours: env_or("TZ_OFFSET_HOURS", 7),
            avg_speed_kmh: env_or("AVG_SPEED_KMH", 40.0),
        }
    }

    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            base_url: self.optimizer_base_url.clone(),
            api_key: self.optimizer_api_key.clone(),
            submit_timeout: Duration::from_secs(self.optimizer_submit_timeout_secs),
            poll_interval: Duration::from_millis(self.optimizer_poll_interval_ms),
            poll_deadline: Duration::from_secs(self.optimizer_poll_deadline_secs),
        }
    }
}
