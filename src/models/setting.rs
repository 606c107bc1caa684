//! Modelo de Setting (configuración persistida key/value)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Setting - mapea a la tabla settings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// Claves de configuración conocidas por los jobs
pub mod keys {
    pub const TRIP_OPTIMIZER_TIME: &str = "trip_optimizer_time";
    pub const TRIP_OPTIMIZER_ENABLED: &str = "trip_optimizer_enabled";
    pub const TRIP_OPTIMIZER_LOOKAHEAD_DAYS: &str = "trip_optimizer_lookahead_days";
    pub const TRIP_FINALIZER_TIME: &str = "trip_finalizer_time";
    pub const TRIP_FINALIZER_ENABLED: &str = "trip_finalizer_enabled";
    pub const TRIP_FINALIZER_LEAD_HOURS: &str = "trip_finalizer_lead_hours";
}
