//! Modelo de Schedule
//!
//! Un bloque de calendario para un conductor y/o vehículo. Dos schedules del
//! mismo conductor (o vehículo) nunca deben solaparse en el tiempo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Schedule - mapea a la tabla schedules
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub trip_id: Option<String>,
}

impl Schedule {
    /// Test de solape de intervalos semiabiertos `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}
