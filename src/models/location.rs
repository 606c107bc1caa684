//! Modelo de Location

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Location - mapea a la tabla locations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}
