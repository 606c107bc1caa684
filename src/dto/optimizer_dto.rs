//! Contrato HTTP del solver externo (trip optimizer)
//!
//! Los shapes se preservan campo a campo respecto de la API del optimizador:
//! `POST /optimizer/api/v1/optimize`, `GET .../optimize/{id}/status` y
//! `GET .../optimize/{id}/result`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Punto geográfico con identidad de location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerLocation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Día en que un vehículo no está disponible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerUnavailability {
    /// Fecha local en formato yyyy-mm-dd
    pub date: String,
    pub period: i32,
}

/// Vehículo enviado al solver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerVehicle {
    pub id: String,
    pub capacity: i32,
    pub base_location: OptimizerLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailability: Option<Vec<OptimizerUnavailability>>,
}

/// Solicitud enviada al solver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerRequest {
    pub id: String,
    pub pickup_location: OptimizerLocation,
    pub dropoff_location: OptimizerLocation,
    pub dropoff_time: DateTime<Utc>,
    pub capacity_demand: i32,
}

/// Body de `POST /optimize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeJobRequest {
    pub vehicles: Vec<OptimizerVehicle>,
    pub requests: Vec<OptimizerRequest>,
}

/// Respuesta de `POST /optimize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeJobSubmitted {
    pub job_id: String,
}

/// Estado de un job del solver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeJobStatus {
    Pending,
    Completed,
    Failed,
}

/// Respuesta de `GET /optimize/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeJobStatusResponse {
    pub job_id: String,
    pub status: OptimizeJobStatus,
}

/// Tipo de punto de ruta devuelto por el solver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoutePointType {
    Start,
    Pickup,
    Dropoff,
}

/// Punto de la ruta propuesta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub estimated_arrival_time: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub point_type: RoutePointType,
}

/// Un trip propuesto por el solver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedTrip {
    pub vehicle_id: Option<String>,
    pub combined_request_ids: Vec<String>,
    pub trip_start_time: DateTime<Utc>,
    pub trip_end_time: DateTime<Utc>,
    pub total_duration_minutes: f64,
    pub total_distance_meters: f64,
    pub route: Vec<RoutePoint>,
}

/// Respuesta de `GET /optimize/{id}/result`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeJobResult {
    pub scheduled_trips: Vec<OptimizedTrip>,
}
