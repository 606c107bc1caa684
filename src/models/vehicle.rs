//! Modelos de Vehicle, Driver y OutsourcedVehicle

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Active,
    Maintenance,
    OutOfService,
    Retired,
}

/// Disponibilidad del conductor - mapea al ENUM driver_availability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "driver_availability", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverAvailability {
    Available,
    OnTrip,
    Unavailable,
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: String,
    pub license_plate: String,
    pub capacity: i32,
    pub status: VehicleStatus,
    pub executive: bool,
    pub base_location_id: String,
    pub driver_id: Option<String>,
}

/// Driver - mapea a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub availability: DriverAvailability,
}

/// Vehículo tercerizado - mapea a la tabla outsourced_vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OutsourcedVehicle {
    pub id: String,
    pub vendor_name: String,
    pub capacity: i32,
    pub contact_phone: Option<String>,
}

/// Snapshot de un par (vehículo, conductor) con los schedules del conductor,
/// tal como lo consume el filtro de disponibilidad.
#[derive(Debug, Clone)]
pub struct VehicleCandidate {
    pub vehicle: Vehicle,
    pub driver: Driver,
    pub schedules: Vec<crate::models::schedule::Schedule>,
}

/// Asignación elegida para materializar un trip: vehículo propio (con su
/// conductor) o vehículo tercerizado.
#[derive(Debug, Clone)]
pub enum TripAssignment {
    Company { vehicle: Vehicle, driver: Driver },
    Outsourced(OutsourcedVehicle),
}

impl TripAssignment {
    pub fn vehicle_id(&self) -> Option<&str> {
        match self {
            TripAssignment::Company { vehicle, .. } => Some(vehicle.id.as_str()),
            TripAssignment::Outsourced(_) => None,
        }
    }

    pub fn driver_id(&self) -> Option<&str> {
        match self {
            TripAssignment::Company { driver, .. } => Some(driver.id.as_str()),
            TripAssignment::Outsourced(_) => None,
        }
    }

    pub fn outsourced_id(&self) -> Option<&str> {
        match self {
            TripAssignment::Company { .. } => None,
            TripAssignment::Outsourced(v) => Some(v.id.as_str()),
        }
    }

    pub fn capacity(&self) -> i32 {
        match self {
            TripAssignment::Company { vehicle, .. } => vehicle.capacity,
            TripAssignment::Outsourced(v) => v.capacity,
        }
    }
}
