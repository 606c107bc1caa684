//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL con las convenciones estándar.

pub mod booking_request;
pub mod location;
pub mod schedule;
pub mod setting;
pub mod trip;
pub mod vehicle;
