//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores y
//! cálculo de fechas con offset fijo.

pub mod errors;
pub mod time;
