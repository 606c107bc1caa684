//! DTOs de entrada/salida de la API y del optimizador externo

pub mod booking_request_dto;
pub mod common;
pub mod optimizer_dto;
pub mod trip_dto;
