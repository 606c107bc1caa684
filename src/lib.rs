//! Trip Scheduling & Optimization Orchestrator
//!
//! Asigna booking requests (ida simple o ida y vuelta) a trips operados por
//! conductores propios o vehículos tercerizados: despacho inmediato por
//! prioridad, combinación de trips del mismo día, optimización nocturna por
//! lotes contra un solver externo y finalización de trips provisionales.

pub mod config;
pub mod controllers;
pub mod cron;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
