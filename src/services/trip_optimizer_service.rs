//! Coordinación de la optimización por lotes contra el solver externo
//!
//! La corrida nocturna junta las solicitudes pendientes de prioridad normal,
//! las agrupa por fecha local, arma lotes acotados de solicitudes y
//! vehículos, los somete al solver HTTP y aplica todos los resultados
//! aceptados en una única transacción. Un lote caído o vencido se descarta
//! sin afectar a los demás: la próxima corrida lo vuelve a considerar.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rand::Rng;
use sqlx::{PgConnection, PgPool};

use crate::dto::optimizer_dto::{
    OptimizeJobRequest, OptimizeJobResult, OptimizeJobStatus, OptimizeJobStatusResponse,
    OptimizeJobSubmitted, OptimizedTrip, OptimizerLocation, OptimizerRequest, OptimizerVehicle,
};
use crate::models::booking_request::{BookingKind, BookingRequest, Priority, RequestStatus};
use crate::models::location::Location;
use crate::models::trip::TripDetail;
use crate::models::vehicle::VehicleCandidate;
use crate::repositories::booking_request_repository::BookingRequestRepository;
use crate::repositories::location_repository::LocationRepository;
use crate::repositories::schedule_repository::ScheduleRepository;
use crate::repositories::trip_repository::TripRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::availability_service;
use crate::services::batch_planner::{self, MAX_REQUESTS_PER_JOB};
use crate::services::setting_service;
use crate::services::trip_matching_service;
use crate::services::trip_service;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::time::{day_bounds, day_index};

const DEFAULT_LOOKAHEAD_DAYS: i64 = 33;

/// Parámetros del cliente del solver. Intervalo y deadline del polling son
/// inyectables para que los tests corran con valores casi nulos.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub base_url: String,
    pub api_key: String,
    pub submit_timeout: StdDuration,
    pub poll_interval: StdDuration,
    pub poll_deadline: StdDuration,
}

impl OptimizerConfig {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            submit_timeout: StdDuration::from_secs(10),
            poll_interval: StdDuration::from_millis(300),
            poll_deadline: StdDuration::from_secs(300),
        }
    }
}

/// Cliente HTTP del solver
#[derive(Debug, Clone)]
pub struct OptimizerClient {
    http: reqwest::Client,
    config: OptimizerConfig,
}

impl OptimizerClient {
    pub fn new(http: reqwest::Client, config: OptimizerConfig) -> Self {
        Self { http, config }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/optimizer/api/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        )
    }

    pub async fn submit_job(&self, job: &OptimizeJobRequest) -> AppResult<String> {
        let response = self
            .http
            .post(self.url("optimize"))
            .header("X-API-Key", &self.config.api_key)
            .timeout(self.config.submit_timeout)
            .json(job)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Solver rejected job submission with status {}",
                response.status()
            )));
        }

        let submitted: OptimizeJobSubmitted =
            response.json().await.map_err(map_reqwest_error)?;
        Ok(submitted.job_id)
    }

    /// Repite el chequeo de estado hasta completed/failed o hasta vencer el
    /// deadline. El deadline es un timeout, no un retry del submit.
    pub async fn poll_until_done(&self, job_id: &str) -> AppResult<OptimizeJobStatus> {
        let deadline = tokio::time::Instant::now() + self.config.poll_deadline;
        loop {
            let response = self
                .http
                .get(self.url(&format!("optimize/{}/status", job_id)))
                .header("X-API-Key", &self.config.api_key)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            if !response.status().is_success() {
                return Err(AppError::ExternalApi(format!(
                    "Solver status check failed with status {}",
                    response.status()
                )));
            }

            let status: OptimizeJobStatusResponse =
                response.json().await.map_err(map_reqwest_error)?;
            match status.status {
                OptimizeJobStatus::Pending => {}
                done => return Ok(done),
            }

            if tokio::time::Instant::now() + self.config.poll_interval > deadline {
                return Err(AppError::ExternalTimeout(format!(
                    "Solver job {} did not finish before the deadline",
                    job_id
                )));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    pub async fn fetch_result(&self, job_id: &str) -> AppResult<OptimizeJobResult> {
        let response = self
            .http
            .get(self.url(&format!("optimize/{}/result", job_id)))
            .header("X-API-Key", &self.config.api_key)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Solver result fetch failed with status {}",
                response.status()
            )));
        }

        let result: OptimizeJobResult = response.json().await.map_err(map_reqwest_error)?;
        Ok(result)
    }

    /// Submit + polling + resultado de un lote completo
    pub async fn run_job(&self, job: &OptimizeJobRequest) -> AppResult<OptimizeJobResult> {
        let job_id = self.submit_job(job).await?;
        log::info!("📤 Lote enviado al solver, job {}", job_id);
        match self.poll_until_done(&job_id).await? {
            OptimizeJobStatus::Completed => self.fetch_result(&job_id).await,
            _ => Err(AppError::ExternalApi(format!(
                "Solver job {} failed",
                job_id
            ))),
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::ExternalTimeout(format!("Solver request timed out: {}", e))
    } else {
        AppError::ExternalApi(format!("Solver request failed: {}", e))
    }
}

fn to_optimizer_location(location: &Location) -> OptimizerLocation {
    OptimizerLocation {
        id: location.id.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
    }
}

fn build_job(
    vehicles: &[VehicleCandidate],
    requests: &[BookingRequest],
    locations: &HashMap<String, Location>,
) -> AppResult<OptimizeJobRequest> {
    let mut job_vehicles = Vec::with_capacity(vehicles.len());
    for candidate in vehicles {
        let base = locations
            .get(&candidate.vehicle.base_location_id)
            .ok_or_else(|| not_found_error("Location", &candidate.vehicle.base_location_id))?;
        job_vehicles.push(OptimizerVehicle {
            id: candidate.vehicle.id.clone(),
            capacity: candidate.vehicle.capacity,
            base_location: to_optimizer_location(base),
            unavailability: None,
        });
    }

    let mut job_requests = Vec::with_capacity(requests.len());
    for request in requests {
        let pickup = locations
            .get(&request.departure_location_id)
            .ok_or_else(|| not_found_error("Location", &request.departure_location_id))?;
        let dropoff = locations
            .get(&request.arrival_location_id)
            .ok_or_else(|| not_found_error("Location", &request.arrival_location_id))?;
        job_requests.push(OptimizerRequest {
            id: request.id.clone(),
            pickup_location: to_optimizer_location(pickup),
            dropoff_location: to_optimizer_location(dropoff),
            dropoff_time: request.arrival_time,
            capacity_demand: request.number_of_passengers,
        });
    }

    Ok(OptimizeJobRequest {
        vehicles: job_vehicles,
        requests: job_requests,
    })
}

async fn load_locations_for(
    conn: &mut PgConnection,
    vehicles: &[VehicleCandidate],
    requests: &[BookingRequest],
) -> AppResult<HashMap<String, Location>> {
    let mut ids: Vec<String> = Vec::new();
    for candidate in vehicles {
        if !ids.contains(&candidate.vehicle.base_location_id) {
            ids.push(candidate.vehicle.base_location_id.clone());
        }
    }
    for request in requests {
        for id in [&request.departure_location_id, &request.arrival_location_id] {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    let locations = LocationRepository::find_many_by_ids(conn, &ids).await?;
    Ok(locations.into_iter().map(|l| (l.id.clone(), l)).collect())
}

/// Corrida completa de optimización: agrupa por fecha, somete lotes y aplica
/// todos los resultados aceptados en una sola transacción.
pub async fn run_nightly_optimization<R: Rng + ?Sized>(
    pool: &PgPool,
    client: &OptimizerClient,
    offset_hours: i32,
    rng: &mut R,
) -> AppResult<()> {
    let now = Utc::now();
    let mut conn = pool.acquire().await?;

    let lookahead_days = setting_service::get_i64(
        &mut *conn,
        crate::models::setting::keys::TRIP_OPTIMIZER_LOOKAHEAD_DAYS,
        DEFAULT_LOOKAHEAD_DAYS,
    )
    .await?;

    let pending = BookingRequestRepository::find_pending_in_window(
        &mut *conn,
        now,
        now + Duration::days(lookahead_days),
    )
    .await?;
    let candidates: Vec<BookingRequest> = pending
        .into_iter()
        .filter(|r| r.kind == BookingKind::OneWay && r.priority != Priority::High)
        .collect();

    if candidates.is_empty() {
        log::info!("🌙 Corrida nocturna sin solicitudes pendientes");
        return Ok(());
    }

    // Agrupación por fecha de calendario local (offset UTC fijo)
    let mut by_date: BTreeMap<i64, Vec<BookingRequest>> = BTreeMap::new();
    for request in candidates {
        by_date
            .entry(day_index(request.departure_time, offset_hours))
            .or_default()
            .push(request);
    }
    log::info!("🌙 Corrida nocturna: {} fecha(s) con solicitudes", by_date.len());

    let mut considered_ids: Vec<String> = Vec::new();
    let mut accepted: Vec<OptimizedTrip> = Vec::new();
    let mut requests_by_id: HashMap<String, BookingRequest> = HashMap::new();

    for (index, date_requests) in &by_date {
        let (day_start, day_end) = day_bounds(*index, offset_hours);

        let all = VehicleRepository::find_dispatch_candidates(&mut *conn, day_start).await?;
        let smallest_demand = date_requests
            .iter()
            .map(|r| r.number_of_passengers)
            .min()
            .unwrap_or(1);
        let available =
            availability_service::filter_available(all, day_start, day_end, smallest_demand);
        if available.is_empty() {
            log::warn!("⚠️ Sin vehículos disponibles para el día {}, se saltea", index);
            continue;
        }

        let capped = batch_planner::cap_vehicle_pool(available, date_requests, rng);
        let sizes = batch_planner::even_batch_sizes(date_requests.len(), MAX_REQUESTS_PER_JOB);
        let vehicle_batches = batch_planner::allocate_batch_vehicles(capped, &sizes, rng);

        let mut offset = 0usize;
        for (size, vehicles) in sizes.iter().zip(vehicle_batches) {
            let batch = &date_requests[offset..offset + size];
            offset += size;
            if vehicles.is_empty() {
                log::warn!("⚠️ Lote sin vehículos asignables, se descarta");
                continue;
            }

            // Toda solicitud sometida cuenta como considerada: sus trips
            // viejos se limpian en la aplicación aunque su lote haya caído
            for request in batch {
                considered_ids.push(request.id.clone());
                requests_by_id.insert(request.id.clone(), request.clone());
            }

            let locations = load_locations_for(&mut *conn, &vehicles, batch).await?;
            let job = build_job(&vehicles, batch, &locations)?;
            match client.run_job(&job).await {
                Ok(result) => accepted.extend(result.scheduled_trips),
                Err(e) => {
                    // Lote caído o vencido: se descarta y la próxima corrida lo retoma
                    log::warn!("⚠️ Lote descartado: {}", e);
                }
            }
        }
    }

    if accepted.is_empty() {
        log::info!("🌙 Corrida nocturna sin resultados aplicables");
        return Ok(());
    }

    // Aplicación atómica: o entran todos los trips aceptados o ninguno
    let mut tx = pool.begin().await?;

    for request_id in &considered_ids {
        let trip_ids = TripRepository::find_ids_by_booking_request(&mut *tx, request_id).await?;
        for trip_id in trip_ids {
            ScheduleRepository::delete_by_trip(&mut *tx, &trip_id).await?;
            TripRepository::delete(&mut *tx, &trip_id).await?;
        }
    }

    let mut created = 0usize;
    for optimized in &accepted {
        if trip_service::create_trip_from_optimizer_result(&mut *tx, optimized, &requests_by_id)
            .await?
            .is_some()
        {
            created += 1;
        }
    }

    tx.commit().await?;
    log::info!("🌙 Corrida nocturna aplicada: {} trip(s) creados", created);
    Ok(())
}

/// Vehículos disponibles para una ventana y capacidad dadas
pub async fn get_available_vehicles(
    pool: &PgPool,
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
    min_capacity: i32,
) -> AppResult<Vec<VehicleCandidate>> {
    let mut conn = pool.acquire().await?;
    let candidates = VehicleRepository::find_dispatch_candidates(&mut *conn, start).await?;
    Ok(availability_service::filter_available(
        candidates,
        start,
        end,
        min_capacity,
    ))
}

/// Trips agendados a los que la solicitud dada podría sumarse
pub async fn get_combinable_trips(
    pool: &PgPool,
    booking_request_id: &str,
    offset_hours: i32,
) -> AppResult<Vec<TripDetail>> {
    let mut conn = pool.acquire().await?;
    let request = BookingRequestRepository::find_by_id(&mut *conn, booking_request_id)
        .await?
        .ok_or_else(|| not_found_error("BookingRequest", booking_request_id))?;
    if request.kind != BookingKind::OneWay || request.status != RequestStatus::Pending {
        return Err(AppError::InvalidState(format!(
            "Booking request {} is not a pending one-way request",
            booking_request_id
        )));
    }

    let trips = TripRepository::find_scheduled_departing_after(&mut *conn, Utc::now()).await?;
    let mut details = Vec::new();
    for trip in trips {
        if let Some(detail) = TripRepository::find_detail(&mut *conn, &trip.id).await? {
            if trip_matching_service::is_combinable(&request, &detail, offset_hours) {
                details.push(detail);
            }
        }
    }
    Ok(details)
}

/// Suma una solicitud pendiente a un trip agendado puntual, validando los
/// mismos invariantes que el matcher.
pub async fn add_booking_request_to_trip(
    pool: &PgPool,
    booking_request_id: &str,
    trip_id: &str,
    offset_hours: i32,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let request = BookingRequestRepository::find_by_id(&mut *tx, booking_request_id)
        .await?
        .ok_or_else(|| not_found_error("BookingRequest", booking_request_id))?;
    let detail = TripRepository::find_detail(&mut *tx, trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", trip_id))?;

    if !trip_matching_service::is_combinable(&request, &detail, offset_hours) {
        return Err(AppError::Conflict(format!(
            "Booking request {} cannot be combined into trip {}",
            booking_request_id, trip_id
        )));
    }

    trip_service::add_request_to_trip(&mut *tx, &request, &detail).await?;
    tx.commit().await?;
    Ok(())
}
