//! Armado de lotes para el solver externo
//!
//! El solver acepta un máximo de solicitudes por job, así que la corrida
//! nocturna parte cada fecha en lotes casi iguales y reparte el pool de
//! vehículos entre ellos con cotas por lote. La aleatoriedad (recorte del
//! pool y de lotes sobrados) entra como `Rng` inyectado para que los tests
//! puedan fijar la semilla.

use rand::Rng;

use crate::models::booking_request::BookingRequest;
use crate::models::vehicle::VehicleCandidate;

/// Límite de solicitudes por job impuesto por el solver
pub const MAX_REQUESTS_PER_JOB: usize = 4;

/// Tamaños de lote casi iguales: mínimo número de lotes que respeta
/// `max_per_batch`, con el resto repartido en los primeros lotes.
pub fn even_batch_sizes(total: usize, max_per_batch: usize) -> Vec<usize> {
    if total == 0 || max_per_batch == 0 {
        return Vec::new();
    }
    let batch_count = total.div_ceil(max_per_batch);
    let base = total / batch_count;
    let remainder = total % batch_count;
    (0..batch_count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Recorta el pool de una fecha al tope `requests + 1`: primero descarta los
/// vehículos en los que no entra ninguna solicitud; si sigue sobrando, saca
/// vehículos al azar hasta el tope.
pub fn cap_vehicle_pool<R: Rng + ?Sized>(
    pool: Vec<VehicleCandidate>,
    requests: &[BookingRequest],
    rng: &mut R,
) -> Vec<VehicleCandidate> {
    let cap = requests.len() + 1;
    if pool.len() <= cap {
        return pool;
    }

    let smallest_demand = requests
        .iter()
        .map(|r| r.number_of_passengers)
        .min()
        .unwrap_or(0);
    let mut suitable: Vec<VehicleCandidate> = pool
        .into_iter()
        .filter(|c| c.vehicle.capacity >= smallest_demand)
        .collect();

    while suitable.len() > cap {
        let victim = rng.gen_range(0..suitable.len());
        suitable.remove(victim);
    }
    suitable
}

/// Reparte el pool (ya recortado) entre los lotes: tajada proporcional al
/// tamaño del lote, recorte de todo lote por encima de `size + 2` y refuerzo
/// de todo lote por debajo de `size + 1`. El refuerzo toma primero vehículos
/// sin usar y, agotados esos, presta del pool completo de la fecha: el mismo
/// vehículo puede quedar ofrecido a dos lotes, el solver lo ocupa a lo sumo
/// en uno.
pub fn allocate_batch_vehicles<R: Rng + ?Sized>(
    pool: Vec<VehicleCandidate>,
    batch_sizes: &[usize],
    rng: &mut R,
) -> Vec<Vec<VehicleCandidate>> {
    let total_requests: usize = batch_sizes.iter().sum();
    if total_requests == 0 {
        return batch_sizes.iter().map(|_| Vec::new()).collect();
    }

    let pool_len = pool.len();
    let full_pool = pool.clone();
    let mut remaining = pool;
    let mut batches: Vec<Vec<VehicleCandidate>> = Vec::with_capacity(batch_sizes.len());

    for &size in batch_sizes {
        let share = (pool_len * size / total_requests).min(remaining.len());
        batches.push(remaining.drain(..share).collect());
    }

    // Recorte primero, para que los sobrantes alimenten los refuerzos
    for (batch, &size) in batches.iter_mut().zip(batch_sizes) {
        let upper = size + 2;
        while batch.len() > upper {
            let victim = rng.gen_range(0..batch.len());
            remaining.push(batch.remove(victim));
        }
    }

    for (batch, &size) in batches.iter_mut().zip(batch_sizes) {
        let lower = size + 1;
        while batch.len() < lower {
            if let Some(vehicle) = remaining.pop() {
                batch.push(vehicle);
                continue;
            }
            // Pool sin usar agotado: prestar del pool completo, sin repetir
            // vehículo dentro del mismo lote
            let borrowed = full_pool
                .iter()
                .find(|c| batch.iter().all(|b| b.vehicle.id != c.vehicle.id));
            match borrowed {
                Some(vehicle) => batch.push(vehicle.clone()),
                None => break,
            }
        }
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking_request::{BookingKind, Priority, RequestStatus};
    use crate::models::vehicle::{Driver, DriverAvailability, Vehicle, VehicleStatus};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn candidate(id: &str, capacity: i32) -> VehicleCandidate {
        VehicleCandidate {
            vehicle: Vehicle {
                id: id.to_string(),
                license_plate: format!("PLATE-{}", id),
                capacity,
                status: VehicleStatus::Active,
                executive: false,
                base_location_id: "LOC-1".to_string(),
                driver_id: Some(format!("DRV-{}", id)),
            },
            driver: Driver {
                id: format!("DRV-{}", id),
                name: "Conductor".to_string(),
                availability: DriverAvailability::Available,
            },
            schedules: Vec::new(),
        }
    }

    fn request(id: &str, passengers: i32) -> BookingRequest {
        BookingRequest {
            id: id.to_string(),
            kind: BookingKind::OneWay,
            status: RequestStatus::Pending,
            priority: Priority::Normal,
            number_of_passengers: passengers,
            requester_id: "USR-1".to_string(),
            contact_name: "Ana".to_string(),
            contact_phone: "555-0100".to_string(),
            trip_purpose: None,
            note: None,
            departure_time: Utc.with_ymd_and_hms(2025, 5, 2, 8, 0, 0).unwrap(),
            arrival_time: Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap(),
            departure_location_id: "LOC-A".to_string(),
            arrival_location_id: "LOC-B".to_string(),
            is_reserved: false,
            return_departure_time: None,
            return_arrival_time: None,
            return_departure_location_id: None,
            return_arrival_location_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_even_batch_sizes_five_over_four() {
        assert_eq!(even_batch_sizes(5, MAX_REQUESTS_PER_JOB), vec![3, 2]);
    }

    #[test]
    fn test_even_batch_sizes_preserve_total_and_cap() {
        for total in 1..=40 {
            let sizes = even_batch_sizes(total, MAX_REQUESTS_PER_JOB);
            assert_eq!(sizes.iter().sum::<usize>(), total);
            assert!(sizes.iter().all(|&s| s <= MAX_REQUESTS_PER_JOB));
            // Casi iguales: diferencia máxima de 1 entre lotes
            let max = sizes.iter().max().unwrap();
            let min = sizes.iter().min().unwrap();
            assert!(max - min <= 1);
        }
    }

    #[test]
    fn test_cap_vehicle_pool_drops_unsuitable_first() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = vec![
            candidate("V1", 2),
            candidate("V2", 8),
            candidate("V3", 8),
            candidate("V4", 8),
            candidate("V5", 8),
        ];
        // Ninguna solicitud entra en V1 (mínimo 4 pasajeros)
        let requests = vec![request("BR-1", 4), request("BR-2", 5)];
        let capped = cap_vehicle_pool(pool, &requests, &mut rng);
        assert!(capped.len() <= requests.len() + 1);
        assert!(capped.iter().all(|c| c.vehicle.id != "V1"));
    }

    #[test]
    fn test_cap_vehicle_pool_respects_small_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = vec![candidate("V1", 4), candidate("V2", 4)];
        let requests = vec![request("BR-1", 2), request("BR-2", 2)];
        let capped = cap_vehicle_pool(pool, &requests, &mut rng);
        assert_eq!(capped.len(), 2);
    }

    #[test]
    fn test_allocate_respects_per_batch_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let pool: Vec<VehicleCandidate> = (1..=10)
            .map(|i| candidate(&format!("V{}", i), 4))
            .collect();
        let sizes = vec![3, 2];
        let batches = allocate_batch_vehicles(pool, &sizes, &mut rng);
        assert_eq!(batches.len(), 2);
        for (batch, &size) in batches.iter().zip(&sizes) {
            assert!(batch.len() >= size + 1, "lote con menos de size+1 vehículos");
            assert!(batch.len() <= size + 2, "lote con más de size+2 vehículos");
        }
    }

    #[test]
    fn test_allocate_never_duplicates_vehicles_within_a_batch() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool: Vec<VehicleCandidate> = (1..=9)
            .map(|i| candidate(&format!("V{}", i), 4))
            .collect();
        let batches = allocate_batch_vehicles(pool, &[4, 4], &mut rng);
        for batch in &batches {
            let mut ids: Vec<&str> = batch.iter().map(|c| c.vehicle.id.as_str()).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), total, "vehículo repetido dentro de un lote");
        }
    }

    #[test]
    fn test_allocate_with_scarce_pool_offers_whole_pool_to_each_batch() {
        let mut rng = StdRng::seed_from_u64(5);
        let pool = vec![candidate("V1", 4), candidate("V2", 4)];
        let batches = allocate_batch_vehicles(pool, &[3, 2], &mut rng);
        for batch in &batches {
            // Nunca se inventan vehículos ni se repiten dentro del lote
            assert_eq!(batch.len(), 2);
            assert!(batch.iter().any(|c| c.vehicle.id == "V1"));
            assert!(batch.iter().any(|c| c.vehicle.id == "V2"));
        }
    }

    #[test]
    fn test_full_pipeline_five_requests_ten_vehicles() {
        // 5 solicitudes y 10 vehículos libres: el pool queda en 6, los lotes
        // en 3+2 y cada lote recibe entre size+1 y size+2 vehículos.
        let mut rng = StdRng::seed_from_u64(42);
        let pool: Vec<VehicleCandidate> = (1..=10)
            .map(|i| candidate(&format!("V{}", i), 4))
            .collect();
        let requests: Vec<BookingRequest> = (1..=5)
            .map(|i| request(&format!("BR-{}", i), 2))
            .collect();

        let capped = cap_vehicle_pool(pool, &requests, &mut rng);
        assert_eq!(capped.len(), requests.len() + 1);

        let sizes = even_batch_sizes(requests.len(), MAX_REQUESTS_PER_JOB);
        assert_eq!(sizes, vec![3, 2]);

        let batches = allocate_batch_vehicles(capped, &sizes, &mut rng);
        for (batch, &size) in batches.iter().zip(&sizes) {
            assert!(
                batch.len() >= size + 1,
                "lote de {} solicitudes con solo {} vehículos",
                size,
                batch.len()
            );
            assert!(batch.len() <= size + 2);
            let mut ids: Vec<&str> = batch.iter().map(|c| c.vehicle.id.as_str()).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), total);
        }
    }
}
