//! Filtro de disponibilidad de vehículos
//!
//! Función pura sobre snapshots ya cargados: dado un intervalo `[start, end)`
//! y una capacidad mínima, devuelve los pares (vehículo, conductor) sin
//! conflicto de agenda. La misma función alimenta la asignación inmediata y
//! el pool de la corrida nocturna, por eso no toca la base.

use chrono::{DateTime, Utc};

use crate::models::vehicle::{VehicleCandidate, VehicleStatus};

/// Devuelve los candidatos que pueden tomar un viaje en `[start, end)` con al
/// menos `min_capacity` asientos. Excluye vehículos retirados o fuera de
/// servicio, vehículos ejecutivos (dedicados) y conductores cuya agenda se
/// solapa con la ventana pedida.
pub fn filter_available(
    candidates: Vec<VehicleCandidate>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_capacity: i32,
) -> Vec<VehicleCandidate> {
    candidates
        .into_iter()
        .filter(|candidate| {
            let vehicle = &candidate.vehicle;
            if matches!(
                vehicle.status,
                VehicleStatus::Retired | VehicleStatus::OutOfService
            ) {
                return false;
            }
            if vehicle.executive {
                return false;
            }
            if vehicle.capacity < min_capacity {
                return false;
            }
            // Solape de intervalos semiabiertos: s.start < end && s.end > start
            !candidate
                .schedules
                .iter()
                .any(|schedule| schedule.overlaps(start, end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::Schedule;
    use crate::models::vehicle::{Driver, DriverAvailability, Vehicle};
    use chrono::TimeZone;

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

    fn schedule(start_h: u32, end_h: u32) -> Schedule {
        Schedule {
            id: "SCH-1".to_string(),
            title: "Viaje".to_string(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2025, 5, 2, start_h, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 5, 2, end_h, 0, 0).unwrap(),
            driver_id: Some("DRV-V1".to_string()),
            vehicle_id: None,
            trip_id: None,
        }
    }

    fn window(start_h: u32, end_h: u32) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2025, 5, 2, start_h, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 2, end_h, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_excludes_overlapping_schedule() {
        let mut c = candidate("V1", 4);
        c.schedules.push(schedule(9, 11));
        let (start, end) = window(10, 12);
        assert!(filter_available(vec![c], start, end, 1).is_empty());
    }

    #[test]
    fn test_adjacent_schedule_does_not_conflict() {
        // Intervalos semiabiertos: [8,10) no choca con [10,12)
        let mut c = candidate("V1", 4);
        c.schedules.push(schedule(8, 10));
        let (start, end) = window(10, 12);
        assert_eq!(filter_available(vec![c], start, end, 1).len(), 1);
    }

    #[test]
    fn test_excludes_by_capacity() {
        let (start, end) = window(10, 12);
        let result = filter_available(vec![candidate("V1", 3)], start, end, 4);
        assert!(result.is_empty());
    }

    #[test]
    fn test_excludes_executive_and_inactive() {
        let mut exec = candidate("V1", 4);
        exec.vehicle.executive = true;
        let mut retired = candidate("V2", 4);
        retired.vehicle.status = VehicleStatus::Retired;
        let mut out = candidate("V3", 4);
        out.vehicle.status = VehicleStatus::OutOfService;
        let ok = candidate("V4", 4);

        let (start, end) = window(10, 12);
        let result = filter_available(vec![exec, retired, out, ok], start, end, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].vehicle.id, "V4");
    }

    #[test]
    fn test_keeps_input_order() {
        let (start, end) = window(10, 12);
        let result = filter_available(
            vec![candidate("V1", 4), candidate("V2", 4), candidate("V3", 4)],
            start,
            end,
            1,
        );
        let ids: Vec<&str> = result.iter().map(|c| c.vehicle.id.as_str()).collect();
        assert_eq!(ids, vec!["V1", "V2", "V3"]);
    }
}
