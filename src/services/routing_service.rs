//! Estimación de rutas entre locations
//!
//! El materializador de trips combinados necesita una estimación de
//! distancia/duración entre paradas consecutivas. El trait permite enchufar
//! un proveedor externo; el default es gran círculo (haversine) con una
//! velocidad promedio configurable.

use async_trait::async_trait;

use crate::models::location::Location;
use crate::utils::errors::AppResult;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy)]
pub struct RouteDetails {
    pub distance_meters: f64,
    pub duration_minutes: f64,
}

#[async_trait]
pub trait RouteEstimator: Send + Sync {
    async fn estimate_route_details(
        &self,
        from: &Location,
        to: &Location,
    ) -> AppResult<RouteDetails>;
}

/// Estimador por distancia de gran círculo y velocidad promedio constante
#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    pub avg_speed_kmh: f64,
}

impl HaversineEstimator {
    pub fn new(avg_speed_kmh: f64) -> Self {
        Self { avg_speed_kmh }
    }
}

#[async_trait]
impl RouteEstimator for HaversineEstimator {
    async fn estimate_route_details(
        &self,
        from: &Location,
        to: &Location,
    ) -> AppResult<RouteDetails> {
        let distance_meters =
            haversine_meters(from.latitude, from.longitude, to.latitude, to.longitude);
        let duration_minutes = distance_meters / 1000.0 / self.avg_speed_kmh * 60.0;
        Ok(RouteDetails {
            distance_meters,
            duration_minutes,
        })
    }
}

/// Distancia de gran círculo en metros
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_meters(13.75, 100.5, 13.75, 100.5), 0.0);
    }

    #[test]
    fn test_haversine_known_distance() {
        // Un grado de latitud son ~111.2 km
        let d = haversine_meters(13.0, 100.5, 14.0, 100.5);
        assert!((d - 111_195.0).abs() < 500.0, "distancia fuera de rango: {}", d);
    }

    #[tokio::test]
    async fn test_duration_scales_with_speed() {
        let from = Location {
            id: "LOC-A".to_string(),
            name: "A".to_string(),
            address: None,
            latitude: 13.0,
            longitude: 100.5,
        };
        let to = Location {
            id: "LOC-B".to_string(),
            name: "B".to_string(),
            address: None,
            latitude: 13.5,
            longitude: 100.5,
        };
        let slow = HaversineEstimator::new(30.0)
            .estimate_route_details(&from, &to)
            .await
            .unwrap();
        let fast = HaversineEstimator::new(60.0)
            .estimate_route_details(&from, &to)
            .await
            .unwrap();
        assert!((slow.duration_minutes - 2.0 * fast.duration_minutes).abs() < 1e-6);
        assert_eq!(slow.distance_meters, fast.distance_meters);
    }
}
