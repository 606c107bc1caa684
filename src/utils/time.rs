//! Utilidades de tiempo con offset fijo
//!
//! El agrupamiento por fecha de calendario usa un offset UTC fijo
//! (por defecto +7), no la zona horaria del sistema.

use chrono::{DateTime, FixedOffset, Utc};

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Offset fijo en horas → `FixedOffset` de chrono
pub fn fixed_offset(offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
}

/// Índice de día local: días completos desde epoch en la zona fija.
/// Dos instantes comparten índice sii caen en la misma fecha local.
pub fn day_index(dt: DateTime<Utc>, offset_hours: i32) -> i64 {
    (dt.timestamp() + i64::from(offset_hours) * 3600).div_euclid(SECS_PER_DAY)
}

/// Límites UTC `[inicio, fin)` del día local identificado por su índice
pub fn day_bounds(index: i64, offset_hours: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_secs = index * SECS_PER_DAY - i64::from(offset_hours) * 3600;
    let start = DateTime::<Utc>::from_timestamp(start_secs, 0)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap());
    let end = DateTime::<Utc>::from_timestamp(start_secs + SECS_PER_DAY, 0)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap());
    (start, end)
}

/// Clave de fecha local en formato `yyyy-mm-dd`
pub fn date_key(dt: DateTime<Utc>, offset_hours: i32) -> String {
    dt.with_timezone(&fixed_offset(offset_hours))
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_index_splits_at_local_midnight() {
        // 16:59 UTC = 23:59 en UTC+7; 17:00 UTC ya es el día siguiente local
        let before = Utc.with_ymd_and_hms(2025, 3, 10, 16, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap();
        assert_eq!(day_index(before, 7) + 1, day_index(after, 7));
    }

    #[test]
    fn test_date_key_uses_fixed_offset() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap();
        assert_eq!(date_key(dt, 7), "2025-03-11");
        assert_eq!(date_key(dt, 0), "2025-03-10");
    }

    #[test]
    fn test_day_bounds_round_trip() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap();
        let index = day_index(dt, 7);
        let (start, end) = day_bounds(index, 7);
        assert!(start <= dt && dt < end);
        assert_eq!(end - start, chrono::Duration::days(1));
        // El inicio del día local es medianoche en UTC+7
        assert_eq!(day_index(start, 7), index);
        assert_eq!(day_index(end, 7), index + 1);
    }

    #[test]
    fn test_same_local_date_same_index() {
        let a = Utc.with_ymd_and_hms(2025, 3, 10, 17, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 3, 11, 16, 59, 59).unwrap();
        assert_eq!(day_index(a, 7), day_index(b, 7));
        assert_eq!(date_key(a, 7), date_key(b, 7));
    }
}
