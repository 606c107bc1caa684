//! Lectura tipada de settings persistidos
//!
//! Los jobs leen su hora de corrida y sus parámetros de la tabla settings en
//! cada iteración, así un cambio de configuración aplica sin reiniciar.

use sqlx::PgConnection;

use crate::repositories::setting_repository::SettingRepository;
use crate::utils::errors::AppResult;

pub async fn get_bool(conn: &mut PgConnection, key: &str, default: bool) -> AppResult<bool> {
    let setting = SettingRepository::get(conn, key).await?;
    Ok(setting
        .and_then(|s| s.value.trim().parse::<bool>().ok())
        .unwrap_or(default))
}

pub async fn get_i64(conn: &mut PgConnection, key: &str, default: i64) -> AppResult<i64> {
    let setting = SettingRepository::get(conn, key).await?;
    Ok(setting
        .and_then(|s| s.value.trim().parse::<i64>().ok())
        .unwrap_or(default))
}

/// Hora local "HH:mm" de un setting; cae al default si falta o está malformado
pub async fn get_time(
    conn: &mut PgConnection,
    key: &str,
    default: (u32, u32),
) -> AppResult<(u32, u32)> {
    let setting = SettingRepository::get(conn, key).await?;
    Ok(setting
        .and_then(|s| parse_hhmm(&s.value))
        .unwrap_or(default))
}

/// Parsea "HH:mm" en (hora, minuto). Devuelve None fuera de rango.
pub fn parse_hhmm(value: &str) -> Option<(u32, u32)> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some((hours, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmm_valid() {
        assert_eq!(parse_hhmm("23:00"), Some((23, 0)));
        assert_eq!(parse_hhmm(" 7:05 "), Some((7, 5)));
        assert_eq!(parse_hhmm("00:00"), Some((0, 0)));
    }

    #[test]
    fn test_parse_hhmm_invalid() {
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("12:60"), None);
        assert_eq!(parse_hhmm("1200"), None);
        assert_eq!(parse_hhmm("aa:bb"), None);
    }
}
