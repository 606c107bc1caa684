//! Repositorio de settings (clave/valor de configuración de los jobs)

use sqlx::PgConnection;

use crate::models::setting::Setting;
use crate::utils::errors::AppResult;

pub struct SettingRepository;

impl SettingRepository {
    pub async fn get(conn: &mut PgConnection, key: &str) -> AppResult<Option<Setting>> {
        let setting = sqlx::query_as::<_, Setting>("SELECT * FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(conn)
            .await?;

        Ok(setting)
    }
}
