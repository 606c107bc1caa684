//! Repositorio de locations

use sqlx::PgConnection;

use crate::models::location::Location;
use crate::utils::errors::AppResult;

pub struct LocationRepository;

impl LocationRepository {
    pub async fn find_many_by_ids(
        conn: &mut PgConnection,
        ids: &[String],
    ) -> AppResult<Vec<Location>> {
        let locations =
            sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(conn)
                .await?;

        Ok(locations)
    }
}
