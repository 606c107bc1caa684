//! Repositorio del contador de IDs legibles
//!
//! Cada tabla con IDs "PREFIX-N" tiene una fila en id_counters. La fila se
//! toma con FOR UPDATE dentro de la transacción del llamador, de modo que
//! dos escritores concurrentes nunca emiten el mismo número.

use sqlx::{FromRow, PgConnection};

use crate::utils::errors::AppResult;

#[derive(Debug, Clone, FromRow)]
pub struct IdCounter {
    pub table_name: String,
    pub prefix: String,
    pub current_id: i64,
}

pub struct IdCounterRepository;

impl IdCounterRepository {
    /// Crea la fila del contador si todavía no existe.
    pub async fn ensure(
        conn: &mut PgConnection,
        table_name: &str,
        prefix: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO id_counters (table_name, prefix, current_id)
            VALUES ($1, $2, 0)
            ON CONFLICT (table_name) DO NOTHING
            "#,
        )
        .bind(table_name)
        .bind(prefix)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn fetch_for_update(
        conn: &mut PgConnection,
        table_name: &str,
    ) -> AppResult<Option<IdCounter>> {
        let counter = sqlx::query_as::<_, IdCounter>(
            "SELECT * FROM id_counters WHERE table_name = $1 FOR UPDATE",
        )
        .bind(table_name)
        .fetch_optional(conn)
        .await?;

        Ok(counter)
    }

    pub async fn advance(
        conn: &mut PgConnection,
        table_name: &str,
        new_value: i64,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE id_counters SET current_id = $2 WHERE table_name = $1")
            .bind(table_name)
            .bind(new_value)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
