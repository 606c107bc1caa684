//! Repositorio de notificaciones
//!
//! Las notificaciones se persisten como filas; la entrega (push, correo) es
//! un consumidor aparte y queda fuera de este servicio.

use sqlx::PgConnection;

use crate::models::booking_request::Priority;
use crate::utils::errors::AppResult;

/// Notificación a insertar. `user_id` y `role` son destinatarios
/// alternativos: usuario puntual o todos los usuarios de un rol.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub title: String,
    pub template_key: String,
    pub data: serde_json::Value,
    pub entity_id: Option<String>,
    pub priority: Priority,
    pub user_id: Option<String>,
    pub role: Option<String>,
}

pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn insert(
        conn: &mut PgConnection,
        notification: &NewNotification,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (title, template_key, data, entity_id, priority, user_id, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&notification.title)
        .bind(&notification.template_key)
        .bind(&notification.data)
        .bind(&notification.entity_id)
        .bind(notification.priority)
        .bind(&notification.user_id)
        .bind(&notification.role)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}
