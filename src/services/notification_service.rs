//! Envío de notificaciones
//!
//! Persiste la notificación como fila; la entrega efectiva (push, correo) la
//! hace un consumidor externo. El contrato que importa acá es a quién va
//! dirigida: un usuario puntual o todos los usuarios de un rol.

use sqlx::PgConnection;

use crate::models::booking_request::Priority;
use crate::repositories::notification_repository::{NewNotification, NotificationRepository};
use crate::utils::errors::AppResult;

pub const ROLE_COORDINATOR: &str = "coordinator";
pub const ROLE_ADMIN: &str = "admin";

/// Contenido de una notificación, sin destinatario
#[derive(Debug, Clone)]
pub struct NotificationBody {
    pub title: String,
    pub template_key: String,
    pub data: serde_json::Value,
    pub entity_id: Option<String>,
    pub priority: Priority,
}

pub async fn send_user_notification(
    conn: &mut PgConnection,
    body: &NotificationBody,
    user_id: &str,
) -> AppResult<()> {
    NotificationRepository::insert(
        conn,
        &NewNotification {
            title: body.title.clone(),
            template_key: body.template_key.clone(),
            data: body.data.clone(),
            entity_id: body.entity_id.clone(),
            priority: body.priority,
            user_id: Some(user_id.to_string()),
            role: None,
        },
    )
    .await?;
    log::info!("🔔 Notificación '{}' para usuario {}", body.template_key, user_id);
    Ok(())
}

pub async fn send_role_notification(
    conn: &mut PgConnection,
    body: &NotificationBody,
    role: &str,
) -> AppResult<()> {
    NotificationRepository::insert(
        conn,
        &NewNotification {
            title: body.title.clone(),
            template_key: body.template_key.clone(),
            data: body.data.clone(),
            entity_id: body.entity_id.clone(),
            priority: body.priority,
            user_id: None,
            role: Some(role.to_string()),
        },
    )
    .await?;
    log::info!("🔔 Notificación '{}' para rol {}", body.template_key, role);
    Ok(())
}

/// Aviso conjunto a coordinadores y administradores
pub async fn send_coordinator_and_admin_notification(
    conn: &mut PgConnection,
    body: &NotificationBody,
) -> AppResult<()> {
    send_role_notification(&mut *conn, body, ROLE_COORDINATOR).await?;
    send_role_notification(&mut *conn, body, ROLE_ADMIN).await?;
    Ok(())
}
