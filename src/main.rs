use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use trip_scheduling::config::database::DatabaseConfig;
use trip_scheduling::config::environment::EnvironmentConfig;
use trip_scheduling::middleware::cors::cors_middleware;
use trip_scheduling::state::AppState;
use trip_scheduling::{cron, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚌 Trip Scheduling & Optimization Orchestrator");
    info!("==============================================");

    let config = EnvironmentConfig::from_env();

    // Inicializar base de datos
    let pool = match DatabaseConfig::default().create_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app_state = AppState::new(pool, config);

    // Jobs programados: optimizador nocturno y finalizador de trips
    cron::start(app_state.clone());

    let app = Router::new()
        .route("/health", get(health))
        .nest(
            "/api/booking-request",
            routes::booking_request_routes::create_booking_request_router(),
        )
        .nest("/api/trip", routes::trip_routes::create_trip_router())
        .nest(
            "/api/optimizer",
            routes::optimizer_routes::create_optimizer_router(),
        )
        .layer(cors_middleware())
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   POST   /api/booking-request - Crear y despachar solicitud");
    info!("   GET    /api/booking-request/:id - Consultar solicitud");
    info!("   PUT    /api/booking-request/:id - Editar y re-despachar");
    info!("   POST   /api/booking-request/:id/reject - Rechazar");
    info!("   POST   /api/booking-request/:id/cancel - Cancelar");
    info!("   POST   /api/trip/combined - Crear trip combinado manual");
    info!("   POST   /api/trip/:id/approve - Aprobar trip provisional");
    info!("   GET    /api/booking-request/:id/combinable-trips - Trips combinables");
    info!("   POST   /api/trip/:id/booking-request - Sumar solicitud a un trip");
    info!("   POST   /api/optimizer/run - Disparar la corrida de optimización");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Señal de apagado recibida, cerrando");
}
