//src/main.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod handlers;
mod models;
mod services;

use crate::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let lead_routes = Router::new()
        .route("/", post(handlers::leads::create_lead).get(handlers::leads::list_leads))
        .route("/prioritarios", get(handlers::leads::list_priority_leads))
        .route(
            "/{id}",
            get(handlers::leads::get_lead)
                .patch(handlers::leads::update_lead)
                .delete(handlers::leads::delete_lead),
        )
        .route("/{id}/summary", get(handlers::leads::get_lead_summary))
        .route("/{id}/status", patch(handlers::leads::update_lead_status))
        .route(
            "/{id}/comments",
            post(handlers::leads::add_comment).get(handlers::leads::list_comments),
        );

    let property_routes = Router::new()
        .route(
            "/",
            post(handlers::properties::create_property).get(handlers::properties::list_properties),
        )
        .route(
            "/{id}",
            get(handlers::properties::get_property)
                .patch(handlers::properties::update_property)
                .delete(handlers::properties::delete_property),
        )
        .route("/lead/{lead_id}/insights", get(handlers::properties::get_lead_insights))
        .route("/analytics/hotspots", get(handlers::properties::get_geographic_hotspots))
        .route("/kml/upload", post(handlers::properties::upload_kml));

    let dashboard_routes = Router::new()
        .route("/overview", get(handlers::dashboard::get_overview))
        .route("/funnel", get(handlers::dashboard::get_funnel));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/leads", lead_routes)
        .nest("/api/properties", property_routes)
        .nest("/api/dashboard", dashboard_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
