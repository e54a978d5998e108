// src/config.rs

use crate::{
    db::{LeadRepository, LeadStore, PropertyRepository, PropertyStore},
    services::{DashboardService, LeadService, PropertyService},
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

// Configuração lida do ambiente (.env)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {value}"))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self { database_url, max_connections, bind_addr })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub lead_service: LeadService,
    pub property_service: PropertyService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let leads: Arc<dyn LeadStore> = Arc::new(LeadRepository::new(db_pool.clone()));
        let properties: Arc<dyn PropertyStore> = Arc::new(PropertyRepository::new(db_pool.clone()));

        Ok(Self {
            db_pool,
            lead_service: LeadService::new(leads.clone()),
            property_service: PropertyService::new(leads.clone(), properties),
            dashboard_service: DashboardService::new(leads),
        })
    }
}
