// src/db.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    models::{
        dashboard::LeadStats,
        lead::{Lead, LeadComment, LeadFilter},
        property::{Property, PropertyFilter},
    },
};

pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod property_repo;
pub use property_repo::PropertyRepository;

#[cfg(test)]
pub mod memory;

/// Armazenamento de leads e comentários.
///
/// Os serviços montam o registro completo (id, timestamps, campos derivados)
/// e o store apenas persiste; cada chamada é atômica por registro.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert(&self, lead: &Lead) -> Result<Lead, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lead>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>, AppError>;
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Lead>, AppError>;
    async fn update(&self, lead: &Lead) -> Result<Lead, AppError>;
    /// Remove o lead; propriedades e comentários vão junto (cascade).
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Contagens agrupadas para o dashboard.
    async fn stats(&self) -> Result<LeadStats, AppError>;
    /// Ordenado por score desc, depois criação desc. Retorna (página, total).
    async fn list_filtered(&self, filter: &LeadFilter, page: &Pagination) -> Result<(Vec<Lead>, u64), AppError>;
    /// Apenas prioritários, ordenados por score desc, depois área desc.
    async fn list_priority(&self, page: &Pagination) -> Result<(Vec<Lead>, u64), AppError>;

    async fn insert_comment(&self, comment: &LeadComment) -> Result<LeadComment, AppError>;
    /// Mais recentes primeiro.
    async fn list_comments(&self, lead_id: Uuid, page: &Pagination) -> Result<(Vec<LeadComment>, u64), AppError>;
}

/// Armazenamento das propriedades rurais.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn insert(&self, property: &Property) -> Result<Property, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, AppError>;
    async fn update(&self, property: &Property) -> Result<Property, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    /// Na ordem de cadastro.
    async fn list_by_lead(&self, lead_id: Uuid) -> Result<Vec<Property>, AppError>;
    async fn list_all(&self) -> Result<Vec<Property>, AppError>;
    /// Mais recentes primeiro. Retorna (página, total).
    async fn list_filtered(&self, filter: &PropertyFilter, page: &Pagination) -> Result<(Vec<Property>, u64), AppError>;
}
