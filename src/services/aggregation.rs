// src/services/aggregation.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadStore, PropertyStore},
    models::{crop::CropType, lead::Lead, property::Property},
    services::scoring,
};

/// Área acima da qual o lead é prioritário.
pub const PRIORITY_AREA_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

/// Agregados do lead derivados das suas propriedades.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadAggregates {
    pub total_area_hectares: Decimal,
    pub main_crops: Vec<CropType>,
    pub is_prioritario: bool,
}

impl LeadAggregates {
    pub fn from_properties(properties: &[Property]) -> Self {
        let total_area_hectares: Decimal = properties.iter().map(|p| p.area_hectares).sum();

        let mut main_crops = Vec::new();
        for property in properties {
            if !main_crops.contains(&property.crop) {
                main_crops.push(property.crop);
            }
        }

        Self {
            total_area_hectares,
            main_crops,
            is_prioritario: total_area_hectares > PRIORITY_AREA_THRESHOLD,
        }
    }

    /// Grava os agregados e recalcula segmento e score com a área nova.
    pub fn apply_to(self, lead: &mut Lead) {
        lead.total_area_hectares = Some(self.total_area_hectares);
        lead.main_crops = self.main_crops;
        lead.is_prioritario = self.is_prioritario;
        scoring::refresh_derived_fields(lead);
    }
}

// Mantém os campos derivados do lead em dia após mudanças nas propriedades
#[derive(Clone)]
pub struct LeadAggregator {
    leads: Arc<dyn LeadStore>,
    properties: Arc<dyn PropertyStore>,
}

impl LeadAggregator {
    pub fn new(leads: Arc<dyn LeadStore>, properties: Arc<dyn PropertyStore>) -> Self {
        Self { leads, properties }
    }

    /// Recalcula e persiste os agregados do lead.
    ///
    /// Nunca falha: a escrita da propriedade já foi feita e não é desfeita.
    /// Lead ausente ou erro do store viram apenas log; retorna o lead
    /// atualizado quando a gravação aconteceu.
    pub async fn recompute(&self, lead_id: Uuid) -> Option<Lead> {
        match self.try_recompute(lead_id).await {
            Ok(Some(lead)) => {
                tracing::info!(
                    "Lead {} atualizado: {} ha, Score: {}, Prioritário: {}",
                    lead_id,
                    lead.total_area_hectares.unwrap_or_default(),
                    lead.priority_score,
                    lead.is_prioritario
                );
                Some(lead)
            }
            Ok(None) => {
                tracing::warn!("Lead {} não encontrado ao recalcular agregados", lead_id);
                None
            }
            Err(e) => {
                tracing::error!("Erro ao atualizar agregados do lead {}: {}", lead_id, e);
                None
            }
        }
    }

    async fn try_recompute(&self, lead_id: Uuid) -> Result<Option<Lead>, AppError> {
        let properties = self.properties.list_by_lead(lead_id).await?;

        let Some(mut lead) = self.leads.find_by_id(lead_id).await? else {
            return Ok(None);
        };

        LeadAggregates::from_properties(&properties).apply_to(&mut lead);
        lead.updated_at = chrono::Utc::now();

        match self.leads.update(&lead).await {
            Ok(lead) => Ok(Some(lead)),
            // Removido entre a leitura e a escrita
            Err(AppError::LeadNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
