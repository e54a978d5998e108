// src/services/property_service.rs

use std::sync::Arc;

use chrono::{Datelike, Local, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Paginated, Pagination},
    },
    db::{LeadStore, PropertyStore},
    models::property::{
        CreatePropertyPayload, GeographicHotspot, PropertiesInsight, Property, PropertyFilter, PropertySummary,
        UpdatePropertyPayload,
    },
    services::{
        aggregation::LeadAggregator,
        insights,
        kml_processor::{self, KmlProcessResult},
    },
};

#[derive(Clone)]
pub struct PropertyService {
    leads: Arc<dyn LeadStore>,
    properties: Arc<dyn PropertyStore>,
    aggregator: LeadAggregator,
}

impl PropertyService {
    pub fn new(leads: Arc<dyn LeadStore>, properties: Arc<dyn PropertyStore>) -> Self {
        let aggregator = LeadAggregator::new(leads.clone(), properties.clone());
        Self { leads, properties, aggregator }
    }

    // =========================================================================
    //  1. CRUD (toda escrita recalcula os agregados do lead dono)
    // =========================================================================

    pub async fn create(&self, payload: CreatePropertyPayload) -> Result<Property, AppError> {
        ensure_valid_area(payload.area_hectares)?;

        let lead = self.leads.find_by_id(payload.lead_id).await?.ok_or_else(|| {
            tracing::warn!("Lead {} não encontrado ao cadastrar propriedade", payload.lead_id);
            AppError::LeadNotFound
        })?;

        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            lead_id: lead.id,
            crop: payload.crop,
            area_hectares: payload.area_hectares,
            city: payload.city.or(lead.city),
            state: payload.state.or(Some(lead.state)),
            geometry: payload.geometry,
            created_at: now,
            updated_at: now,
        };

        let property = self.properties.insert(&property).await?;
        tracing::info!(
            "Propriedade {} criada para o lead {} ({} ha de {})",
            property.id,
            property.lead_id,
            property.area_hectares,
            property.crop
        );

        self.aggregator.recompute(property.lead_id).await;
        Ok(property)
    }

    pub async fn list(
        &self,
        filter: &PropertyFilter,
        pagination: &Pagination,
    ) -> Result<Paginated<PropertySummary>, AppError> {
        let (properties, total) = self.properties.list_filtered(filter, pagination).await?;
        Ok(Paginated::new(properties, total, pagination).map(|property| PropertySummary {
            agronomic_score: insights::agronomic_score(property.area_hectares, property.crop),
            property,
        }))
    }

    pub async fn find_one(&self, id: Uuid) -> Result<Property, AppError> {
        self.properties.find_by_id(id).await?.ok_or_else(|| {
            tracing::warn!("Propriedade {} não encontrada", id);
            AppError::PropertyNotFound
        })
    }

    pub async fn update(&self, id: Uuid, payload: UpdatePropertyPayload) -> Result<Property, AppError> {
        if let Some(area) = payload.area_hectares {
            ensure_valid_area(area)?;
        }

        let mut property = self.find_one(id).await?;
        if let Some(crop) = payload.crop {
            property.crop = crop;
        }
        if let Some(area) = payload.area_hectares {
            property.area_hectares = area;
        }
        property.city = payload.city.or(property.city);
        property.state = payload.state.or(property.state);
        property.geometry = payload.geometry.or(property.geometry);
        property.updated_at = Utc::now();

        let property = self.properties.update(&property).await?;
        tracing::info!("Propriedade {} atualizada", property.id);

        self.aggregator.recompute(property.lead_id).await;
        Ok(property)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        // O lead dono precisa ser lido antes da remoção
        let lead_id = self.find_one(id).await?.lead_id;

        self.properties.delete(id).await?;
        tracing::info!("Propriedade {} removida", id);

        self.aggregator.recompute(lead_id).await;
        Ok(())
    }

    // =========================================================================
    //  2. ANÁLISES
    // =========================================================================

    pub async fn lead_insights(&self, lead_id: Uuid) -> Result<PropertiesInsight, AppError> {
        if self.leads.find_by_id(lead_id).await?.is_none() {
            tracing::warn!("Lead {} não encontrado ao gerar insights", lead_id);
            return Err(AppError::LeadNotFound);
        }

        let properties = self.properties.list_by_lead(lead_id).await?;
        insights::build_insights(lead_id, &properties, Local::now().month()).ok_or(AppError::NoPropertiesForLead)
    }

    pub async fn geographic_hotspots(&self) -> Result<Vec<GeographicHotspot>, AppError> {
        let properties = self.properties.list_all().await?;
        Ok(insights::geographic_hotspots(&properties))
    }

    // =========================================================================
    //  3. UPLOAD DE KML
    // =========================================================================

    pub fn process_kml(&self, content: &str) -> Result<KmlProcessResult, AppError> {
        kml_processor::process_kml_file(content).map_err(|e| {
            tracing::warn!("KML rejeitado: {}", e);
            AppError::from(e)
        })
    }
}

// Limites da coluna NUMERIC(10, 2): 2 casas, até 99999999.99
const MAX_AREA_SCALE: u32 = 2;
const MAX_AREA_HECTARES: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

fn ensure_valid_area(area: Decimal) -> Result<(), AppError> {
    if area <= Decimal::ZERO {
        return Err(AppError::field("areaHectares", "positive", "Área deve ser maior que zero"));
    }
    if area.normalize().scale() > MAX_AREA_SCALE {
        return Err(AppError::field("areaHectares", "scale", "Área deve ter no máximo 2 casas decimais"));
    }
    if area > MAX_AREA_HECTARES {
        return Err(AppError::field("areaHectares", "range", "Área deve ser no máximo 99999999.99 ha"));
    }
    Ok(())
}
