// src/models/property.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{crop::CropType, lead::STATE_REGEX};

// --- PROPRIEDADE RURAL ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub crop: CropType,
    pub area_hectares: Decimal,
    pub city: Option<String>,
    pub state: Option<String>,
    // GeoJSON serializado (Polygon ou MultiPolygon), vindo do upload de KML
    pub geometry: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn has_location(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.city) && filled(&self.state)
    }
}

// Propriedade + score agronômico, usado nas listagens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    #[serde(flatten)]
    pub property: Property,
    pub agronomic_score: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    pub lead_id: Option<Uuid>,
    pub crop: Option<CropType>,
    pub city: Option<String>,
    pub state: Option<String>,
}

// --- PAYLOADS ---

// Área positiva é checada no serviço (o validator não conhece Decimal)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyPayload {
    pub lead_id: Uuid,
    pub crop: CropType,
    pub area_hectares: Decimal,

    // Herdam do lead quando ausentes
    #[validate(length(max = 100, message = "Cidade pode ter no máximo 100 caracteres"))]
    pub city: Option<String>,
    #[validate(regex(path = *STATE_REGEX, message = "Estado deve ter 2 letras maiúsculas (ex: MG)"))]
    pub state: Option<String>,

    pub geometry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyPayload {
    pub crop: Option<CropType>,
    pub area_hectares: Option<Decimal>,

    #[validate(length(max = 100, message = "Cidade pode ter no máximo 100 caracteres"))]
    pub city: Option<String>,
    #[validate(regex(path = *STATE_REGEX, message = "Estado deve ter 2 letras maiúsculas (ex: MG)"))]
    pub state: Option<String>,

    pub geometry: Option<String>,
}

// --- INSIGHTS ---

// Participação de uma cultura na área total do lead
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropGroup {
    pub crop: CropType,
    pub total_area: Decimal,
    pub total_properties: usize,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesInsight {
    pub lead_id: Uuid,
    pub total_properties: usize,
    pub total_area: Decimal,
    pub total_agronomic_score: Decimal,
    pub is_priority: bool,
    pub crop_mix: Vec<CropGroup>,
    pub main_crop: CropType,
    pub data_quality_alerts: Vec<String>,
    pub action_suggestions: Vec<String>,
    pub crop_season_insight: String,
    pub expansion_potential: bool,
    pub cities: Vec<String>,
}

// Concentração de propriedades por cidade (análise de território)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicHotspot {
    pub city: String,
    pub state: String,
    pub count: usize,
    pub total_area: Decimal,
}
