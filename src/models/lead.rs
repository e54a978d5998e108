// src/models/lead.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::crop::CropType;

// --- ENUMS ---

// Etapas do funil. A ordem de declaração é a ordem do funil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_status")]
pub enum LeadStatus {
    #[serde(rename = "novo")]
    #[sqlx(rename = "novo")]
    New,
    #[serde(rename = "contatado")]
    #[sqlx(rename = "contatado")]
    Contacted,
    #[serde(rename = "qualificado")]
    #[sqlx(rename = "qualificado")]
    Qualified,
    #[serde(rename = "proposta")]
    #[sqlx(rename = "proposta")]
    Proposal,
    #[serde(rename = "negociacao")]
    #[sqlx(rename = "negociacao")]
    Negotiation,
    #[serde(rename = "ganho")]
    #[sqlx(rename = "ganho")]
    Won,
    #[serde(rename = "perdido")]
    #[sqlx(rename = "perdido")]
    Lost,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "novo",
            LeadStatus::Contacted => "contatado",
            LeadStatus::Qualified => "qualificado",
            LeadStatus::Proposal => "proposta",
            LeadStatus::Negotiation => "negociacao",
            LeadStatus::Won => "ganho",
            LeadStatus::Lost => "perdido",
        }
    }

    /// Status que representam um contato ativo com o produtor.
    pub fn counts_as_contact(self) -> bool {
        matches!(
            self,
            LeadStatus::Contacted | LeadStatus::Qualified | LeadStatus::Proposal | LeadStatus::Negotiation
        )
    }
}

// Canal de aquisição
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_origin")]
pub enum LeadOrigin {
    #[serde(rename = "indicacao")]
    #[sqlx(rename = "indicacao")]
    Referral,
    #[serde(rename = "feira")]
    #[sqlx(rename = "feira")]
    TradeFair,
    #[serde(rename = "site")]
    #[sqlx(rename = "site")]
    Website,
    #[serde(rename = "telefone")]
    #[sqlx(rename = "telefone")]
    Phone,
    #[serde(rename = "whatsapp")]
    #[sqlx(rename = "whatsapp")]
    WhatsApp,
    #[serde(rename = "rede_social")]
    #[sqlx(rename = "rede_social")]
    SocialMedia,
    #[serde(rename = "visita_campo")]
    #[sqlx(rename = "visita_campo")]
    FieldVisit,
    #[serde(rename = "outros")]
    #[sqlx(rename = "outros")]
    Other,
}

// Porte do produtor, derivado da área total
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lead_segment")]
pub enum LeadSegment {
    #[serde(rename = "pequeno")]
    #[sqlx(rename = "pequeno")]
    Small,
    #[serde(rename = "medio")]
    #[sqlx(rename = "medio")]
    Medium,
    #[serde(rename = "grande")]
    #[sqlx(rename = "grande")]
    Large,
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub cpf: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: String,

    pub status: LeadStatus,
    pub origin: Option<LeadOrigin>,
    pub assigned_to: Option<Uuid>,

    // Campos derivados: recalculados a cada escrita
    pub segment: Option<LeadSegment>,
    pub priority_score: i32,
    pub is_prioritario: bool,
    pub total_area_hectares: Option<Decimal>,
    pub main_crops: Vec<CropType>,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_contact_at: Option<DateTime<Utc>>,
}

// Lead + contadores de tempo, usado nas listagens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    #[serde(flatten)]
    pub lead: Lead,
    pub days_since_created: i64,
    pub days_since_last_contact: Option<i64>,
}

impl LeadSummary {
    pub fn from_lead(lead: Lead, now: DateTime<Utc>) -> Self {
        let days_since_created = (now - lead.created_at).num_days();
        let days_since_last_contact = lead.last_contact_at.map(|at| (now - at).num_days());
        Self {
            lead,
            days_since_created,
            days_since_last_contact,
        }
    }
}

// --- COMENTÁRIOS ---

// Append-only: o status do lead é congelado no momento da escrita
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeadComment {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub message: String,
    pub author: Option<String>,
    pub lead_status_at_time: LeadStatus,
    pub created_at: DateTime<Utc>,
}

// --- FILTROS ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub origin: Option<LeadOrigin>,
    pub segment: Option<LeadSegment>,
    pub is_prioritario: Option<bool>,
    pub assigned_to: Option<Uuid>,
    pub search: Option<String>,
}


// --- PAYLOADS ---

static CPF_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{11}$").unwrap());
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10,11}$").unwrap());
pub(crate) static STATE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

// Dados para cadastro de um novo lead. Área e culturas vêm das propriedades.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 2, max = 255, message = "O nome deve ter entre 2 e 255 caracteres"))]
    pub name: String,

    #[validate(
        email(message = "Email inválido. Use o formato: exemplo@email.com"),
        length(max = 255, message = "O email não pode ter mais de 255 caracteres")
    )]
    pub email: String,

    #[validate(regex(path = *CPF_REGEX, message = "CPF inválido. Use apenas 11 dígitos numéricos (ex: 12345678901)"))]
    pub cpf: Option<String>,

    #[validate(regex(path = *PHONE_REGEX, message = "Telefone inválido. Use apenas números, com 10 ou 11 dígitos (ex: 31999999999)"))]
    pub phone: Option<String>,

    #[validate(length(min = 2, max = 100, message = "A cidade deve ter entre 2 e 100 caracteres"))]
    pub city: Option<String>,

    #[validate(regex(path = *STATE_REGEX, message = "Estado deve conter 2 letras maiúsculas (ex: MG, SP, RJ)"))]
    pub state: Option<String>,

    pub status: Option<LeadStatus>,
    pub origin: Option<LeadOrigin>,
    pub assigned_to: Option<Uuid>,

    #[validate(length(max = 1000, message = "As observações não podem ter mais de 1000 caracteres"))]
    pub notes: Option<String>,
}

// PATCH parcial: só os campos presentes são aplicados
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    #[validate(length(min = 2, max = 255, message = "O nome deve ter entre 2 e 255 caracteres"))]
    pub name: Option<String>,

    #[validate(
        email(message = "Email inválido. Use o formato: exemplo@email.com"),
        length(max = 255, message = "O email não pode ter mais de 255 caracteres")
    )]
    pub email: Option<String>,

    #[validate(regex(path = *CPF_REGEX, message = "CPF inválido. Use apenas 11 dígitos numéricos (ex: 12345678901)"))]
    pub cpf: Option<String>,

    #[validate(regex(path = *PHONE_REGEX, message = "Telefone inválido. Use apenas números, com 10 ou 11 dígitos (ex: 31999999999)"))]
    pub phone: Option<String>,

    #[validate(length(min = 2, max = 100, message = "A cidade deve ter entre 2 e 100 caracteres"))]
    pub city: Option<String>,

    #[validate(regex(path = *STATE_REGEX, message = "Estado deve conter 2 letras maiúsculas (ex: MG, SP, RJ)"))]
    pub state: Option<String>,

    pub status: Option<LeadStatus>,
    pub origin: Option<LeadOrigin>,
    pub assigned_to: Option<Uuid>,

    #[validate(length(max = 1000, message = "As observações não podem ter mais de 1000 caracteres"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadStatusPayload {
    pub status: LeadStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentPayload {
    #[validate(length(min = 1, max = 2000, message = "O comentário deve ter entre 1 e 2000 caracteres"))]
    pub comment: String,

    #[validate(length(max = 255, message = "O nome do autor não pode ter mais de 255 caracteres"))]
    pub author: Option<String>,
}
