use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::kml_processor::KmlError;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Toda falha de leitura do KML cai aqui (uma única categoria para o usuário)
    #[error("Arquivo inválido: {0}")]
    InvalidFile(String),

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Propriedade não encontrada")]
    PropertyNotFound,

    #[error("Lead não possui propriedades cadastradas")]
    NoPropertiesForLead,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("CPF já existe")]
    CpfAlreadyExists,

    // Variante para erros de banco de dados (exemplo com sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<KmlError> for AppError {
    fn from(err: KmlError) -> Self {
        AppError::InvalidFile(err.to_string())
    }
}

impl AppError {
    /// Erro de validação de um único campo, para regras que o `validator` não cobre.
    pub fn field(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut errors = validator::ValidationErrors::new();
        let mut error = validator::ValidationError::new(code);
        error.message = Some(message.into());
        errors.add(field, error);
        AppError::ValidationError(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidFile(message) => {
                let body = Json(json!({ "error": message }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::LeadNotFound => (StatusCode::NOT_FOUND, "Lead não encontrado."),
            AppError::PropertyNotFound => (StatusCode::NOT_FOUND, "Propriedade não encontrada."),
            AppError::NoPropertiesForLead => (StatusCode::NOT_FOUND, "Lead não possui propriedades cadastradas."),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está cadastrado no sistema."),
            AppError::CpfAlreadyExists => (StatusCode::CONFLICT, "Este CPF já está cadastrado no sistema."),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
