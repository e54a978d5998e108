// src/handlers/properties.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::Pagination},
    config::AppState,
    models::property::{CreatePropertyPayload, PropertyFilter, UpdatePropertyPayload},
};

// Nome do campo multipart com o arquivo
const KML_FIELD: &str = "file";

// POST /api/properties
pub async fn create_property(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePropertyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let property = app_state.property_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

// GET /api/properties?leadId=&crop=&city=&state=&page=&limit=
pub async fn list_properties(
    State(app_state): State<AppState>,
    Query(filter): Query<PropertyFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    pagination.validate()?;

    let page = app_state.property_service.list(&filter, &pagination).await?;
    Ok((StatusCode::OK, Json(page)))
}

// GET /api/properties/{id}
pub async fn get_property(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let property = app_state.property_service.find_one(id).await?;
    Ok((StatusCode::OK, Json(property)))
}

// PATCH /api/properties/{id}
pub async fn update_property(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePropertyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let property = app_state.property_service.update(id, payload).await?;
    Ok((StatusCode::OK, Json(property)))
}

// DELETE /api/properties/{id}
pub async fn delete_property(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.property_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/properties/lead/{leadId}/insights
pub async fn get_lead_insights(
    State(app_state): State<AppState>,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let insight = app_state.property_service.lead_insights(lead_id).await?;
    Ok((StatusCode::OK, Json(insight)))
}

// GET /api/properties/analytics/hotspots
pub async fn get_geographic_hotspots(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let hotspots = app_state.property_service.geographic_hotspots().await?;
    Ok((StatusCode::OK, Json(hotspots)))
}

// POST /api/properties/kml/upload (multipart, campo "file")
pub async fn upload_kml(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidFile(e.body_text()))?
    {
        if field.name() != Some(KML_FIELD) {
            continue;
        }

        if let Some(file_name) = field.file_name() {
            if !file_name.to_lowercase().ends_with(".kml") {
                return Err(AppError::InvalidFile("Envie um arquivo com extensão .kml".into()));
            }
        }

        let content = field.text().await.map_err(|e| AppError::InvalidFile(e.body_text()))?;
        let result = app_state.property_service.process_kml(&content)?;
        return Ok((StatusCode::OK, Json(result)));
    }

    Err(AppError::InvalidFile("Nenhum arquivo KML enviado (campo \"file\")".into()))
}
