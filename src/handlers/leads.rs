// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, pagination::Pagination},
    config::AppState,
    models::lead::{CreateCommentPayload, CreateLeadPayload, LeadFilter, UpdateLeadPayload, UpdateLeadStatusPayload},
};

// POST /api/leads
pub async fn create_lead(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state.lead_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads?status=&city=&search=&page=&limit=
pub async fn list_leads(
    State(app_state): State<AppState>,
    Query(filter): Query<LeadFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    pagination.validate()?;

    let page = app_state.lead_service.list(&filter, &pagination).await?;
    Ok((StatusCode::OK, Json(page)))
}

// GET /api/leads/prioritarios
pub async fn list_priority_leads(
    State(app_state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    pagination.validate()?;

    let page = app_state.lead_service.list_priority(&pagination).await?;
    Ok((StatusCode::OK, Json(page)))
}

// GET /api/leads/{id}
pub async fn get_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state.lead_service.find_one(id).await?;
    Ok((StatusCode::OK, Json(lead)))
}

// GET /api/leads/{id}/summary
pub async fn get_lead_summary(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.lead_service.find_summary(id).await?;
    Ok((StatusCode::OK, Json(summary)))
}

// PATCH /api/leads/{id}
pub async fn update_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state.lead_service.update(id, payload).await?;
    Ok((StatusCode::OK, Json(lead)))
}

// PATCH /api/leads/{id}/status
pub async fn update_lead_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state.lead_service.update_status(id, payload.status).await?;
    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/leads/{id}
pub async fn delete_lead(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.lead_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/leads/{id}/comments
pub async fn add_comment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let comment = app_state.lead_service.add_comment(id, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// GET /api/leads/{id}/comments
pub async fn list_comments(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    pagination.validate()?;

    let page = app_state.lead_service.list_comments(id, &pagination).await?;
    Ok((StatusCode::OK, Json(page)))
}
