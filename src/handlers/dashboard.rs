// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{common::error::AppError, config::AppState};

// GET /api/dashboard/overview
pub async fn get_overview(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let overview = app_state.dashboard_service.overview().await?;
    Ok((StatusCode::OK, Json(overview)))
}

// GET /api/dashboard/funnel
pub async fn get_funnel(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let funnel = app_state.dashboard_service.funnel().await?;
    Ok((StatusCode::OK, Json(funnel)))
}
