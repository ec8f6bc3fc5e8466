//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{ClientsDto, HealthDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto::default())
}

/// Connected clients and pending queue sizes
pub async fn list_clients(State(state): State<Arc<AppState>>) -> Json<ClientsDto> {
    let snapshot = state.registry.snapshot().await;
    Json(snapshot.into())
}
