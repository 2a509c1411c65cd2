//! services/api/src/web/records.rs
//!
//! Progress records nested under one of the caller's readings.

use axum::{extract::State, Extension};
use reading_tracker_core::domain::RecordInsert;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::envelope::ApiResponse;
use crate::web::extract::{AppJson, AppPath};
use crate::web::middleware::AuthUser;
use crate::web::readings::RecordResponse;
use crate::web::state::AppState;
use crate::web::validate::{self, Validate};

#[derive(Deserialize, ToSchema)]
pub struct RecordRequest {
    /// Free-form position, e.g. "ch.5" or "page 120".
    pub progress: String,
    #[serde(default)]
    pub notes: String,
}

impl Validate for RecordRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate::required("progress", &self.progress)
    }
}

impl From<RecordRequest> for RecordInsert {
    fn from(req: RecordRequest) -> Self {
        Self {
            progress: req.progress,
            notes: req.notes,
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/api/readings/{id}/records",
    tag = "Records",
    params(("id" = Uuid, Path, description = "Reading id")),
    responses(
        (status = 200, description = "Records in insertion order", body = [RecordResponse]),
        (status = 403, description = "Reading belongs to another user"),
        (status = 404, description = "Reading not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_records_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(reading_id): AppPath<Uuid>,
) -> Result<ApiResponse<Vec<RecordResponse>>, ApiError> {
    let records = state
        .records
        .list_records_for_user(reading_id, user_id)
        .await?;
    Ok(ApiResponse::found(
        records.into_iter().map(RecordResponse::from).collect(),
        "Records",
    ))
}

#[utoipa::path(
    post,
    path = "/v1/api/readings/{id}/records",
    tag = "Records",
    params(("id" = Uuid, Path, description = "Reading id")),
    request_body = RecordRequest,
    responses(
        (status = 201, description = "Record added", body = RecordResponse),
        (status = 404, description = "Not one of the caller's readings")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(reading_id): AppPath<Uuid>,
    AppJson(req): AppJson<RecordRequest>,
) -> Result<ApiResponse<RecordResponse>, ApiError> {
    req.validate()?;
    let record = state
        .records
        .add_record(reading_id, user_id, req.into())
        .await?;
    Ok(ApiResponse::created(record.into(), "Record"))
}

#[utoipa::path(
    put,
    path = "/v1/api/readings/{id}/records/{record_id}",
    tag = "Records",
    params(
        ("id" = Uuid, Path, description = "Reading id"),
        ("record_id" = Uuid, Path, description = "Record id")
    ),
    request_body = RecordRequest,
    responses(
        (status = 200, description = "Record updated"),
        (status = 404, description = "Reading or record not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath((reading_id, record_id)): AppPath<(Uuid, Uuid)>,
    AppJson(req): AppJson<RecordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    req.validate()?;
    state
        .records
        .update_record_for_user(reading_id, user_id, record_id, req.into())
        .await?;
    Ok(ApiResponse::updated("Record"))
}

#[utoipa::path(
    delete,
    path = "/v1/api/readings/{id}/records/{record_id}",
    tag = "Records",
    params(
        ("id" = Uuid, Path, description = "Reading id"),
        ("record_id" = Uuid, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "Record deleted"),
        (status = 404, description = "Reading or record not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath((reading_id, record_id)): AppPath<(Uuid, Uuid)>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .records
        .delete_record(reading_id, user_id, record_id)
        .await?;
    Ok(ApiResponse::deleted("Record"))
}
