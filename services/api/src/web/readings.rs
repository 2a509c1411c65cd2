//! services/api/src/web/readings.rs
//!
//! Endpoints for the caller's readings. Every route is scoped to the
//! authenticated user; readings of other users answer 403.

use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{
    Reading, ReadingInsert, ReadingSort, ReadingStatus, ReadingType, Record,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::envelope::ApiResponse;
use crate::web::extract::{AppJson, AppPath, AppQuery};
use crate::web::middleware::AuthUser;
use crate::web::paging::{PageParams, PageResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ReadingRequest {
    pub document_id: Uuid,
    /// `book`, `manga` or `custom_document`.
    pub reading_type: String,
    /// `ongoing` (default), `paused` or `completed`.
    #[serde(alias = "reading_status")]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl ReadingRequest {
    /// Parses the string tags; an unknown type or status is a 400.
    fn into_insert(self) -> Result<ReadingInsert, ApiError> {
        let reading_type = self.reading_type.parse::<ReadingType>()?;
        let status = match self.status.as_deref() {
            Some(status) => status.parse::<ReadingStatus>()?,
            None => ReadingStatus::Ongoing,
        };
        Ok(ReadingInsert {
            document_id: self.document_id,
            reading_type,
            status,
            notes: self.notes,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct RecordResponse {
    pub id: Uuid,
    pub progress: String,
    pub notes: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<Record> for RecordResponse {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            progress: record.progress,
            notes: record.notes,
            recorded_at: record.recorded_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReadingResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub reading_type: String,
    pub document_name: String,
    pub status: String,
    pub notes: String,
    pub records: Vec<RecordResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_record_update: DateTime<Utc>,
}

impl From<Reading> for ReadingResponse {
    fn from(reading: Reading) -> Self {
        Self {
            id: reading.id,
            document_id: reading.document_id,
            reading_type: reading.reading_type.to_string(),
            document_name: reading.document_name,
            status: reading.status.to_string(),
            notes: reading.notes,
            records: reading.records.into_iter().map(RecordResponse::from).collect(),
            created_at: reading.created_at,
            updated_at: reading.updated_at,
            last_record_update: reading.last_record_update,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TypeFilter {
    /// `book` (default), `manga` or `custom_document`.
    #[serde(rename = "type")]
    pub reading_type: Option<String>,
    /// `created_at`, `updated_at` or `last_record_update` (default).
    pub order_by: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusFilter {
    /// `ongoing` (default), `paused` or `completed`.
    pub status: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/v1/api/readings",
    tag = "Readings",
    request_body = ReadingRequest,
    responses(
        (status = 201, description = "Reading started"),
        (status = 400, description = "Invalid reading type or status"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "The document already has a reading")
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_reading_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppJson(req): AppJson<ReadingRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let insert = req.into_insert()?;
    state.readings.start_reading(insert, user_id).await?;
    Ok(ApiResponse::created((), "Reading"))
}

/// GET /readings - The caller's readings by creation time
#[utoipa::path(
    get,
    path = "/v1/api/readings",
    tag = "Readings",
    params(PageParams),
    responses((status = 200, description = "One page of readings", body = [ReadingResponse])),
    security(("bearer_auth" = []))
)]
pub async fn list_readings_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<ApiResponse<PageResponse<ReadingResponse>>, ApiError> {
    let page = state
        .readings
        .list_by_user(user_id, params.to_request())
        .await?;
    Ok(ApiResponse::found(PageResponse::from_page(page, ReadingResponse::from), "Readings"))
}

/// GET /readings/by-type - The caller's readings of one type
#[utoipa::path(
    get,
    path = "/v1/api/readings/by-type",
    tag = "Readings",
    params(PageParams, TypeFilter),
    responses(
        (status = 200, description = "One page of readings", body = [ReadingResponse]),
        (status = 400, description = "Invalid reading type or sort field")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_readings_by_type_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppQuery(params): AppQuery<PageParams>,
    AppQuery(filter): AppQuery<TypeFilter>,
) -> Result<ApiResponse<PageResponse<ReadingResponse>>, ApiError> {
    let reading_type = filter.reading_type.as_deref().unwrap_or("book").parse::<ReadingType>()?;
    let sort = match filter.order_by.as_deref() {
        Some(field) => field.parse::<ReadingSort>()?,
        None => ReadingSort::LastRecordUpdate,
    };
    let page = state
        .readings
        .list_by_user_and_type(user_id, reading_type, sort, params.to_request())
        .await?;
    Ok(ApiResponse::found(PageResponse::from_page(page, ReadingResponse::from), "Readings"))
}

/// GET /readings/by-status - The caller's readings in one status, by last update
#[utoipa::path(
    get,
    path = "/v1/api/readings/by-status",
    tag = "Readings",
    params(PageParams, StatusFilter),
    responses(
        (status = 200, description = "One page of readings", body = [ReadingResponse]),
        (status = 400, description = "Invalid reading status")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_readings_by_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppQuery(params): AppQuery<PageParams>,
    AppQuery(filter): AppQuery<StatusFilter>,
) -> Result<ApiResponse<PageResponse<ReadingResponse>>, ApiError> {
    let status = filter.status.as_deref().unwrap_or("ongoing").parse::<ReadingStatus>()?;
    let page = state
        .readings
        .list_by_user_and_status(user_id, status, params.to_request())
        .await?;
    Ok(ApiResponse::found(PageResponse::from_page(page, ReadingResponse::from), "Readings"))
}

#[utoipa::path(
    get,
    path = "/v1/api/readings/{id}",
    tag = "Readings",
    params(("id" = Uuid, Path, description = "Reading id")),
    responses(
        (status = 200, description = "The reading", body = ReadingResponse),
        (status = 403, description = "Reading belongs to another user"),
        (status = 404, description = "Reading not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_reading_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<ReadingResponse>, ApiError> {
    let reading = state.readings.get_reading_for_user(id, user_id).await?;
    Ok(ApiResponse::found(reading.into(), "Reading"))
}

#[utoipa::path(
    put,
    path = "/v1/api/readings/{id}",
    tag = "Readings",
    params(("id" = Uuid, Path, description = "Reading id")),
    request_body = ReadingRequest,
    responses(
        (status = 200, description = "Reading updated"),
        (status = 403, description = "Reading belongs to another user"),
        (status = 404, description = "Reading or document not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_reading_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ReadingRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let insert = req.into_insert()?;
    state.readings.update_reading(id, user_id, insert).await?;
    Ok(ApiResponse::updated("Reading"))
}

#[utoipa::path(
    delete,
    path = "/v1/api/readings/{id}",
    tag = "Readings",
    params(("id" = Uuid, Path, description = "Reading id")),
    responses(
        (status = 200, description = "Reading deleted"),
        (status = 403, description = "Reading belongs to another user"),
        (status = 404, description = "Reading not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_reading_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.readings.delete_reading(id, user_id).await?;
    Ok(ApiResponse::deleted("Reading"))
}
