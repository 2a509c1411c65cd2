//! services/api/src/web/reading_lists.rs
//!
//! Endpoints for the caller's reading lists. A list that belongs to someone else
//! is indistinguishable from one that does not exist.

use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{ListChange, ReadingList, ReadingListInsert};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::envelope::ApiResponse;
use crate::web::extract::{AppJson, AppPath};
use crate::web::middleware::AuthUser;
use crate::web::state::AppState;
use crate::web::validate::{self, Validate};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ReadingListRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for ReadingListRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate::required("name", &self.name)
    }
}

impl From<ReadingListRequest> for ReadingListInsert {
    fn from(req: ReadingListRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ReadingIdsRequest {
    pub reading_ids: Vec<Uuid>,
}

impl Validate for ReadingIdsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.reading_ids.is_empty() {
            return Err(ApiError::Validation("reading_ids is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReadingListResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// May name readings that were deleted after being added.
    pub reading_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReadingList> for ReadingListResponse {
    fn from(list: ReadingList) -> Self {
        Self {
            id: list.id,
            name: list.name,
            description: list.description,
            reading_ids: list.reading_ids,
            created_at: list.created_at,
            updated_at: list.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreatedListResponse {
    pub id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct ListChangeResponse {
    /// How many ids were actually added or removed.
    pub changed: usize,
}

fn change_response(change: ListChange, verb: &str) -> ApiResponse<ListChangeResponse> {
    match change {
        ListChange::Changed(changed) => ApiResponse::ok(
            ListChangeResponse { changed },
            format!("Readings Successfully {} Reading List", verb),
        ),
        ListChange::Unchanged => ApiResponse::ok(
            ListChangeResponse { changed: 0 },
            "No Changes Made To Reading List",
        ),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/v1/api/reading-lists",
    tag = "Reading Lists",
    responses((status = 200, description = "The caller's lists", body = [ReadingListResponse])),
    security(("bearer_auth" = []))
)]
pub async fn list_reading_lists_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<ReadingListResponse>>, ApiError> {
    let lists = state.reading_lists.get_lists(user_id).await?;
    Ok(ApiResponse::found(
        lists.into_iter().map(ReadingListResponse::from).collect(),
        "Reading Lists",
    ))
}

#[utoipa::path(
    get,
    path = "/v1/api/reading-lists/{id}",
    tag = "Reading Lists",
    params(("id" = Uuid, Path, description = "Reading list id")),
    responses(
        (status = 200, description = "The list", body = ReadingListResponse),
        (status = 404, description = "Not one of the caller's lists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_reading_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(list_id): AppPath<Uuid>,
) -> Result<ApiResponse<ReadingListResponse>, ApiError> {
    let list = state.reading_lists.get_list(list_id, user_id).await?;
    Ok(ApiResponse::found(list.into(), "Reading List"))
}

#[utoipa::path(
    post,
    path = "/v1/api/reading-lists",
    tag = "Reading Lists",
    request_body = ReadingListRequest,
    responses(
        (status = 201, description = "List created", body = CreatedListResponse),
        (status = 400, description = "Invalid request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_reading_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppJson(req): AppJson<ReadingListRequest>,
) -> Result<ApiResponse<CreatedListResponse>, ApiError> {
    req.validate()?;
    let id = state.reading_lists.create_list(user_id, req.into()).await?;
    Ok(ApiResponse::created(CreatedListResponse { id }, "Reading List"))
}

#[utoipa::path(
    put,
    path = "/v1/api/reading-lists/{id}",
    tag = "Reading Lists",
    params(("id" = Uuid, Path, description = "Reading list id")),
    request_body = ReadingListRequest,
    responses(
        (status = 200, description = "List updated"),
        (status = 404, description = "Not one of the caller's lists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_reading_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(list_id): AppPath<Uuid>,
    AppJson(req): AppJson<ReadingListRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    req.validate()?;
    state
        .reading_lists
        .update_list(user_id, list_id, req.into())
        .await?;
    Ok(ApiResponse::updated("Reading List"))
}

#[utoipa::path(
    delete,
    path = "/v1/api/reading-lists/{id}",
    tag = "Reading Lists",
    params(("id" = Uuid, Path, description = "Reading list id")),
    responses(
        (status = 200, description = "List deleted"),
        (status = 404, description = "Not one of the caller's lists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_reading_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(list_id): AppPath<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    state.reading_lists.delete_list(user_id, list_id).await?;
    Ok(ApiResponse::deleted("Reading List"))
}

/// PUT /reading-lists/{id}/add-readings - Set-union readings into the list
#[utoipa::path(
    put,
    path = "/v1/api/reading-lists/{id}/add-readings",
    tag = "Reading Lists",
    params(("id" = Uuid, Path, description = "Reading list id")),
    request_body = ReadingIdsRequest,
    responses(
        (status = 200, description = "Readings added, or nothing to add", body = ListChangeResponse),
        (status = 403, description = "A reading belongs to another user"),
        (status = 404, description = "List or reading not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_readings_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(list_id): AppPath<Uuid>,
    AppJson(req): AppJson<ReadingIdsRequest>,
) -> Result<ApiResponse<ListChangeResponse>, ApiError> {
    req.validate()?;
    let change = state
        .reading_lists
        .add_readings(user_id, list_id, &req.reading_ids)
        .await?;
    Ok(change_response(change, "Added To"))
}

/// PUT /reading-lists/{id}/remove-readings - Drop readings from the list
#[utoipa::path(
    put,
    path = "/v1/api/reading-lists/{id}/remove-readings",
    tag = "Reading Lists",
    params(("id" = Uuid, Path, description = "Reading list id")),
    request_body = ReadingIdsRequest,
    responses(
        (status = 200, description = "Readings removed, or none were present", body = ListChangeResponse),
        (status = 404, description = "Not one of the caller's lists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_readings_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    AppPath(list_id): AppPath<Uuid>,
    AppJson(req): AppJson<ReadingIdsRequest>,
) -> Result<ApiResponse<ListChangeResponse>, ApiError> {
    req.validate()?;
    let change = state
        .reading_lists
        .remove_readings(user_id, list_id, &req.reading_ids)
        .await?;
    Ok(change_response(change, "Removed From"))
}
