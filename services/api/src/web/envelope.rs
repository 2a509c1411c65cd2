//! services/api/src/web/envelope.rs
//!
//! The uniform JSON envelope every endpoint answers with, success or failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(status: StatusCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            success: status.is_success(),
            code: status.as_u16(),
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, Some(data), message)
    }

    pub fn found(data: T, entity: &str) -> Self {
        Self::new(StatusCode::OK, Some(data), format!("{} Successfully Retrieved", entity))
    }

    pub fn created(data: T, entity: &str) -> Self {
        Self::new(StatusCode::CREATED, Some(data), format!("{} Successfully Created", entity))
    }
}

impl ApiResponse<()> {
    pub fn updated(entity: &str) -> Self {
        Self::new(StatusCode::OK, None, format!("{} Successfully Updated", entity))
    }

    pub fn deleted(entity: &str) -> Self {
        Self::new(StatusCode::OK, None, format!("{} Successfully Deleted", entity))
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, None, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
