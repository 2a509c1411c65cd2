//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and the current user.

use axum::{extract::State, http::HeaderMap, Extension};
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{AuthToken, Signup, User};
use reading_tracker_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::envelope::ApiResponse;
use crate::web::extract::AppJson;
use crate::web::middleware::{bearer_token, AuthUser};
use crate::web::state::AppState;
use crate::web::validate::{self, Validate};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate::length("username", &self.username, 3, 32)?;
        validate::email("email", &self.email)?;
        validate::length("password", &self.password, 8, 128)
    }
}

/// `identifier` may be either the username or the email address.
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub identifier: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate::required("identifier", &self.identifier)?;
        validate::required("password", &self.password)
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl AuthResponse {
    fn new(user: User, token: AuthToken) -> Self {
        Self {
            token: token.token,
            expires_at: token.expires_at,
            user: user.into(),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/v1/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created, bearer token issued", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username or email already in use")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    req.validate()?;
    let (user, token) = state
        .auth
        .signup(Signup {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok(ApiResponse::created(AuthResponse::new(user, token), "User"))
}

/// POST /auth/login - Login with username or email
#[utoipa::path(
    post,
    path = "/v1/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    req.validate()?;
    let (user, token) = state.auth.login(&req.identifier, &req.password).await?;
    Ok(ApiResponse::ok(AuthResponse::new(user, token), "Login Successful"))
}

/// POST /auth/logout - Invalidate the bearer token
#[utoipa::path(
    post,
    path = "/v1/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<ApiResponse<()>, ApiError> {
    let token = bearer_token(&headers).ok_or(PortError::Unauthorized)?;
    state.auth.logout(token).await?;
    Ok(ApiResponse::ok((), "Logout Successful"))
}

/// GET /users/me - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/v1/api/users/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or expired token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = state.auth.current_user(user_id).await?;
    Ok(ApiResponse::found(user.into(), "User"))
}
