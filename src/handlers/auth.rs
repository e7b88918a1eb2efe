use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::auth_service::RegisterInput;
use crate::auth::token::{self, JwtConfig};
use crate::auth::AuthUser;
use crate::domain::user::Role;
use crate::errors::AppError;
use crate::models::user::User;
use crate::AppAuthService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        first_name: user.first_name,
        last_name: user.last_name,
        phone: user.phone,
    }
}

fn issue_token(jwt: &JwtConfig, user: &User) -> Result<String, AppError> {
    let role = user.role.parse::<Role>().unwrap_or(Role::Customer);
    token::issue(jwt, user.id, role).map_err(|e| AppError::Internal(e.to_string()))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing fields or identity already in use"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "auth"
)]
pub async fn register(
    service: web::Data<AppAuthService>,
    jwt: web::Data<JwtConfig>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let user = web::block(move || {
        service.register(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let token = issue_token(jwt.get_ref(), &user)?;
    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".to_string(),
        token,
        user: user_response(user),
    }))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "auth"
)]
pub async fn login(
    service: web::Data<AppAuthService>,
    jwt: web::Data<JwtConfig>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let user = web::block(move || service.login(&body.email, &body.password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let token = issue_token(jwt.get_ref(), &user)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: user_response(user),
    }))
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing token"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Token subject no longer exists"),
    ),
    tag = "auth"
)]
pub async fn me(
    service: web::Data<AppAuthService>,
    auth: AuthUser,
) -> Result<HttpResponse, AppError> {
    let user = web::block(move || service.current_user(auth.id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "user": user_response(user) })))
}
