// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Authentication endpoint handlers.
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use curagenie_common::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, HealthResponse, LoginRequest,
    MessageResponse, RefreshRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
    UserInfo,
};
use tracing::error;

use crate::auth::{AuthService, CurrentUser};
use crate::error::AppError;
use crate::AppState;

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (user, tokens) = state.auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.to_info(),
            tokens,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (user, tokens) = state.auth.authenticate(&req.email, &req.password).await?;

    Ok(Json(AuthResponse {
        user: user.to_info(),
        tokens,
        message: "Login successful".to_string(),
    }))
}

/// `POST /api/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(tokens))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.logout(user.id).await?;

    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
        timestamp: Utc::now(),
    }))
}

/// `GET /api/auth/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserInfo> {
    Json(user.to_info())
}

/// `POST /api/auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
        timestamp: Utc::now(),
    }))
}

/// `POST /api/auth/forgot-password`
///
/// Always answers with the same message so the endpoint cannot be used to
/// probe which emails have accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Json<MessageResponse> {
    if let Err(err) = state.auth.request_password_reset(&req.email).await {
        error!(error = %err, "password reset request failed");
    }

    Json(MessageResponse {
        message: "If an account with that email exists, a password reset link has been sent."
            .to_string(),
        timestamp: Utc::now(),
    })
}

/// `POST /api/auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth
        .reset_password(&req.email, &req.reset_token, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
        timestamp: Utc::now(),
    }))
}

/// `POST /api/auth/verify-email`
pub async fn verify_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.verify_email(user.id).await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
        timestamp: Utc::now(),
    }))
}

/// `GET /api/auth/health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "authentication".to_string(),
        timestamp: Utc::now(),
    })
}
