// ============================
// crates/backend-lib/src/handlers/admin.rs
// ============================
//! Admin-only user management handlers.
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use curagenie_common::{UserActivationResponse, UserInfo};
use tracing::info;

use crate::auth::AdminUser;
use crate::error::AppError;
use crate::storage::UserStore;
use crate::AppState;

/// `GET /api/auth/users`
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserInfo>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(|user| user.to_info()).collect()))
}

/// `PUT /api/auth/users/{id}/activate`
///
/// Toggles the target user's active flag.
pub async fn set_user_active(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserActivationResponse>, AppError> {
    let user = state
        .store
        .user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

    let updated = state.store.set_user_active(user_id, !user.is_active).await?;

    let status_text = if updated.is_active {
        "activated"
    } else {
        "deactivated"
    };
    info!(
        target_user = %updated.email,
        admin = %admin.email,
        "user {status_text}"
    );

    Ok(Json(UserActivationResponse {
        message: format!("User {status_text} successfully"),
        user_id,
        is_active: updated.is_active,
        timestamp: Utc::now(),
    }))
}
