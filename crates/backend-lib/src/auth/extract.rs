// ============================
// crates/backend-lib/src/auth/extract.rs
// ============================
//! Axum extractors for authenticated requests.
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use curagenie_common::Role;

use crate::auth::token::decode_access_token;
use crate::error::AppError;
use crate::storage::{UserRecord, UserStore};
use crate::AppState;

/// Extractor for the authenticated user behind a bearer access token.
///
/// Pulls the token from the `Authorization` header, verifies it as an
/// access token, loads the user, and rejects inactive accounts.
///
/// ```rust,ignore
/// async fn me(CurrentUser(user): CurrentUser) -> Json<UserInfo> {
///     Json(user.to_info())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Auth("Malformed authorization header".to_string()))?;

        let claims = decode_access_token(token, &state.settings.jwt.secret)?;
        let user_id = claims.user_id()?;

        let user = state
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Auth("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Auth("Inactive user".to_string()));
        }

        Ok(CurrentUser(user))
    }
}

/// Extractor that additionally requires the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserRecord);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(Role::Admin, &user)?;
        Ok(AdminUser(user))
    }
}

/// Reject users whose role is not exactly `required_role`
pub fn require_role(required_role: Role, user: &UserRecord) -> Result<(), AppError> {
    if user.role == required_role {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} access required",
            required_role
        )))
    }
}
