use async_trait::async_trait;
use curagenie_common::{RegisterRequest, TokenResponse};

use crate::error::AppError;
use crate::storage::UserRecord;

/// The authentication operations exposed to the HTTP layer
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a new account and mint its first token pair
    async fn register(&self, req: RegisterRequest) -> Result<(UserRecord, TokenResponse), AppError>;

    /// Verify credentials and mint a token pair
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, TokenResponse), AppError>;

    /// Exchange a refresh token for a new pair, rotating the refresh token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError>;

    /// Revoke every refresh token belonging to the user
    async fn logout(&self, user_id: i64) -> Result<(), AppError>;

    /// Change a password after verifying the current one
    async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    /// Start a password reset. Returns the reset token when the email is
    /// known; callers must not reveal which case occurred.
    async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AppError>;

    /// Complete a password reset with a previously issued token
    async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AppError>;

    /// Mark the user's email address as verified
    async fn verify_email(&self, user_id: i64) -> Result<(), AppError>;
}
