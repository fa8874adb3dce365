use async_trait::async_trait;
use chrono::{Duration, Utc};
use curagenie_common::{RegisterRequest, Role, TokenResponse};
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::password::{hash_password_secure, validate_password_strength, verify_password};
use crate::auth::reset::{generate_reset_token, RESET_TOKEN_TTL_MINUTES};
use crate::auth::token::{decode_refresh_token, issue_token_pair};
use crate::auth::AuthService;
use crate::config::Settings;
use crate::error::AppError;
use crate::metrics::{
    AUTH_LOGIN_FAILED, AUTH_LOGIN_SUCCESS, AUTH_LOGOUT, AUTH_REGISTERED, AUTH_TOKEN_REFRESHED,
    PASSWORD_RESET_REQUESTED,
};
use crate::storage::{NewUser, UserRecord, UserStore};
use crate::validation;

/// Default [`AuthService`] over the credential store
pub struct DefaultAuth {
    store: Arc<dyn UserStore>,
    settings: Arc<Settings>,
}

impl DefaultAuth {
    pub fn new(store: Arc<dyn UserStore>, settings: Arc<Settings>) -> Self {
        Self { store, settings }
    }

    /// Mint a token pair and track the refresh jti for revocation
    async fn issue_tokens(&self, user: &UserRecord) -> Result<TokenResponse, AppError> {
        let jwt = &self.settings.jwt;
        let (tokens, refresh_claims) = issue_token_pair(
            user.id,
            user.role,
            &jwt.secret,
            jwt.access_ttl_minutes,
            jwt.refresh_ttl_days,
        )?;

        self.store
            .insert_refresh_token(&refresh_claims.jti, user.id, refresh_claims.expires_at())
            .await?;

        Ok(tokens)
    }

    fn check_password_strength(&self, password: &str) -> Result<(), AppError> {
        validation::validate_password_length(password)?;

        let requirements = &self.settings.password_requirements;
        if !validate_password_strength(password, requirements) {
            return Err(AppError::Validation(requirements.description()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, req: RegisterRequest) -> Result<(UserRecord, TokenResponse), AppError> {
        validation::validate_email(&req.email)?;
        validation::validate_username(&req.username)?;
        self.check_password_strength(&req.password)?;

        let mut password = req.password;
        let password_hash =
            hash_password_secure(&mut password, self.settings.password_requirements.work_factor)
                .map_err(|e| AppError::Internal(e.to_string()))?;

        let user = self
            .store
            .insert_user(NewUser {
                email: req.email,
                username: req.username,
                password_hash,
                role: req.role.unwrap_or(Role::Patient),
            })
            .await?;

        let tokens = self.issue_tokens(&user).await?;

        counter!(AUTH_REGISTERED).increment(1);
        info!(user_id = user.id, email = %user.email, "user registered");

        Ok((user, tokens))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserRecord, TokenResponse), AppError> {
        // Unknown email, inactive account, and wrong password all collapse
        // into the same rejection
        let user = match self.store.user_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!(%email, "login attempt for unknown email");
                counter!(AUTH_LOGIN_FAILED).increment(1);
                return Err(AppError::InvalidCredentials);
            },
        };

        if !user.is_active {
            warn!(%email, "login attempt for inactive user");
            counter!(AUTH_LOGIN_FAILED).increment(1);
            return Err(AppError::InvalidCredentials);
        }

        if !verify_password(&user.password_hash, password) {
            warn!(%email, "failed login attempt");
            counter!(AUTH_LOGIN_FAILED).increment(1);
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.issue_tokens(&user).await?;

        counter!(AUTH_LOGIN_SUCCESS).increment(1);
        info!(user_id = user.id, %email, "user authenticated");

        Ok((user, tokens))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let claims = decode_refresh_token(refresh_token, &self.settings.jwt.secret)?;

        // The jti must still be tracked and live; a rotated or logged-out
        // token never validates again
        let tracked = self
            .store
            .refresh_token(&claims.jti)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if tracked.revoked {
            warn!(jti = %claims.jti, "refresh attempt with revoked token");
            return Err(AppError::InvalidToken);
        }

        if tracked.expires_at <= Utc::now() {
            return Err(AppError::TokenExpired);
        }

        let user_id = claims.user_id()?;
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            warn!(user_id, "refresh attempt for inactive user");
            return Err(AppError::InvalidToken);
        }

        // Rotate: the presented token is spent regardless of what follows
        self.store.revoke_refresh_token(&claims.jti).await?;

        let tokens = self.issue_tokens(&user).await?;

        counter!(AUTH_TOKEN_REFRESHED).increment(1);
        info!(user_id, "access token refreshed");

        Ok(tokens)
    }

    async fn logout(&self, user_id: i64) -> Result<(), AppError> {
        let revoked = self.store.revoke_refresh_tokens_for_user(user_id).await?;

        counter!(AUTH_LOGOUT).increment(1);
        info!(user_id, revoked, "user logged out");

        Ok(())
    }

    async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

        if !verify_password(&user.password_hash, current_password) {
            warn!(user_id, "password change with wrong current password");
            return Err(AppError::Auth("Current password is incorrect".to_string()));
        }

        self.check_password_strength(new_password)?;

        let mut new_password = new_password.to_string();
        let password_hash = hash_password_secure(
            &mut new_password,
            self.settings.password_requirements.work_factor,
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        self.store.update_password(user_id, &password_hash).await?;

        info!(user_id, "password changed");
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<Option<String>, AppError> {
        let user = match self.store.user_by_email(email).await? {
            Some(user) => user,
            None => {
                // Do not reveal whether the account exists
                info!(%email, "password reset requested for unknown email");
                return Ok(None);
            },
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.store
            .insert_password_reset(&token, user.id, expires_at)
            .await?;

        counter!(PASSWORD_RESET_REQUESTED).increment(1);
        info!(user_id = user.id, "password reset token issued");

        Ok(Some(token))
    }

    async fn reset_password(
        &self,
        email: &str,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .store
            .user_by_email(email)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let owner = self
            .store
            .consume_password_reset(reset_token)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if owner != user.id {
            warn!(user_id = user.id, "reset token presented for wrong account");
            return Err(AppError::InvalidToken);
        }

        self.check_password_strength(new_password)?;

        let mut new_password = new_password.to_string();
        let password_hash = hash_password_secure(
            &mut new_password,
            self.settings.password_requirements.work_factor,
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        self.store.update_password(user.id, &password_hash).await?;

        // A reset invalidates every open session
        self.store.revoke_refresh_tokens_for_user(user.id).await?;

        info!(user_id = user.id, "password reset completed");
        Ok(())
    }

    async fn verify_email(&self, user_id: i64) -> Result<(), AppError> {
        self.store.mark_verified(user_id).await?;
        info!(user_id, "email verified");
        Ok(())
    }
}
