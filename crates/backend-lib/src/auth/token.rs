// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed bearer token issuance and verification.
//!
//! Access tokens are short-lived and carry the user's role; refresh tokens
//! are longer-lived and only good for minting a new pair. Both carry a
//! `token_type` discriminator so one can never stand in for the other.
use chrono::{DateTime, Duration, Utc};
use curagenie_common::{Role, TokenResponse};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type discriminator for access tokens
pub const TOKEN_TYPE_ACCESS: &str = "access";
/// Type discriminator for refresh tokens
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Access token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: String,
    /// User role
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiry (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access"
    pub token_type: String,
    /// Token unique identifier
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: i64, role: Role, expires_in_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(expires_in_minutes)).timestamp(),
            token_type: TOKEN_TYPE_ACCESS.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// The user id carried in `sub`
    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

/// Refresh token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject - user id
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiry
    pub exp: i64,
    /// Token type, always "refresh"
    pub token_type: String,
    /// Token unique identifier, tracked server-side for revocation
    pub jti: String,
}

impl RefreshClaims {
    pub fn new(user_id: i64, expires_in_days: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(expires_in_days)).timestamp(),
            token_type: TOKEN_TYPE_REFRESH.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Result<i64, TokenError> {
        self.sub.parse().map_err(|_| TokenError::Invalid)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Token processing errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("wrong token type")]
    WrongType,
}

impl From<TokenError> for crate::error::AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => crate::error::AppError::TokenExpired,
            TokenError::Invalid | TokenError::WrongType => crate::error::AppError::InvalidToken,
            TokenError::Encoding(e) => {
                crate::error::AppError::Internal(format!("failed to encode token: {e}"))
            },
        }
    }
}

fn signing_validation() -> Validation {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    // expiry boundaries are exact
    validation.leeway = 0;
    validation
}

/// Encode an access token
pub fn create_access_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::from)
}

/// Encode a refresh token
pub fn create_refresh_token(claims: &RefreshClaims, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::from)
}

/// Mint an access + refresh pair for a user.
///
/// Returns the wire-level response together with the refresh claims so the
/// caller can persist the `jti` for revocation tracking.
pub fn issue_token_pair(
    user_id: i64,
    role: Role,
    secret: &str,
    access_expires_minutes: i64,
    refresh_expires_days: i64,
) -> Result<(TokenResponse, RefreshClaims), TokenError> {
    let access_claims = Claims::new(user_id, role, access_expires_minutes);
    let refresh_claims = RefreshClaims::new(user_id, refresh_expires_days);

    let access_token = create_access_token(&access_claims, secret)?;
    let refresh_token = create_refresh_token(&refresh_claims, secret)?;

    Ok((
        TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: access_expires_minutes * 60,
        },
        refresh_claims,
    ))
}

/// Decode and verify an access token.
///
/// Rejects expired or tampered tokens and anything whose `token_type` is not
/// "access" (a refresh token cannot authorize an API call).
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &signing_validation(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(TokenError::WrongType);
    }

    Ok(data.claims)
}

/// Decode and verify a refresh token, enforcing the type discriminator.
pub fn decode_refresh_token(token: &str, secret: &str) -> Result<RefreshClaims, TokenError> {
    let data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &signing_validation(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(TokenError::WrongType);
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-token-testing-minimum-32-chars";

    #[test]
    fn test_create_and_decode_access_token() {
        let claims = Claims::new(42, Role::Patient, 15);

        let token = create_access_token(&claims, TEST_SECRET).unwrap();
        assert!(!token.is_empty());

        let decoded = decode_access_token(&token, TEST_SECRET).unwrap();
        assert_eq!(decoded.sub, "42");
        assert_eq!(decoded.user_id().unwrap(), 42);
        assert_eq!(decoded.role, Role::Patient);
        assert_eq!(decoded.token_type, TOKEN_TYPE_ACCESS);
    }

    #[test]
    fn test_issue_token_pair() {
        let (pair, refresh_claims) =
            issue_token_pair(7, Role::Admin, TEST_SECRET, 15, 7).unwrap();

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 15 * 60);

        let access = decode_access_token(&pair.access_token, TEST_SECRET).unwrap();
        assert_eq!(access.user_id().unwrap(), 7);
        assert_eq!(access.role, Role::Admin);

        let refresh = decode_refresh_token(&pair.refresh_token, TEST_SECRET).unwrap();
        assert_eq!(refresh.user_id().unwrap(), 7);
        assert_eq!(refresh.jti, refresh_claims.jti);

        // Access token always expires before its paired refresh token
        assert!(access.exp < refresh.exp);
    }

    #[test]
    fn test_token_type_confusion_rejected() {
        let (pair, _) = issue_token_pair(7, Role::Patient, TEST_SECRET, 15, 7).unwrap();

        // A refresh token cannot be used where an access token is required
        // (its claims don't even carry a role, so it dies as malformed)
        let result = decode_access_token(&pair.refresh_token, TEST_SECRET);
        assert!(matches!(
            result,
            Err(TokenError::Invalid) | Err(TokenError::WrongType)
        ));

        // ...and vice versa
        let result = decode_refresh_token(&pair.access_token, TEST_SECRET);
        assert!(matches!(result, Err(TokenError::WrongType)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::new(42, Role::Patient, -5);
        let token = create_access_token(&claims, TEST_SECRET).unwrap();

        let result = decode_access_token(&token, TEST_SECRET);
        assert!(matches!(result, Err(TokenError::Expired)));

        let refresh = RefreshClaims::new(42, -1);
        let token = create_refresh_token(&refresh, TEST_SECRET).unwrap();
        let result = decode_refresh_token(&token, TEST_SECRET);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_invalid_token_rejected() {
        assert!(matches!(
            decode_access_token("not.a.token", TEST_SECRET),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(42, Role::Doctor, 15);
        let token = create_access_token(&claims, TEST_SECRET).unwrap();

        let result = decode_access_token(&token, "wrong-secret-key-for-testing-minimum-32-chars");
        assert!(result.is_err());
    }
}
