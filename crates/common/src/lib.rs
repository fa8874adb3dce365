// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the `CuraGenie` API server and its clients.
//! This module defines the JSON request/response bodies for the auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User roles recognized by the platform
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Patient accounts, the default at registration
    Patient,
    /// Clinician accounts
    Doctor,
    /// Platform administrators
    Admin,
}

impl Role {
    /// Parse a role from its lowercase wire form
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// The wire form stored in the database and embedded in token claims
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body for `POST /api/auth/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    /// Defaults to `patient` when omitted
    #[serde(default)]
    pub role: Option<Role>,
}

/// Body for `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for `POST /api/auth/refresh`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Body for `POST /api/auth/change-password`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Body for `POST /api/auth/forgot-password`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Body for `POST /api/auth/reset-password`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

/// Access + refresh token pair returned by login, register, and refresh
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Public view of a user record
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Response for register and login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub tokens: TokenResponse,
    pub message: String,
}

/// Response for message-only endpoints (logout, password changes, verification)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Response for the admin activate/deactivate toggle
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserActivationResponse {
    pub message: String,
    pub user_id: i64,
    pub is_active: bool,
    pub timestamp: DateTime<Utc>,
}

/// Response for `GET /api/auth/health`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}
