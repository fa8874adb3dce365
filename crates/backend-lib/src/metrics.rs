// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const AUTH_REGISTERED: &str = "auth.registered";
pub const AUTH_LOGIN_SUCCESS: &str = "auth.login.success";
pub const AUTH_LOGIN_FAILED: &str = "auth.login.failed";
pub const AUTH_TOKEN_REFRESHED: &str = "auth.token.refreshed";
pub const AUTH_LOGOUT: &str = "auth.logout";
pub const PASSWORD_RESET_REQUESTED: &str = "auth.password_reset.requested";
pub const RATE_LIMIT_REJECTED: &str = "rate_limit.rejected";
