// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod extract;
pub mod password;
pub mod rate_limit;
pub mod reset;
pub mod token;
mod service;
mod service_impl;

pub use extract::{AdminUser, CurrentUser};
pub use password::{hash_password, verify_password, validate_password_strength, PasswordRequirements, MIN_PASSWORD_LENGTH};
pub use rate_limit::{CounterStore, InMemoryCounterStore, RateLimitPolicy, SlidingWindowLimiter};
pub use token::{Claims, RefreshClaims, TokenError};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
