// ============================
// crates/backend-lib/src/auth/reset.rs
// ============================
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
/** Secure token generation for the password-reset flow
Reset tokens are single-use opaque strings handed out by
`POST /api/auth/forgot-password` and consumed by `POST /api/auth/reset-password`. */
use rand::{rngs::OsRng, RngCore};

/// Reset token size in bytes (32 bytes = 256 bits of entropy)
const RESET_TOKEN_BYTES: usize = 32;

/// Reset token lifetime in minutes
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/** Generate a cryptographically secure password-reset token
This uses OS-provided entropy to create a token that is unguessable
and safe to embed in a reset link.
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_reset_token() -> String {
    generate_reset_token_with_size(RESET_TOKEN_BYTES)
}

/** Generate a reset token with a specific entropy size
# Arguments
* `bytes` - The size of the random token in bytes
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_reset_token_with_size(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
