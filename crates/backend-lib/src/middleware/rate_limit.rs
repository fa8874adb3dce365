use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use metrics::counter;

use crate::error::AppError;
use crate::metrics::RATE_LIMIT_REJECTED;
use crate::AppState;

/// Rate limiter middleware.
///
/// Resolves the client key, picks the policy for the request's route class,
/// and rejects with 429 once the window budget is spent. Rejected requests
/// never reach the handler, so stored credential state is untouched.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_key = client_key(request.headers());
    let policy = state.settings.rate_limit.policy_for(request.uri().path());

    if !state.limiter.allow(&client_key, policy).await {
        let retry_after = state.limiter.retry_after(&client_key, policy).await;

        counter!(RATE_LIMIT_REJECTED).increment(1);
        tracing::warn!(
            client_key = %client_key,
            path = %request.uri().path(),
            "rate limit exceeded"
        );

        return Err(AppError::RateLimited {
            retry_after,
            limit: policy.max_requests,
            window: policy.window_secs,
        });
    }

    Ok(next.run(request).await)
}

/// Resolve the identifier a request is counted under.
///
/// Proxied requests carry the original address in x-forwarded-for (first
/// entry in the chain) or x-real-ip.
fn client_key(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return format!("ip:{first}");
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        return format!("ip:{real_ip}");
    }

    "ip:unknown".to_string()
}
