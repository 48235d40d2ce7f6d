use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use super::AuthUser;
use crate::error::ApiError;

/// Past this many tracked callers, idle buckets are dropped
const MAX_TRACKED_CALLERS: usize = 10_000;

/// Per-minute quota for one route group, counted separately for each caller.
///
/// Authenticated callers are keyed by user id, everyone else by peer address.
pub struct RouteLimiter {
    group: &'static str,
    limiter: DefaultKeyedRateLimiter<String>,
}

impl RouteLimiter {
    /// `None` for a zero quota, which leaves the group unthrottled
    pub fn per_minute(group: &'static str, requests: u32) -> Option<Arc<Self>> {
        let requests = NonZeroU32::new(requests)?;
        Some(Arc::new(Self {
            group,
            limiter: RateLimiter::keyed(Quota::per_minute(requests)),
        }))
    }

    pub fn group(&self) -> &'static str {
        self.group
    }

    /// Take one request from the caller's quota, or return the seconds to wait
    pub fn check(&self, caller: &str) -> Result<(), u64> {
        if self.limiter.len() > MAX_TRACKED_CALLERS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&caller.to_string()).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            wait.as_secs().max(1)
        })
    }
}

fn caller_key(request: &Request) -> String {
    if let Some(user) = request.extensions().get::<AuthUser>() {
        return format!("user:{}", user.user_id);
    }
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_string(),
    }
}

/// Rejects with 429 once the caller has used up the group's quota
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RouteLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = caller_key(&request);
    if let Err(retry_after) = limiter.check(&caller) {
        tracing::warn!(group = limiter.group(), caller = %caller, retry_after, "Rate limit exceeded");
        return Err(ApiError::too_many_requests(retry_after));
    }
    Ok(next.run(request).await)
}
