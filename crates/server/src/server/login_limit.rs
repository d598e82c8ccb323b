use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use crate::error::RequestError;
use crate::models::user::validate_user_alias;
use crate::server::constants::LOGIN_LIMITER_PRUNE_INTERVAL;
use crate::server::state::AppState;

/// Per-alias login attempt limiter. Only well-formed aliases are tracked.
pub struct LoginLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl LoginLimiter {
    pub fn per_minute(attempts: u32) -> Self {
        let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(attempts)),
        }
    }

    pub fn check(&self, alias: &str) -> Result<(), RequestError> {
        validate_user_alias(alias).map_err(|_| RequestError::BadCredentials)?;
        if self.limiter.check_key(&alias.to_string()).is_err() {
            warn!("login attempts exhausted for alias `{alias}`");
            return Err(RequestError::TooManyRequests);
        }
        Ok(())
    }

    /// Forgets aliases whose quota has fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_aliases(&self) -> usize {
        self.limiter.len()
    }
}

pub async fn prune_periodically(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(LOGIN_LIMITER_PRUNE_INTERVAL);
    loop {
        interval.tick().await;
        state.login_limiter.prune();
        debug!(
            "login limiter tracks {} aliases",
            state.login_limiter.tracked_aliases()
        );
    }
}
