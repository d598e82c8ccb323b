use std::time::Duration;

/// Largest file accepted by the upload endpoint.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
/// Upload request body cap, leaves room for base64 expansion of [`MAX_UPLOAD_BYTES`].
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_UPLOAD_BYTES / 3 * 4 + 64 * 1024;
/// Body cap for every other route.
pub const MAX_BODY_BYTES: usize = 16 * 1024;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Login attempts allowed per alias per minute.
pub const LOGIN_ATTEMPTS_PER_MINUTE: u32 = 5;
pub const LOGIN_LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);
