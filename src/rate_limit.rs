use std::collections::HashMap;
use std::env;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Configurable rate limit thresholds. All read from environment variables
/// with defaults matching the deployed service.
///
/// Environment variables:
/// - `RATE_LIMIT_OTM_POST` — Max one-time message creations per minute per IP (default: 30)
/// - `RATE_LIMIT_OTM_GET` — Max one-time message reads per minute per IP (default: 60)
/// - `RATE_LIMIT_FILE_UPLOAD` — Max file uploads per minute per IP (default: 10)
/// - `RATE_LIMIT_FILE_DOWNLOAD` — Max file downloads per minute per IP (default: 30)
/// - `RATE_LIMIT_CHAT_INVITE` — Max invite creations/claims per minute per IP (default: 10)
/// - `RATE_LIMIT_CHAT_MESSAGE` — Max chat messages per minute per IP (default: 60)
pub struct RateLimitConfig {
    pub otm_post_max: usize,
    pub otm_get_max: usize,
    pub file_upload_max: usize,
    pub file_download_max: usize,
    pub chat_invite_max: usize,
    pub chat_message_max: usize,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            otm_post_max: 30,
            otm_get_max: 60,
            file_upload_max: 10,
            file_download_max: 30,
            chat_invite_max: 10,
            chat_message_max: 60,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    /// Create a new RateLimitConfig from environment variables, with defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("RATE_LIMIT_OTM_POST")
            && let Ok(n) = val.parse::<usize>()
        {
            config.otm_post_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_OTM_GET")
            && let Ok(n) = val.parse::<usize>()
        {
            config.otm_get_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_FILE_UPLOAD")
            && let Ok(n) = val.parse::<usize>()
        {
            config.file_upload_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_FILE_DOWNLOAD")
            && let Ok(n) = val.parse::<usize>()
        {
            config.file_download_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_CHAT_INVITE")
            && let Ok(n) = val.parse::<usize>()
        {
            config.chat_invite_max = n;
        }
        if let Ok(val) = env::var("RATE_LIMIT_CHAT_MESSAGE")
            && let Ok(n) = val.parse::<usize>()
        {
            config.chat_message_max = n;
        }

        config
    }
}

/// One fixed window per (family, ip), with independent counters per action
/// inside the family. The window starts at the family's first request and
/// resets lazily on the first request after it elapses.
struct Bucket {
    window_start: Instant,
    counters: HashMap<&'static str, usize>,
}

pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
}

/// Outcome of a single admission check.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub allowed: bool,
    pub limit: usize,
    pub remaining: usize,
    /// Seconds until the window resets. 0 if the request was admitted.
    pub retry_after_secs: u64,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject one request for `action` within `family`, keyed by
    /// client IP. Families never interact; actions in the same family share
    /// a window but count separately.
    pub fn check(
        &self,
        family: &str,
        action: &'static str,
        ip: &str,
        max: usize,
        window_secs: u64,
    ) -> RateLimitInfo {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);
        let key = format!("{family}:{ip}");

        let needs_reset = buckets
            .get(&key)
            .is_some_and(|b| now.duration_since(b.window_start) >= window);
        if needs_reset {
            // A window reset doubles as the idle sweep: distinct IPs would
            // otherwise accumulate buckets forever.
            buckets.retain(|k, b| *k == key || now.duration_since(b.window_start) < window * 2);
            if let Some(bucket) = buckets.get_mut(&key) {
                bucket.window_start = now;
                bucket.counters.clear();
            }
        }

        let bucket = buckets.entry(key).or_insert_with(|| Bucket {
            window_start: now,
            counters: HashMap::new(),
        });
        let count = bucket.counters.entry(action).or_insert(0);

        if *count >= max {
            let elapsed = now.duration_since(bucket.window_start);
            let retry_after = if elapsed < window {
                (window - elapsed).as_secs() + 1
            } else {
                1
            };
            return RateLimitInfo {
                allowed: false,
                limit: max,
                remaining: 0,
                retry_after_secs: retry_after,
            };
        }

        *count += 1;
        RateLimitInfo {
            allowed: true,
            limit: max,
            remaining: max - *count,
            retry_after_secs: 0,
        }
    }

    /// Number of live buckets. Idle buckets disappear on window resets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
