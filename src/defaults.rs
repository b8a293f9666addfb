//! Centralized defaults (timeouts, retry shape, polling cadence, cache sizing)
//!
//! Every tunable the crate falls back to lives here, so the numbers are
//! auditable in one place instead of scattered across constructors.

/// HTTP-related defaults
pub mod http {
    use std::time::Duration;

    /// Total budget for a single HTTP attempt, connect through body read
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Budget for establishing the TCP/TLS connection
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Retry defaults shared by both retry engines
pub mod retry {
    use std::time::Duration;

    /// Attempt ceiling, counting the initial try
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Delay before the first re-attempt
    pub const INITIAL_DELAY: Duration = Duration::from_secs(2);

    /// Ceiling on any single inter-attempt delay
    pub const MAX_DELAY: Duration = Duration::from_secs(30);

    /// Growth factor between consecutive delays
    pub const BACKOFF_MULTIPLIER: f64 = 2.0;

    /// Fraction of the computed delay used as the jitter band
    pub const JITTER_FACTOR: f64 = 0.1;
}

/// Job polling defaults
pub mod poll {
    use std::time::Duration;

    /// Gap between consecutive status requests
    pub const INTERVAL: Duration = Duration::from_secs(5);

    /// Overall wait budget for a single job
    pub const MAX_WAIT: Duration = Duration::from_secs(300);
}

/// Model catalog defaults
pub mod models {
    use std::time::Duration;

    /// How long a cached model listing counts as fresh
    pub const TTL: Duration = Duration::from_secs(3600);

    /// Listings kept per catalog before LRU eviction
    pub const CACHE_CAPACITY: usize = 32;
}
