//! Adaptive TTL Module
//!
//! Derives a per-key expiration from its access statistics.

use std::time::Duration;

use crate::cache::AccessPattern;

/// Upper bound of the frequency multiplier.
pub const MAX_FREQUENCY_MULTIPLIER: f64 = 3.0;

/// Upper bound of the interval multiplier.
pub const MAX_INTERVAL_MULTIPLIER: f64 = 2.0;

/// Access interval at which the interval multiplier is neutral.
const REFERENCE_INTERVAL_MS: f64 = 60_000.0;

// == Adaptive TTL ==
/// Computes the TTL for a key with the given pattern.
///
/// Without a pattern the base TTL is returned unchanged. Otherwise the base
/// is scaled by `min(3, frequency / 10 + 1)` and by
/// `min(2, 60s / avg_access_interval)` (1 when no interval is known yet).
/// A result too large for [`Duration`] saturates to [`Duration::MAX`].
pub fn adaptive_ttl(base_ttl: Duration, pattern: Option<&AccessPattern>) -> Duration {
    let Some(pattern) = pattern else {
        return base_ttl;
    };

    let frequency_multiplier =
        (pattern.frequency as f64 / 10.0 + 1.0).min(MAX_FREQUENCY_MULTIPLIER);

    let interval_multiplier = if pattern.avg_access_interval_ms > 0 {
        (REFERENCE_INTERVAL_MS / pattern.avg_access_interval_ms as f64).min(MAX_INTERVAL_MULTIPLIER)
    } else {
        1.0
    };

    scale_ttl(base_ttl, frequency_multiplier * interval_multiplier)
}

/// Multiplies `ttl` by `factor`, saturating at [`Duration::MAX`].
pub fn scale_ttl(ttl: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(ttl.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
