//! Instance configuration.
//!
//! No environment variables, no config files, no CLI — the crate is a
//! library consumed by an embedding application (§6).

use std::time::Duration;

/// Default timeout for a synchronous request (`ICAP_MSG_TIMEOUT_US`).
pub const DEFAULT_MSG_TIMEOUT: Duration = Duration::from_micros(600 * 1000);

/// Default bound on the in-flight request table.
///
/// The original bare-metal transport hardcodes this as a static queue
/// depth (`ICAP_MSG_QUEUE_SIZE`); every transport variant benefits from
/// bounding it, so it's carried forward as the library-wide default.
pub const DEFAULT_MAX_PENDING: usize = 10;

/// Per-instance tunables.
#[derive(Debug, Clone, Copy)]
pub struct InstanceConfig {
    /// Deadline for a synchronous request, from submission to timeout.
    pub msg_timeout: Duration,
    /// Maximum number of simultaneously in-flight requests.
    pub max_pending: usize,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            msg_timeout: DEFAULT_MSG_TIMEOUT,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = InstanceConfig::default();
        assert_eq!(cfg.msg_timeout, Duration::from_millis(600));
        assert_eq!(cfg.max_pending, 10);
    }
}
