//! Time utilities and protocol timing constants.

use chrono::{DateTime, Duration, Utc};

/// Protocol timing constants.
pub mod constants {
    use std::time::Duration;

    /// Default wait for a counterparty's signature (10 seconds).
    pub fn session_timeout() -> Duration {
        Duration::from_secs(10)
    }

    /// Default responder wait for the finality push (30 seconds).
    pub fn finality_timeout() -> Duration {
        Duration::from_secs(30)
    }

    /// Default wait for the commitment authority (5 seconds).
    pub fn notarization_timeout() -> Duration {
        Duration::from_secs(5)
    }
}

/// A timestamp with timezone (always UTC for PactLedger).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Check if a timestamp has expired (is in the past).
pub fn is_expired(expiry: Timestamp) -> bool {
    now() > expiry
}

/// Calculate expiry time from now.
pub fn expires_in(duration: Duration) -> Timestamp {
    now() + duration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired() {
        let past = now() - Duration::seconds(10);
        assert!(is_expired(past));

        let future = now() + Duration::seconds(10);
        assert!(!is_expired(future));
    }
}
