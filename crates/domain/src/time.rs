//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for move bookkeeping and event times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole seconds elapsed from `earlier` to `later`, negative if the clock went back.
#[must_use]
pub fn seconds_between(earlier: Timestamp, later: Timestamp) -> i64 {
    (later - earlier).num_seconds()
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_count_whole_seconds_between_timestamps() {
        let t0 = now();
        let t1 = t0 + TimeDelta::milliseconds(90_500);
        assert_eq!(seconds_between(t0, t1), 90);
        assert_eq!(seconds_between(t1, t0), -90);
    }
}
