use chrono::Utc;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Whole seconds from `now_ms` until `expiry_ms`, never negative.
pub fn remaining_secs(expiry_ms: i64, now_ms: i64) -> i64 {
    (expiry_ms.saturating_sub(now_ms) / 1000).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_secs() {
        assert_eq!(remaining_secs(10_000, 0), 10);
        assert_eq!(remaining_secs(10_999, 0), 10);
        assert_eq!(remaining_secs(1_000, 1_000), 0);
        assert_eq!(remaining_secs(0, 5_000), 0); // already past
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01 in epoch ms
        assert!(now_millis() > 1_577_836_800_000);
    }
}
