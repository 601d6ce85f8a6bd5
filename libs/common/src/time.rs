use chrono::{DateTime, Duration, Utc};

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Computes an RFC3339 deadline `seconds` in the future from now.
pub fn deadline_from_now(seconds: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_in_the_future() {
        let deadline = deadline_from_now(60);
        assert!(deadline > now_utc());
    }
}
