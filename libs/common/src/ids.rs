use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generates an 8-character alphanumeric request id (~47 bits of entropy).
///
/// Short enough to match the dotted subject format in the broker grammar;
/// collisions within one in-flight `reply_timeout` window are not checked for.
pub fn new_request_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_has_expected_length() {
        assert_eq!(new_request_id().len(), 8);
    }

    #[test]
    fn request_id_is_url_safe() {
        let id = new_request_id();
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
