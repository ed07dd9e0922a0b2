/// Longest key a memcached-compatible backend accepts.
pub const MAX_KEY_LEN: usize = 250;

/// Whether `key` is acceptable to a memcached-style backend: non-empty, at
/// most [`MAX_KEY_LEN`] bytes, no whitespace or control characters.
pub fn is_valid_key(key: &str) -> bool {
  !key.is_empty()
    && key.len() <= MAX_KEY_LEN
    && !key.chars().any(|c| c.is_whitespace() || c.is_control())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_uuid_keys_are_valid() {
    let key = uuid::Uuid::new_v4().to_string();
    assert!(is_valid_key(&key));
  }

  #[test]
  fn test_rejects_bad_keys() {
    assert!(!is_valid_key(""));
    assert!(!is_valid_key("has space"));
    assert!(!is_valid_key("line\nbreak"));
    assert!(!is_valid_key(&"k".repeat(MAX_KEY_LEN + 1)));
    assert!(is_valid_key(&"k".repeat(MAX_KEY_LEN)));
  }
}
