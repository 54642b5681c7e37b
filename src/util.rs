//! Small utility helpers used across modules.

/// Round to a fixed number of decimal places.
/// Distances on the wire use 2 (trail listings) or 3 (position checks) places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
  let factor = 10f64.powi(decimals as i32);
  (value * factor).round() / factor
}

/// Seconds since the Unix epoch, for completion timestamps.
pub fn unix_now_secs() -> u64 {
  std::time::SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .map(|d| d.as_secs())
    .unwrap_or(0)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounding_matches_wire_precision() {
    assert_eq!(round_to(12.34567, 2), 12.35);
    assert_eq!(round_to(0.0494999, 3), 0.049);
    assert_eq!(round_to(3.0, 3), 3.0);
  }
}
