//! Great-circle math for proximity detection.
//!
//! Distances use the haversine formula with a spherical Earth of radius
//! 6371 km. A checkpoint counts as reached when the user is strictly inside
//! the 50 m capture radius; exactly 0.05 km is not a capture.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Capture radius around a checkpoint, in kilometers (50 m).
pub const CAPTURE_RADIUS_KM: f64 = 0.05;

/// Haversine great-circle distance between two (lat, lon) pairs in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
  let d_lat = (lat2 - lat1).to_radians();
  let d_lon = (lon2 - lon1).to_radians();
  let a = (d_lat / 2.0).sin().powi(2)
    + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
  EARTH_RADIUS_KM * (2.0 * a.sqrt().atan2((1.0 - a).sqrt()))
}

/// Strict comparison against the capture radius.
pub fn within_capture_radius(distance_km: f64) -> bool {
  distance_km < CAPTURE_RADIUS_KM
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_distance_for_identical_points() {
    let d = haversine_km(37.8199, -122.4783, 37.8199, -122.4783);
    assert!(d.abs() < 1e-9);
  }

  #[test]
  fn one_degree_of_latitude_is_about_111_km() {
    let d = haversine_km(0.0, 0.0, 1.0, 0.0);
    assert!((d - 111.195).abs() < 0.05, "got {d}");
  }

  #[test]
  fn symmetric_in_its_endpoints() {
    let a = haversine_km(40.7812, -73.9665, 40.7690, -73.9810);
    let b = haversine_km(40.7690, -73.9810, 40.7812, -73.9665);
    assert!((a - b).abs() < 1e-12);
  }

  #[test]
  fn capture_boundary_is_strict() {
    assert!(!within_capture_radius(0.05));
    assert!(within_capture_radius(0.0499));
    assert!(!within_capture_radius(0.0501));
  }

  #[test]
  fn fifty_meter_offset_is_near_the_boundary() {
    // ~45 m north of the checkpoint: inside. ~56 m: outside.
    let inside = haversine_km(37.8199, -122.4783, 37.8199 + 0.0004, -122.4783);
    let outside = haversine_km(37.8199, -122.4783, 37.8199 + 0.0005, -122.4783);
    assert!(within_capture_radius(inside), "inside was {inside} km");
    assert!(!within_capture_radius(outside), "outside was {outside} km");
  }
}
