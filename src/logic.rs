//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Nearby-trail search (radius filter, nearest first)
//!   - Stateless position checks against a trail checkpoint
//!   - Photo validation (external service with a local fallback)
//!   - Recording completion scores

use std::cmp::Ordering;

use tracing::{error, info, instrument, warn};

use crate::domain::{PersistedScore, Trail};
use crate::geo;
use crate::protocol::{PositionCheckOut, TrailSummaryOut, to_summary_out};
use crate::state::AppState;
use crate::util::round_to;
use crate::validator::PhotoVerdict;

/// Default search radius for nearby lookups, in kilometers.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

/// Filter trails to those whose trailhead lies within `radius_km` of the
/// caller, nearest first. Pure so it can be exercised without an `AppState`.
pub fn nearby_in_radius(trails: Vec<Trail>, lat: f64, lon: f64, radius_km: f64) -> Vec<(Trail, f64)> {
  let mut nearby: Vec<(Trail, f64)> = trails
    .into_iter()
    .map(|t| {
      let d = geo::haversine_km(lat, lon, t.latitude, t.longitude);
      (t, d)
    })
    .filter(|(_, d)| *d <= radius_km)
    .collect();
  nearby.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
  nearby
}

#[instrument(level = "info", skip(state), fields(%lat, %lon, %radius_km))]
pub async fn find_nearby(state: &AppState, lat: f64, lon: f64, radius_km: f64) -> Vec<TrailSummaryOut> {
  let trails = state.all_trails().await;
  let nearby = nearby_in_radius(trails, lat, lon, radius_km);
  info!(target: "hike", found = nearby.len(), "Nearby trail lookup");
  nearby
    .iter()
    .map(|(t, d)| to_summary_out(t, round_to(*d, 2)))
    .collect()
}

/// Stateless proximity check: is (lat, lon) within the capture radius of the
/// given checkpoint of the given trail? Mirrors the engine's rule exactly so
/// polling clients and the session path can never disagree.
#[instrument(level = "info", skip(state), fields(%trail_id, checkpoint_index))]
pub async fn check_position(
  state: &AppState,
  trail_id: &str,
  checkpoint_index: usize,
  lat: f64,
  lon: f64,
) -> Result<PositionCheckOut, String> {
  let trail = state
    .get_trail(trail_id)
    .await
    .ok_or_else(|| "Trail not found".to_string())?;
  let cp = trail
    .checkpoints
    .get(checkpoint_index)
    .ok_or_else(|| "Invalid checkpoint".to_string())?;

  let distance_km = geo::haversine_km(lat, lon, cp.lat, cp.lon);
  let reached = geo::within_capture_radius(distance_km);
  Ok(PositionCheckOut { reached, distance_km: round_to(distance_km, 3) })
}

/// Validate a photo against the checkpoint keyword. Uses the external service
/// when configured, and falls back to a local sanity check when the service
/// is absent or failing. The verdict is advisory either way.
#[instrument(level = "info", skip(state, image), fields(image_len = image.len(), %keyword))]
pub async fn validate_photo(state: &AppState, image: Vec<u8>, mime: &str, keyword: &str) -> PhotoVerdict {
  if let Some(v) = &state.validator {
    match v.validate(image.clone(), mime, keyword).await {
      Ok(verdict) => return verdict,
      Err(e) => {
        error!(target: "hike", %keyword, error = %e, "Photo validator failed; using local check.");
      }
    }
  }
  local_photo_check(&image, mime)
}

/// Record a finalized session score. Called exactly once per completion.
#[instrument(level = "info", skip(state, score), fields(trail_id = %score.trail_id))]
pub async fn record_completion(state: &AppState, score: PersistedScore) {
  info!(
    target: "hike",
    trail_id = %score.trail_id,
    correct = score.correct,
    total = score.total,
    percent = score.percent,
    "Trail completed"
  );
  state.record_score(score).await;
}

// -------- Local fallbacks --------

/// Minimal acceptance check when no validator service is configured: the
/// payload must be non-empty and look like an image. Keyword matching needs
/// the external model, so the local path cannot reject on content.
fn local_photo_check(image: &[u8], mime: &str) -> PhotoVerdict {
  let plausible = !image.is_empty() && mime.starts_with("image/");
  if !plausible {
    warn!(target: "hike", %mime, len = image.len(), "Local photo check rejected payload");
  }
  PhotoVerdict { valid: plausible, score: if plausible { 1.0 } else { 0.0 } }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::TrailSource;

  fn bare_trail(id: &str, lat: f64, lon: f64) -> Trail {
    Trail {
      id: id.into(),
      name: id.to_uppercase(),
      source: TrailSource::Seed,
      latitude: lat,
      longitude: lon,
      closest_city: String::new(),
      length_km: None,
      history: String::new(),
      checkpoints: vec![],
      gpx_points: vec![],
    }
  }

  #[test]
  fn nearby_is_radius_filtered_and_sorted_nearest_first() {
    let trails = vec![
      bare_trail("far", 38.0, -122.0),     // ~111 km away
      bare_trail("close", 37.01, -122.0),  // ~1.1 km away
      bare_trail("mid", 37.05, -122.0),    // ~5.6 km away
    ];
    let hits = nearby_in_radius(trails, 37.0, -122.0, 10.0);
    let ids: Vec<&str> = hits.iter().map(|(t, _)| t.id.as_str()).collect();
    assert_eq!(ids, vec!["close", "mid"]);
    assert!(hits[0].1 < hits[1].1);
  }

  #[test]
  fn radius_boundary_is_inclusive() {
    // ~111.19 km north: inside a 112 km radius, outside a 111 km one.
    let hit = nearby_in_radius(vec![bare_trail("t", 38.0, -122.0)], 37.0, -122.0, 112.0);
    assert_eq!(hit.len(), 1);
    let miss = nearby_in_radius(vec![bare_trail("t", 38.0, -122.0)], 37.0, -122.0, 111.0);
    assert!(miss.is_empty());
  }

  #[test]
  fn local_photo_check_wants_a_plausible_image() {
    assert!(local_photo_check(&[0xFF, 0xD8, 0xFF], "image/jpeg").valid);
    assert!(!local_photo_check(&[], "image/jpeg").valid);
    assert!(!local_photo_check(&[1, 2, 3], "text/plain").valid);
  }
}
