//! Domain models used by the backend: trails, checkpoints, quizzes, challenges, and scores.

use serde::{Deserialize, Serialize};

/// What kind of challenge is attached to a checkpoint?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
  /// User must submit a photo; it is validated server-side against `keyword`.
  Photo,
}
impl Default for ChallengeKind {
  fn default() -> Self { ChallengeKind::Photo }
}

/// Where did we get the trail from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrailSource {
  LocalBank,   // from user-provided TOML bank
  Seed,  // built-in seeds (last resort)
}

/// A single point of the trail's reference path (GPX-style).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GeoPoint {
  pub lat: f64,
  pub lon: f64,
}

/// Multiple-choice quiz shown when a checkpoint is reached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quiz {
  pub question: String,
  pub options: Vec<String>,
  pub answer: String,
}

impl Quiz {
  /// Only well-formed quizzes count toward a session's question total.
  /// Malformed ones (empty question, or answer not among the options) are
  /// still traversed but contribute no score opportunity.
  pub fn is_well_formed(&self) -> bool {
    !self.question.trim().is_empty() && self.options.iter().any(|o| o == &self.answer)
  }
}

/// Optional extra task at a checkpoint. The `keyword` is only used server-side
/// when calling the photo validator; it is never exposed to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  #[serde(rename = "type")]
  pub kind: ChallengeKind,
  pub prompt: String,
  pub keyword: String,
}

/// Geofenced point on a trail with its quiz and optional challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
  pub title: String,
  pub lat: f64,
  pub lon: f64,
  pub quiz: Quiz,
  #[serde(default)] pub challenge: Option<Challenge>,
}

/// Core trail structure persisted in-memory. Checkpoint order is the intended
/// visiting order and is immutable for the trail's lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trail {
  pub id: String,
  pub name: String,
  pub source: TrailSource,

  // Trailhead coordinate, used for nearby lookups.
  pub latitude: f64,
  pub longitude: f64,

  #[serde(default)] pub closest_city: String,
  #[serde(default)] pub length_km: Option<f64>,
  #[serde(default)] pub history: String,

  pub checkpoints: Vec<Checkpoint>,
  #[serde(default)] pub gpx_points: Vec<GeoPoint>,
}

/// Last completion result for a trail, keyed by trail id. Overwritten each
/// time the trail is completed; survives across sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedScore {
  pub trail_id: String,
  pub correct: usize,
  pub total: usize,
  /// round(100 * correct / total); defined as 0 when total is 0.
  pub percent: u32,
  pub completed_at_unix: u64,
}
