//! Loading the trail bank from TOML.
//!
//! See `TrailBankConfig` and `TrailCfg` for the expected schema.

use serde::Deserialize;
use tracing::{info, error};

use crate::domain::{Challenge, GeoPoint, Quiz};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TrailBankConfig {
  #[serde(default)]
  pub trails: Vec<TrailCfg>,
}

/// Trail entry accepted in TOML configuration. Entries without an `id` get a
/// generated one; entries without checkpoints are rejected at load time.
#[derive(Clone, Debug, Deserialize)]
pub struct TrailCfg {
  #[serde(default)] pub id: Option<String>,
  pub name: String,
  pub latitude: f64,
  pub longitude: f64,
  #[serde(default)] pub closest_city: Option<String>,
  #[serde(default)] pub length_km: Option<f64>,
  #[serde(default)] pub history: Option<String>,
  #[serde(default)] pub checkpoints: Vec<CheckpointCfg>,
  #[serde(default)] pub gpx_points: Vec<GeoPoint>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CheckpointCfg {
  pub title: String,
  pub lat: f64,
  pub lon: f64,
  pub quiz: Quiz,
  #[serde(default)] pub challenge: Option<Challenge>,
}

/// Attempt to load `TrailBankConfig` from TRAIL_CONFIG_PATH. On any parsing/IO
/// error, returns None.
pub fn load_trail_bank_from_env() -> Option<TrailBankConfig> {
  let path = std::env::var("TRAIL_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<TrailBankConfig>(&s) {
      Ok(cfg) => {
        info!(target: "stridequest_backend", %path, trails = cfg.trails.len(), "Loaded trail bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "stridequest_backend", %path, error = %e, "Failed to parse TOML trail bank");
        None
      }
    },
    Err(e) => {
      error!(target: "stridequest_backend", %path, error = %e, "Failed to read TOML trail bank file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ChallengeKind;

  #[test]
  fn parses_a_bank_entry_with_quiz_and_challenge() {
    let toml_src = r#"
      [[trails]]
      name = "Harbor Walk"
      latitude = 32.0833
      longitude = 34.7667
      closest_city = "Tel Aviv"
      length_km = 4.2

      [[trails.checkpoints]]
      title = "Old Lighthouse"
      lat = 32.0850
      lon = 34.7700

      [trails.checkpoints.quiz]
      question = "When was the lighthouse built?"
      options = ["1865", "1935"]
      answer = "1935"

      [trails.checkpoints.challenge]
      type = "photo"
      prompt = "Snap the lighthouse from the pier."
      keyword = "lighthouse"
    "#;

    let cfg: TrailBankConfig = toml::from_str(toml_src).expect("parse");
    assert_eq!(cfg.trails.len(), 1);
    let t = &cfg.trails[0];
    assert!(t.id.is_none());
    assert_eq!(t.checkpoints.len(), 1);
    let cp = &t.checkpoints[0];
    assert!(cp.quiz.is_well_formed());
    let ch = cp.challenge.as_ref().expect("challenge");
    assert_eq!(ch.kind, ChallengeKind::Photo);
    assert_eq!(ch.keyword, "lighthouse");
  }

  #[test]
  fn empty_bank_parses_to_no_trails() {
    let cfg: TrailBankConfig = toml::from_str("").expect("parse");
    assert!(cfg.trails.is_empty());
  }
}
