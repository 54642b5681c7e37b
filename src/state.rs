//! Application state: in-memory stores and the photo-validator client.
//!
//! This module owns:
//!   - the trail store (by id), filled from the TOML bank and built-in seeds
//!   - the score store (by trail id), optionally mirrored to a JSON file
//!   - the optional photo-validator client
//!
//! Trails from the config bank win over seeds with the same id. Scores are
//! overwritten on every completion of the same trail.

use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::config::{load_trail_bank_from_env, TrailCfg};
use crate::domain::{Checkpoint, PersistedScore, Trail, TrailSource};
use crate::seeds::seed_trails;
use crate::validator::PhotoValidator;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub trails: Arc<RwLock<HashMap<String, Trail>>>,
    pub scores: Arc<RwLock<HashMap<String, PersistedScore>>>,
    scores_path: Option<PathBuf>,
    pub validator: Option<PhotoValidator>,
}

impl AppState {
    /// Build state from env: load the trail bank, seed trails, restore scores,
    /// init the validator client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let mut trail_map = HashMap::<String, Trail>::new();

        // Insert config-based trails (if any).
        if let Some(cfg) = load_trail_bank_from_env() {
            for tc in cfg.trails {
                match bank_trail(tc) {
                    Some(trail) => {
                        trail_map.insert(trail.id.clone(), trail);
                    }
                    None => continue,
                }
            }
        }

        // Always insert built-in seeds, but don't overwrite existing ids.
        for t in seed_trails() {
            trail_map.entry(t.id.clone()).or_insert(t);
        }

        // Inventory summary by source.
        let mut count_by_source: HashMap<TrailSource, usize> = HashMap::new();
        for t in trail_map.values() {
            *count_by_source.entry(t.source.clone()).or_insert(0) += 1;
        }
        for (source, count) in count_by_source {
            info!(target: "hike", ?source, count, "Startup trail inventory");
        }

        // Restore persisted scores if a mirror file is configured.
        let scores_path = std::env::var("SCORES_PATH").ok().map(PathBuf::from);
        let scores = scores_path
            .as_deref()
            .map(load_scores_file)
            .unwrap_or_default();

        // Build optional validator client (if base URL present).
        let validator = PhotoValidator::from_env();
        if let Some(v) = &validator {
            info!(target: "stridequest_backend", base_url = %v.base_url, "Photo validator enabled.");
        } else {
            info!(target: "stridequest_backend", "Photo validator disabled (no PHOTO_VALIDATOR_URL). Using local check.");
        }

        Self {
            trails: Arc::new(RwLock::new(trail_map)),
            scores: Arc::new(RwLock::new(scores)),
            scores_path,
            validator,
        }
    }

    /// Read-only access to a trail by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_trail(&self, id: &str) -> Option<Trail> {
        let trails = self.trails.read().await;
        trails.get(id).cloned()
    }

    /// Snapshot of every known trail, for nearby lookups.
    pub async fn all_trails(&self) -> Vec<Trail> {
        self.trails.read().await.values().cloned().collect()
    }

    /// Last persisted score for a trail, if it was ever completed.
    #[instrument(level = "debug", skip(self), fields(%trail_id))]
    pub async fn get_score(&self, trail_id: &str) -> Option<PersistedScore> {
        self.scores.read().await.get(trail_id).cloned()
    }

    /// Overwrite the score for a trail and mirror the store to disk when a
    /// mirror file is configured.
    #[instrument(level = "info", skip(self, score), fields(trail_id = %score.trail_id, percent = score.percent))]
    pub async fn record_score(&self, score: PersistedScore) {
        // Snapshot under the lock; the file write happens outside it.
        let snapshot = {
            let mut scores = self.scores.write().await;
            scores.insert(score.trail_id.clone(), score);
            self.scores_path.as_ref().map(|_| scores.clone())
        };
        if let (Some(path), Some(scores)) = (self.scores_path.as_deref(), snapshot) {
            match serde_json::to_string_pretty(&scores) {
                Ok(json) => {
                    if let Err(e) = std::fs::write(path, json) {
                        error!(target: "stridequest_backend", path = %path.display(), error = %e, "Failed to write scores file");
                    }
                }
                Err(e) => {
                    error!(target: "stridequest_backend", error = %e, "Failed to serialize scores");
                }
            }
        }
    }
}

/// Convert a bank entry into a domain trail, or reject it with a log.
fn bank_trail(tc: TrailCfg) -> Option<Trail> {
    let id = tc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    if tc.checkpoints.is_empty() {
        // A trail without checkpoints can never be hiked; same rule the
        // engine applies at session start.
        error!(target: "hike", %id, name = %tc.name, "Skipping bank trail: no checkpoints.");
        return None;
    }
    let checkpoints = tc
        .checkpoints
        .into_iter()
        .map(|c| Checkpoint { title: c.title, lat: c.lat, lon: c.lon, quiz: c.quiz, challenge: c.challenge })
        .collect::<Vec<_>>();
    for cp in &checkpoints {
        if !cp.quiz.is_well_formed() {
            warn!(target: "hike", %id, checkpoint = %cp.title, "Bank checkpoint quiz is malformed; it will not count toward scores.");
        }
    }
    Some(Trail {
        id,
        name: tc.name,
        source: TrailSource::LocalBank,
        latitude: tc.latitude,
        longitude: tc.longitude,
        closest_city: tc.closest_city.unwrap_or_default(),
        length_km: tc.length_km,
        history: tc.history.unwrap_or_default(),
        checkpoints,
        gpx_points: tc.gpx_points,
    })
}

fn load_scores_file(path: &std::path::Path) -> HashMap<String, PersistedScore> {
    match std::fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<HashMap<String, PersistedScore>>(&s) {
            Ok(scores) => {
                info!(target: "stridequest_backend", path = %path.display(), count = scores.len(), "Restored persisted scores");
                scores
            }
            Err(e) => {
                error!(target: "stridequest_backend", path = %path.display(), error = %e, "Failed to parse scores file; starting empty");
                HashMap::new()
            }
        },
        // A missing file is normal on first run.
        Err(_) => HashMap::new(),
    }
}
