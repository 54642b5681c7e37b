//! Seed data: built-in trails that keep the app useful without any config.

use crate::domain::{
  Challenge, ChallengeKind, Checkpoint, GeoPoint, Quiz, Trail, TrailSource,
};

/// Minimal set of built-in trails. Ids are stable so persisted scores keep
/// pointing at the same trail across restarts.
pub fn seed_trails() -> Vec<Trail> {
  vec![
    Trail {
      id: "t101".into(),
      name: "Golden Gate Loop".into(),
      source: TrailSource::Seed,
      latitude: 37.8199,
      longitude: -122.4783,
      closest_city: "San Francisco".into(),
      length_km: Some(5.6),
      history: "A short loop past the bridge overlooks, built along the old coastal battery road.".into(),
      checkpoints: vec![
        Checkpoint {
          title: "Bridge Vista Point".into(),
          lat: 37.8324,
          lon: -122.4795,
          quiz: Quiz {
            question: "In what year did the Golden Gate Bridge open?".into(),
            options: vec!["1933".into(), "1937".into(), "1941".into()],
            answer: "1937".into(),
          },
          challenge: Some(Challenge {
            kind: ChallengeKind::Photo,
            prompt: "Take a photo with the bridge towers in frame.".into(),
            keyword: "bridge".into(),
          }),
        },
        Checkpoint {
          title: "Battery East".into(),
          lat: 37.8290,
          lon: -122.4770,
          quiz: Quiz {
            question: "What were the batteries along this ridge built to defend?".into(),
            options: vec!["The harbor".into(), "The railway".into(), "The presidio stables".into()],
            answer: "The harbor".into(),
          },
          challenge: None,
        },
      ],
      gpx_points: vec![
        GeoPoint { lat: 37.8199, lon: -122.4783 },
        GeoPoint { lat: 37.8290, lon: -122.4770 },
        GeoPoint { lat: 37.8324, lon: -122.4795 },
      ],
    },
    Trail {
      id: "t102".into(),
      name: "Central Park Explorer".into(),
      source: TrailSource::Seed,
      latitude: 40.7812,
      longitude: -73.9665,
      closest_city: "New York".into(),
      length_km: Some(3.8),
      history: "From the lake to Belvedere Castle, tracing the park's 19th-century promenades.".into(),
      checkpoints: vec![
        Checkpoint {
          title: "Bow Bridge".into(),
          lat: 40.7756,
          lon: -73.9719,
          quiz: Quiz {
            question: "What material is Bow Bridge made of?".into(),
            options: vec!["Cast iron".into(), "Granite".into(), "Timber".into()],
            answer: "Cast iron".into(),
          },
          challenge: None,
        },
        Checkpoint {
          title: "Belvedere Castle".into(),
          lat: 40.7794,
          lon: -73.9692,
          quiz: Quiz {
            question: "What does \"Belvedere\" mean in Italian?".into(),
            options: vec!["Beautiful view".into(), "High tower".into(), "Stone fort".into()],
            answer: "Beautiful view".into(),
          },
          challenge: Some(Challenge {
            kind: ChallengeKind::Photo,
            prompt: "Photograph the castle facade from the terrace.".into(),
            keyword: "castle".into(),
          }),
        },
      ],
      gpx_points: vec![
        GeoPoint { lat: 40.7812, lon: -73.9665 },
        GeoPoint { lat: 40.7756, lon: -73.9719 },
        GeoPoint { lat: 40.7794, lon: -73.9692 },
      ],
    },
  ]
}
