//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Quiz answers and challenge keywords are internal: the public checkpoint
//! DTO omits them, and the correct answer is only revealed in `QuizResult`.

use serde::{Deserialize, Serialize};

use crate::domain::{Challenge, ChallengeKind, Checkpoint, GeoPoint, PersistedScore, Trail, TrailSource};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartHike {
        #[serde(rename = "trailId")]
        trail_id: String,
    },
    PositionFix {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        accuracy: Option<f64>,
        #[serde(default)]
        timestamp: Option<u64>,
    },
    /// Dev-only bypass of proximity detection.
    SkipCheckpoint,
    AnswerQuiz {
        option: String,
    },
    SubmitPhoto {
        #[serde(rename = "photoBase64")]
        photo_base64: String,
        mime: String,
    },
    /// Dev-only bypass of the photo gate.
    SkipPhoto,
    Advance,
    EndHike,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    HikeStarted {
        trail: TrailOut,
        checkpoint: CheckpointOut,
        total_checkpoints: usize,
        total_questions: usize,
    },
    /// A position fix was evaluated against the armed checkpoint.
    Position {
        distance_km: f64,
        reached: bool,
    },
    CheckpointReached {
        checkpoint: CheckpointOut,
    },
    QuizResult {
        correct: bool,
        correct_answer: String,
        photo_required: bool,
    },
    PhotoResult {
        valid: bool,
        score: f32,
        message: String,
    },
    NextCheckpoint {
        checkpoint: CheckpointOut,
        index: usize,
        total: usize,
    },
    HikeComplete {
        score: PersistedScore,
    },
    HikeEnded,
    Error {
        message: String,
    },
}

/// Public quiz DTO: the expected answer stays server-side.
#[derive(Debug, Serialize)]
pub struct QuizOut {
    pub question: String,
    pub options: Vec<String>,
}

/// Public challenge DTO: the validation keyword stays server-side.
#[derive(Debug, Serialize)]
pub struct ChallengeOut {
    #[serde(rename = "type")]
    pub kind: ChallengeKind,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct CheckpointOut {
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    pub quiz: QuizOut,
    pub challenge: Option<ChallengeOut>,
}

/// Full trail DTO used by both WS and HTTP for trail delivery.
#[derive(Debug, Serialize)]
pub struct TrailOut {
    pub id: String,
    pub name: String,
    pub source: TrailSource,
    pub latitude: f64,
    pub longitude: f64,
    pub closest_city: String,
    pub length_km: Option<f64>,
    pub history: String,
    pub checkpoints: Vec<CheckpointOut>,
    pub gpx_points: Vec<GeoPoint>,
}

/// Compact trail DTO for nearby listings, with the distance to the caller.
#[derive(Debug, Serialize)]
pub struct TrailSummaryOut {
    pub id: String,
    pub name: String,
    pub closest_city: String,
    pub length_km: Option<f64>,
    pub history: String,
    pub distance_km: f64,
}

/// Convert full `Checkpoint` (internal) to the public DTO.
pub fn to_checkpoint_out(cp: &Checkpoint) -> CheckpointOut {
    CheckpointOut {
        title: cp.title.clone(),
        lat: cp.lat,
        lon: cp.lon,
        quiz: QuizOut {
            question: cp.quiz.question.clone(),
            options: cp.quiz.options.clone(),
        },
        challenge: cp.challenge.as_ref().map(to_challenge_out),
    }
}

fn to_challenge_out(ch: &Challenge) -> ChallengeOut {
    ChallengeOut { kind: ch.kind.clone(), prompt: ch.prompt.clone() }
}

/// Convert full `Trail` (internal) to the public DTO.
pub fn to_trail_out(t: &Trail) -> TrailOut {
    TrailOut {
        id: t.id.clone(),
        name: t.name.clone(),
        source: t.source.clone(),
        latitude: t.latitude,
        longitude: t.longitude,
        closest_city: t.closest_city.clone(),
        length_km: t.length_km,
        history: t.history.clone(),
        checkpoints: t.checkpoints.iter().map(to_checkpoint_out).collect(),
        gpx_points: t.gpx_points.clone(),
    }
}

pub fn to_summary_out(t: &Trail, distance_km: f64) -> TrailSummaryOut {
    TrailSummaryOut {
        id: t.id.clone(),
        name: t.name.clone(),
        closest_city: t.closest_city.clone(),
        length_km: t.length_km,
        history: t.history.clone(),
        distance_km,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct NearbyIn {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PositionCheckIn {
    pub trail_id: String,
    pub checkpoint_index: usize,
    pub latitude: f64,
    pub longitude: f64,
}
#[derive(Serialize)]
pub struct PositionCheckOut {
    pub reached: bool,
    pub distance_km: f64,
}

#[derive(Serialize)]
pub struct PhotoVerdictOut {
    pub valid: bool,
    pub score: f32,
}

#[derive(Serialize)]
pub struct ScoreQueryOut {
    pub trail_id: String,
    pub score: Option<PersistedScore>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}
