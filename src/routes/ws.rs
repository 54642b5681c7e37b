//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the hike engine owned by the connection. We reply with at most
//! one JSON message per request; position fixes that arrive while no
//! checkpoint is armed are ignored.
//!
//! The connection is the session lifecycle: a disconnect ends the hike and
//! stops fix delivery, and a new `start_hike` replaces any previous session.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{info, error, instrument, debug};

use crate::engine::{Advance, HikeEngine};
use crate::logic;
use crate::protocol::{to_checkpoint_out, to_trail_out, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::util::{round_to, trunc_for_log};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "stridequest_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "stridequest_backend", "WebSocket connected");
  let mut engine = HikeEngine::new();
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response. Payloads can carry base64
        // photos, so only a truncated prefix is logged.
        debug!(target = "stridequest_backend", "WS received: {}", trunc_for_log(&txt, 256));
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => handle_client_ws(incoming, &state, &mut engine).await,
          Err(e) => Some(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }),
        };

        let Some(reply_msg) = reply_msg else { continue };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "stridequest_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  engine.end_session();
  info!(target: "stridequest_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(msg, state, engine))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  engine: &mut HikeEngine,
) -> Option<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => Some(ServerWsMessage::Pong),

    ClientWsMessage::StartHike { trail_id } => {
      let Some(trail) = state.get_trail(&trail_id).await else {
        return Some(ServerWsMessage::Error { message: format!("Unknown trailId: {}", trail_id) });
      };
      if let Err(e) = engine.start_session(trail) {
        return Some(ServerWsMessage::Error { message: e.to_string() });
      }
      let s = engine.session()?;
      tracing::info!(target: "hike", %trail_id, checkpoints = s.trail().checkpoints.len(), "WS hike started");
      Some(ServerWsMessage::HikeStarted {
        trail: to_trail_out(s.trail()),
        checkpoint: to_checkpoint_out(&s.trail().checkpoints[0]),
        total_checkpoints: s.trail().checkpoints.len(),
        total_questions: s.total_questions(),
      })
    }

    ClientWsMessage::PositionFix { latitude, longitude, accuracy, timestamp } => {
      let Some(check) = engine.evaluate_proximity(latitude, longitude) else {
        // No checkpoint armed: stray fix, nothing to report.
        debug!(target: "hike", ?accuracy, ?timestamp, "Position fix ignored (no armed checkpoint)");
        return None;
      };
      if check.reached {
        match engine.trigger_checkpoint() {
          Ok(cp) => {
            tracing::info!(target: "hike", checkpoint = %cp.title, distance_km = check.distance_km, "WS checkpoint reached");
            Some(ServerWsMessage::CheckpointReached { checkpoint: to_checkpoint_out(cp) })
          }
          Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
        }
      } else {
        Some(ServerWsMessage::Position {
          distance_km: round_to(check.distance_km, 3),
          reached: false,
        })
      }
    }

    ClientWsMessage::SkipCheckpoint => match engine.trigger_checkpoint() {
      Ok(cp) => {
        tracing::info!(target: "hike", checkpoint = %cp.title, "WS dev skip to checkpoint");
        Some(ServerWsMessage::CheckpointReached { checkpoint: to_checkpoint_out(cp) })
      }
      Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
    },

    ClientWsMessage::AnswerQuiz { option } => match engine.answer_quiz(&option) {
      Ok(outcome) => {
        tracing::info!(target: "hike", correct = outcome.correct, photo_required = outcome.photo_required, "WS quiz answered");
        Some(ServerWsMessage::QuizResult {
          correct: outcome.correct,
          correct_answer: outcome.correct_answer,
          photo_required: outcome.photo_required,
        })
      }
      Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
    },

    ClientWsMessage::SubmitPhoto { photo_base64, mime } => {
      let Some(challenge) = engine.pending_photo() else {
        return Some(ServerWsMessage::Error { message: "No photo challenge awaiting submission".into() });
      };
      let keyword = challenge.keyword.clone();
      let image = match BASE64.decode(photo_base64.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => return Some(ServerWsMessage::Error { message: format!("Invalid photoBase64: {}", e) }),
      };
      // The submission resolves the gate once the validation call finishes;
      // the verdict itself never blocks progression.
      let verdict = logic::validate_photo(state, image, &mime, &keyword).await;
      if let Err(e) = engine.resolve_photo() {
        return Some(ServerWsMessage::Error { message: e.to_string() });
      }
      let message = if verdict.valid {
        "Photo accepted.".to_string()
      } else {
        "Photo did not match; you can still continue.".to_string()
      };
      Some(ServerWsMessage::PhotoResult { valid: verdict.valid, score: verdict.score, message })
    }

    ClientWsMessage::SkipPhoto => match engine.resolve_photo() {
      Ok(()) => {
        tracing::info!(target: "hike", "WS dev skip of photo gate");
        Some(ServerWsMessage::PhotoResult {
          valid: false,
          score: 0.0,
          message: "Photo check skipped.".into(),
        })
      }
      Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
    },

    ClientWsMessage::Advance => match engine.advance() {
      Ok(Advance::Next { checkpoint, index, total }) => {
        tracing::info!(target: "hike", %index, %total, checkpoint = %checkpoint.title, "WS advanced to next checkpoint");
        Some(ServerWsMessage::NextCheckpoint { checkpoint: to_checkpoint_out(&checkpoint), index, total })
      }
      Ok(Advance::Completed(score)) => {
        logic::record_completion(state, score.clone()).await;
        Some(ServerWsMessage::HikeComplete { score })
      }
      Err(e) => Some(ServerWsMessage::Error { message: e.to_string() }),
    },

    ClientWsMessage::EndHike => {
      engine.end_session();
      Some(ServerWsMessage::HikeEnded)
    }
  }
}
