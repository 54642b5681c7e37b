//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Multipart, Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::logic::{self, DEFAULT_NEARBY_RADIUS_KM};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(lat = body.latitude, lon = body.longitude))]
pub async fn http_post_nearby(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NearbyIn>,
) -> impl IntoResponse {
  let radius_km = body.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
  let trails = logic::find_nearby(&state, body.latitude, body.longitude, radius_km).await;
  info!(target: "hike", found = trails.len(), %radius_km, "HTTP nearby served");
  Json(trails)
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_trail(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Response {
  match state.get_trail(&id).await {
    Some(t) => Json(to_trail_out(&t)).into_response(),
    None => (
      StatusCode::NOT_FOUND,
      Json(ErrorOut { error: "Trail not found".into() }),
    )
      .into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.trail_id, body.checkpoint_index))]
pub async fn http_post_position_check(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PositionCheckIn>,
) -> Response {
  match logic::check_position(&state, &body.trail_id, body.checkpoint_index, body.latitude, body.longitude).await {
    Ok(out) => {
      info!(target: "hike", trail_id = %body.trail_id, reached = out.reached, distance_km = out.distance_km, "HTTP position check");
      Json(out).into_response()
    }
    Err(e) => (StatusCode::BAD_REQUEST, Json(ErrorOut { error: e })).into_response(),
  }
}

/// Multipart upload: `image` (the photo) + `keyword` (the expected subject).
#[instrument(level = "info", skip(state, multipart))]
pub async fn http_post_validate_photo(
  State(state): State<Arc<AppState>>,
  mut multipart: Multipart,
) -> Response {
  let mut image: Option<(Vec<u8>, String)> = None;
  let mut keyword: Option<String> = None;

  loop {
    let field = match multipart.next_field().await {
      Ok(Some(f)) => f,
      Ok(None) => break,
      Err(e) => {
        return (StatusCode::BAD_REQUEST, Json(ErrorOut { error: format!("Invalid multipart body: {}", e) }))
          .into_response()
      }
    };
    let name = field.name().map(str::to_string);
    match name.as_deref() {
      Some("image") => {
        let mime = field.content_type().unwrap_or("image/jpeg").to_string();
        match field.bytes().await {
          Ok(bytes) => image = Some((bytes.to_vec(), mime)),
          Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorOut { error: format!("Failed to read image: {}", e) }))
              .into_response()
          }
        }
      }
      Some("keyword") => match field.text().await {
        Ok(text) => keyword = Some(text),
        Err(e) => {
          return (StatusCode::BAD_REQUEST, Json(ErrorOut { error: format!("Failed to read keyword: {}", e) }))
            .into_response()
        }
      },
      _ => {}
    }
  }

  let (Some((image, mime)), Some(keyword)) = (image, keyword) else {
    return (
      StatusCode::BAD_REQUEST,
      Json(ErrorOut { error: "Both 'image' and 'keyword' fields are required".into() }),
    )
      .into_response();
  };

  let verdict = logic::validate_photo(&state, image, &mime, &keyword).await;
  info!(target: "hike", %keyword, valid = verdict.valid, score = verdict.score, "HTTP photo validated");
  Json(PhotoVerdictOut { valid: verdict.valid, score: verdict.score }).into_response()
}

#[instrument(level = "info", skip(state), fields(%trail_id))]
pub async fn http_get_score(
  State(state): State<Arc<AppState>>,
  Path(trail_id): Path<String>,
) -> impl IntoResponse {
  let score = state.get_score(&trail_id).await;
  Json(ScoreQueryOut { trail_id, score })
}
