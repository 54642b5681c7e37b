//! Minimal client for the external photo-validation service.
//!
//! The service receives a multipart upload (image + expected keyword) and
//! answers with `{valid, score}`. Calls are instrumented and log payload
//! sizes and latencies, never image contents.
//!
//! The verdict is advisory: session progression only requires that a
//! submission completed, not that it matched (see the engine).

use std::time::Duration;

use reqwest::header::USER_AGENT;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{instrument, info, error};

/// Verdict returned by the validator: did the photo match the keyword, and
/// how confident was the match (0..1)?
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PhotoVerdict {
  pub valid: bool,
  #[serde(default)]
  pub score: f32,
}

#[derive(Clone)]
pub struct PhotoValidator {
  pub client: reqwest::Client,
  pub base_url: String,
}

impl PhotoValidator {
  /// Construct the client if we find PHOTO_VALIDATOR_URL; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("PHOTO_VALIDATOR_URL").ok()?;
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
  }

  /// Upload a photo and the checkpoint keyword for validation.
  #[instrument(level = "info", skip(self, image), fields(image_len = image.len(), %keyword))]
  pub async fn validate(
    &self,
    image: Vec<u8>,
    mime: &str,
    keyword: &str,
  ) -> Result<PhotoVerdict, String> {
    let url = format!("{}/validate", self.base_url);
    let part = Part::bytes(image)
      .file_name("photo.jpg")
      .mime_str(mime)
      .map_err(|e| e.to_string())?;
    let form = Form::new()
      .part("image", part)
      .text("keyword", keyword.to_string());

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "stridequest-backend/0.1")
      .multipart(form)
      .send().await.map_err(|e| e.to_string())?;
    let elapsed = start.elapsed();

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_validator_error(&body).unwrap_or(body);
      error!(?elapsed, %status, "Photo validator returned an error");
      return Err(format!("Validator HTTP {}: {}", status, msg));
    }

    let verdict: PhotoVerdict = res.json().await.map_err(|e| e.to_string())?;
    info!(?elapsed, valid = verdict.valid, score = verdict.score, "Photo validator verdict received");
    Ok(verdict)
  }
}

/// Try to extract a clean error message from the validator error body.
fn extract_validator_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error),
    Err(_) => None,
  }
}
