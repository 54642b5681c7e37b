//! Checkpoint progression state machine for a hike session.
//!
//! Flow:
//! 1) `start_session` takes ownership of a trail and arms checkpoint 0.
//! 2) Position fixes are tested with `evaluate_proximity` (read-only); when a
//!    fix lands inside the capture radius the caller invokes
//!    `trigger_checkpoint`, which presents the quiz.
//! 3) `answer_quiz` scores the answer once and reports whether a photo gate
//!    applies; `resolve_photo` records that the photo step completed.
//! 4) `advance` moves to the next checkpoint, or finalizes the score when the
//!    last checkpoint is resolved.
//!
//! The engine performs no I/O: persistence of the final score and delivery of
//! position fixes are the caller's concern. One session is live at a time;
//! re-arming, re-triggering, and out-of-sequence calls are guarded here so
//! score accounting stays correct regardless of entry path (live fixes or the
//! dev-only skip).

use std::fmt;

use crate::domain::{Challenge, Checkpoint, PersistedScore, Trail};
use crate::geo;
use crate::util::unix_now_secs;

/// Caller-visible failures. None of these are retried internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineError {
  /// The trail cannot be hiked (empty checkpoint list).
  InvalidTrail,
  /// `answer_quiz`/`resolve_photo`/`advance`/`trigger_checkpoint` called out
  /// of sequence, or with no live session.
  NoActiveCheckpoint,
}

impl fmt::Display for EngineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EngineError::InvalidTrail => write!(f, "trail has no checkpoints"),
      EngineError::NoActiveCheckpoint => write!(f, "no checkpoint awaiting this action"),
    }
  }
}

/// Where the session stands relative to the current checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
  /// Watching position fixes for the current checkpoint.
  AwaitingProximity,
  /// Checkpoint reached, quiz on screen, not yet answered.
  AwaitingQuiz,
  /// Quiz answered, photo challenge not yet resolved.
  AwaitingPhoto,
  /// Quiz (and photo, if any) resolved; ready to advance.
  Resolved,
}

/// One traversal attempt of a trail. Owned exclusively by the engine.
pub struct HikeSession {
  trail: Trail,
  index: usize,
  total_questions: usize,
  correct_answers: usize,
  phase: Phase,
}

impl HikeSession {
  pub fn trail(&self) -> &Trail { &self.trail }
  pub fn index(&self) -> usize { self.index }
  pub fn total_questions(&self) -> usize { self.total_questions }
  pub fn correct_answers(&self) -> usize { self.correct_answers }

  fn current(&self) -> &Checkpoint {
    // index < checkpoints.len() whenever a session is live; advance() clears
    // the session before index can reach the length.
    &self.trail.checkpoints[self.index]
  }
}

/// Result of a read-only proximity test against the armed checkpoint.
#[derive(Clone, Copy, Debug)]
pub struct ProximityCheck {
  pub distance_km: f64,
  pub reached: bool,
}

/// Outcome of answering the current checkpoint's quiz.
#[derive(Clone, Debug)]
pub struct QuizOutcome {
  pub correct: bool,
  pub correct_answer: String,
  /// True when a photo challenge must be resolved before `advance`.
  pub photo_required: bool,
}

/// Outcome of `advance`: either the next checkpoint is armed, or the trail is
/// complete and the finalized score is handed to the caller for persistence.
pub enum Advance {
  Next { checkpoint: Checkpoint, index: usize, total: usize },
  Completed(PersistedScore),
}

/// The state machine itself. Starts idle; `start_session` arms checkpoint 0.
#[derive(Default)]
pub struct HikeEngine {
  session: Option<HikeSession>,
}

impl HikeEngine {
  pub fn new() -> Self {
    Self { session: None }
  }

  pub fn session(&self) -> Option<&HikeSession> {
    self.session.as_ref()
  }

  /// Begin a fresh session on `trail`. Resets all counters, arms checkpoint 0
  /// and returns it for display. Replaces any previous session.
  pub fn start_session(&mut self, trail: Trail) -> Result<&Checkpoint, EngineError> {
    if trail.checkpoints.is_empty() {
      return Err(EngineError::InvalidTrail);
    }
    let total_questions = trail
      .checkpoints
      .iter()
      .filter(|cp| cp.quiz.is_well_formed())
      .count();
    let session = self.session.insert(HikeSession {
      trail,
      index: 0,
      total_questions,
      correct_answers: 0,
      phase: Phase::AwaitingProximity,
    });
    Ok(session.current())
  }

  /// Test a position fix against the armed checkpoint. Read-only: the caller
  /// decides whether to follow up with `trigger_checkpoint`.
  ///
  /// Returns `None` while no checkpoint is armed (no session, or the current
  /// checkpoint is already reached and awaiting quiz/photo resolution), so
  /// stray fixes are ignored rather than re-triggering.
  pub fn evaluate_proximity(&self, lat: f64, lon: f64) -> Option<ProximityCheck> {
    let s = self.session.as_ref()?;
    if s.phase != Phase::AwaitingProximity {
      return None;
    }
    let cp = s.current();
    let distance_km = geo::haversine_km(lat, lon, cp.lat, cp.lon);
    Some(ProximityCheck { distance_km, reached: geo::within_capture_radius(distance_km) })
  }

  /// Mark the current checkpoint as reached and awaiting resolution.
  /// Idempotent: repeated triggers before `advance` return the same
  /// checkpoint and never double-count. The dev-only skip enters here too.
  pub fn trigger_checkpoint(&mut self) -> Result<&Checkpoint, EngineError> {
    let s = self.session.as_mut().ok_or(EngineError::NoActiveCheckpoint)?;
    if s.phase == Phase::AwaitingProximity {
      s.phase = Phase::AwaitingQuiz;
    }
    Ok(s.current())
  }

  /// Score the quiz answer for the reached checkpoint. Valid exactly once per
  /// checkpoint visit; the correct count grows only on an exact match against
  /// a well-formed quiz.
  pub fn answer_quiz(&mut self, selected: &str) -> Result<QuizOutcome, EngineError> {
    let s = self.session.as_mut().ok_or(EngineError::NoActiveCheckpoint)?;
    if s.phase != Phase::AwaitingQuiz {
      return Err(EngineError::NoActiveCheckpoint);
    }
    let cp = &s.trail.checkpoints[s.index];
    let correct = cp.quiz.is_well_formed() && selected == cp.quiz.answer;
    if correct {
      s.correct_answers += 1;
    }
    let photo_required = cp.challenge.is_some();
    let outcome = QuizOutcome {
      correct,
      correct_answer: cp.quiz.answer.clone(),
      photo_required,
    };
    s.phase = if photo_required { Phase::AwaitingPhoto } else { Phase::Resolved };
    Ok(outcome)
  }

  /// The challenge whose photo submission the session is parked on, if any.
  pub fn pending_photo(&self) -> Option<&Challenge> {
    let s = self.session.as_ref()?;
    if s.phase != Phase::AwaitingPhoto {
      return None;
    }
    s.current().challenge.as_ref()
  }

  /// Record that the photo step completed (a submission finished, or the dev
  /// bypass fired). The validator's verdict never gates progression; only the
  /// fact of resolution does.
  pub fn resolve_photo(&mut self) -> Result<(), EngineError> {
    let s = self.session.as_mut().ok_or(EngineError::NoActiveCheckpoint)?;
    if s.phase != Phase::AwaitingPhoto {
      return Err(EngineError::NoActiveCheckpoint);
    }
    s.phase = Phase::Resolved;
    Ok(())
  }

  /// Move past the resolved checkpoint. Arms the next one, or finalizes the
  /// session when the last checkpoint was just resolved. The index never
  /// regresses and never exceeds the checkpoint count.
  pub fn advance(&mut self) -> Result<Advance, EngineError> {
    let s = self.session.as_mut().ok_or(EngineError::NoActiveCheckpoint)?;
    if s.phase != Phase::Resolved {
      return Err(EngineError::NoActiveCheckpoint);
    }
    s.index += 1;
    if s.index == s.trail.checkpoints.len() {
      let percent = score_percent(s.correct_answers, s.total_questions);
      let score = PersistedScore {
        trail_id: s.trail.id.clone(),
        correct: s.correct_answers,
        total: s.total_questions,
        percent,
        completed_at_unix: unix_now_secs(),
      };
      self.session = None;
      return Ok(Advance::Completed(score));
    }
    s.phase = Phase::AwaitingProximity;
    Ok(Advance::Next {
      checkpoint: s.current().clone(),
      index: s.index,
      total: s.trail.checkpoints.len(),
    })
  }

  /// Drop all session state. Callable at any point; idempotent.
  pub fn end_session(&mut self) {
    self.session = None;
  }
}

fn score_percent(correct: usize, total: usize) -> u32 {
  if total == 0 {
    return 0;
  }
  ((correct as f64) * 100.0 / (total as f64)).round() as u32
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Challenge, ChallengeKind, Checkpoint, Quiz, Trail, TrailSource};

  fn quiz(question: &str, options: &[&str], answer: &str) -> Quiz {
    Quiz {
      question: question.into(),
      options: options.iter().map(|s| s.to_string()).collect(),
      answer: answer.into(),
    }
  }

  fn checkpoint(title: &str, lat: f64, lon: f64, q: Quiz) -> Checkpoint {
    Checkpoint { title: title.into(), lat, lon, quiz: q, challenge: None }
  }

  fn trail(checkpoints: Vec<Checkpoint>) -> Trail {
    Trail {
      id: "t-test".into(),
      name: "Test Loop".into(),
      source: TrailSource::Seed,
      latitude: 37.0,
      longitude: -122.0,
      closest_city: String::new(),
      length_km: None,
      history: String::new(),
      checkpoints,
      gpx_points: vec![],
    }
  }

  fn two_checkpoint_trail() -> Trail {
    trail(vec![
      checkpoint("Bridge", 37.0, -122.0, quiz("Year built?", &["1937", "1950"], "1937")),
      checkpoint("Summit", 37.1, -122.1, quiz("Peak name?", &["Tam", "Diablo"], "Tam")),
    ])
  }

  #[test]
  fn empty_trail_is_rejected() {
    let mut engine = HikeEngine::new();
    let err = engine.start_session(trail(vec![])).unwrap_err();
    assert_eq!(err, EngineError::InvalidTrail);
    assert!(engine.session().is_none());
  }

  #[test]
  fn full_hike_with_one_wrong_answer_scores_fifty() {
    let mut engine = HikeEngine::new();
    let first = engine.start_session(two_checkpoint_trail()).expect("session");
    assert_eq!(first.title, "Bridge");
    assert_eq!(engine.session().unwrap().total_questions(), 2);
    assert_eq!(engine.session().unwrap().correct_answers(), 0);

    engine.trigger_checkpoint().expect("trigger");
    let out = engine.answer_quiz("1937").expect("answer");
    assert!(out.correct && !out.photo_required);
    assert_eq!(engine.session().unwrap().correct_answers(), 1);

    match engine.advance().expect("advance") {
      Advance::Next { checkpoint, index, total } => {
        assert_eq!((checkpoint.title.as_str(), index, total), ("Summit", 1, 2));
      }
      Advance::Completed(_) => panic!("not complete yet"),
    }

    engine.trigger_checkpoint().expect("trigger");
    let out = engine.answer_quiz("Diablo").expect("answer");
    assert!(!out.correct);
    assert_eq!(engine.session().unwrap().correct_answers(), 1);

    match engine.advance().expect("advance") {
      Advance::Completed(score) => {
        assert_eq!(score.correct, 1);
        assert_eq!(score.total, 2);
        assert_eq!(score.percent, 50);
        assert_eq!(score.trail_id, "t-test");
      }
      Advance::Next { .. } => panic!("should be complete"),
    }
    assert!(engine.session().is_none());
  }

  #[test]
  fn trigger_is_idempotent_before_resolution() {
    let mut engine = HikeEngine::new();
    engine.start_session(two_checkpoint_trail()).expect("session");
    let first = engine.trigger_checkpoint().expect("trigger").title.clone();
    let second = engine.trigger_checkpoint().expect("trigger again").title.clone();
    assert_eq!(first, second);
    engine.answer_quiz("1937").expect("answer");
    // A late re-trigger must not reopen the quiz.
    engine.trigger_checkpoint().expect("late trigger");
    assert_eq!(engine.answer_quiz("1937").unwrap_err(), EngineError::NoActiveCheckpoint);
    assert_eq!(engine.session().unwrap().correct_answers(), 1);
  }

  #[test]
  fn out_of_sequence_calls_are_rejected() {
    let mut engine = HikeEngine::new();
    assert_eq!(engine.answer_quiz("x").unwrap_err(), EngineError::NoActiveCheckpoint);
    assert!(matches!(engine.advance(), Err(EngineError::NoActiveCheckpoint)));

    engine.start_session(two_checkpoint_trail()).expect("session");
    // Quiz not yet answered: advance is out of sequence.
    assert!(matches!(engine.advance(), Err(EngineError::NoActiveCheckpoint)));
    // Checkpoint not yet triggered: so is answering.
    assert_eq!(engine.answer_quiz("1937").unwrap_err(), EngineError::NoActiveCheckpoint);
  }

  #[test]
  fn proximity_is_read_only_and_ignored_once_triggered() {
    let mut engine = HikeEngine::new();
    engine.start_session(two_checkpoint_trail()).expect("session");

    let near = engine.evaluate_proximity(37.0001, -122.0).expect("armed");
    assert!(near.reached, "distance was {} km", near.distance_km);
    let far = engine.evaluate_proximity(37.5, -122.0).expect("armed");
    assert!(!far.reached);
    // Two evaluations changed nothing: the quiz still cannot be answered.
    assert_eq!(engine.answer_quiz("1937").unwrap_err(), EngineError::NoActiveCheckpoint);

    engine.trigger_checkpoint().expect("trigger");
    assert!(engine.evaluate_proximity(37.0001, -122.0).is_none());
  }

  #[test]
  fn photo_challenge_gates_advance_until_resolved() {
    let mut cp = checkpoint("Falls", 37.0, -122.0, quiz("Height?", &["30m", "60m"], "60m"));
    cp.challenge = Some(Challenge {
      kind: ChallengeKind::Photo,
      prompt: "Photograph the falls".into(),
      keyword: "waterfall".into(),
    });
    let mut engine = HikeEngine::new();
    engine.start_session(trail(vec![cp])).expect("session");
    engine.trigger_checkpoint().expect("trigger");

    let out = engine.answer_quiz("60m").expect("answer");
    assert!(out.photo_required);
    assert!(matches!(engine.advance(), Err(EngineError::NoActiveCheckpoint)));

    engine.resolve_photo().expect("resolve");
    assert!(matches!(engine.resolve_photo(), Err(EngineError::NoActiveCheckpoint)));
    match engine.advance().expect("advance") {
      Advance::Completed(score) => assert_eq!(score.percent, 100),
      Advance::Next { .. } => panic!("single checkpoint trail"),
    }
  }

  #[test]
  fn malformed_quiz_is_traversed_but_never_scores() {
    // Answer is not among the options: no score opportunity, no division error.
    let t = trail(vec![checkpoint("Gate", 37.0, -122.0, quiz("Color?", &["red", "blue"], "green"))]);
    let mut engine = HikeEngine::new();
    engine.start_session(t).expect("session");
    assert_eq!(engine.session().unwrap().total_questions(), 0);

    engine.trigger_checkpoint().expect("trigger");
    let out = engine.answer_quiz("green").expect("answer");
    assert!(!out.correct, "malformed quiz must not count a correct answer");

    match engine.advance().expect("advance") {
      Advance::Completed(score) => {
        assert_eq!((score.correct, score.total, score.percent), (0, 0, 0));
      }
      Advance::Next { .. } => panic!("single checkpoint trail"),
    }
  }

  #[test]
  fn dev_skip_path_keeps_accounting_identical() {
    // Skip goes through the same trigger/answer/advance sequence as live fixes.
    let mut engine = HikeEngine::new();
    engine.start_session(two_checkpoint_trail()).expect("session");
    for answer in ["1937", "Tam"] {
      engine.trigger_checkpoint().expect("skip-trigger");
      engine.answer_quiz(answer).expect("answer");
      let _ = engine.advance().expect("advance");
    }
    assert!(engine.session().is_none());
  }

  #[test]
  fn end_session_is_idempotent_and_resets_counters() {
    let mut engine = HikeEngine::new();
    engine.start_session(two_checkpoint_trail()).expect("session");
    engine.trigger_checkpoint().expect("trigger");
    engine.answer_quiz("1937").expect("answer");
    engine.end_session();
    engine.end_session();
    assert!(engine.session().is_none());

    // A fresh session starts from zero.
    engine.start_session(two_checkpoint_trail()).expect("session");
    let s = engine.session().unwrap();
    assert_eq!((s.index(), s.correct_answers()), (0, 0));
  }

  #[test]
  fn percent_rounds_half_up() {
    assert_eq!(score_percent(1, 3), 33);
    assert_eq!(score_percent(2, 3), 67);
    assert_eq!(score_percent(1, 2), 50);
    assert_eq!(score_percent(0, 0), 0);
  }
}
