//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::State, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_topics() -> impl IntoResponse {
  Json(TopicsOut { topics: CURATED_TOPICS.to_vec() })
}

#[instrument(level = "info")]
pub async fn http_get_difficulties() -> impl IntoResponse {
  Json(difficulty_catalog())
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, difficulty = ?body.difficulty))]
pub async fn http_post_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuizIn>,
) -> impl IntoResponse {
  Json(do_generate_quiz(&state, &body.topic, body.difficulty.as_deref()).await)
}

#[instrument(level = "info", skip(state, body), fields(score = body.score, total = body.total, topic = %body.topic))]
pub async fn http_post_feedback(
  State(state): State<Arc<AppState>>,
  Json(body): Json<FeedbackIn>,
) -> impl IntoResponse {
  let text = do_feedback(&state, body.score, body.total, &body.topic, body.difficulty.as_deref()).await;
  Json(FeedbackOut { text })
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let cleared = do_clear_cache(&state).await;
  Json(CacheClearedOut { cleared })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_ai_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let ok = state.check_connection().await;
  let backend = state.backend_name().to_string();
  info!(target: "quizgen_backend", %backend, %ok, "AI health checked");
  Json(AiHealthOut { backend, ok })
}
