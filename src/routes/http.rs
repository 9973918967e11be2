//! HTTP endpoint handlers. These are thin wrappers that forward to core
//! logic and the state's storage-or-memory stores.
//!
//! The caller's bearer token (if any) is forwarded verbatim to the storage
//! collaborator; row-level security lives there. Storage failures come
//! back as 502 with a JSON message.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::{header::AUTHORIZATION, HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Activity, Barrier, LearningStyle, Student};
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorOut>);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
  headers
    .get(AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::to_string)
}

fn storage_error(message: String) -> ApiError {
  (StatusCode::BAD_GATEWAY, Json(ErrorOut { message }))
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

// --- Reference data ---

#[instrument(level = "info", skip_all)]
pub async fn http_list_barriers(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Barrier>>, ApiError> {
  let token = bearer_token(&headers);
  state.list_barriers(token.as_deref()).await.map(Json).map_err(storage_error)
}

#[instrument(level = "info", skip_all, fields(name = %body.name))]
pub async fn http_create_barrier(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateBarrierIn>,
) -> Result<Json<Barrier>, ApiError> {
  let token = bearer_token(&headers);
  let b = Barrier {
    id: Uuid::new_v4().to_string(),
    name: body.name,
    description: body.description,
  };
  state.add_barrier(token.as_deref(), b).await.map(Json).map_err(storage_error)
}

#[instrument(level = "info", skip_all)]
pub async fn http_list_learning_styles(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<LearningStyle>>, ApiError> {
  let token = bearer_token(&headers);
  state.list_learning_styles(token.as_deref()).await.map(Json).map_err(storage_error)
}

#[instrument(level = "info", skip_all, fields(name = %body.name))]
pub async fn http_create_learning_style(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateLearningStyleIn>,
) -> Result<Json<LearningStyle>, ApiError> {
  let token = bearer_token(&headers);
  let s = LearningStyle {
    id: Uuid::new_v4().to_string(),
    name: body.name,
    description: body.description,
    color: body.color,
  };
  state.add_learning_style(token.as_deref(), s).await.map(Json).map_err(storage_error)
}

#[instrument(level = "info", skip_all)]
pub async fn http_list_students(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<Student>>, ApiError> {
  let token = bearer_token(&headers);
  state.list_students(token.as_deref()).await.map(Json).map_err(storage_error)
}

#[instrument(level = "info", skip_all, fields(name = %body.name))]
pub async fn http_create_student(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateStudentIn>,
) -> Result<Json<Student>, ApiError> {
  let token = bearer_token(&headers);
  let s = Student {
    id: Uuid::new_v4().to_string(),
    name: body.name,
    notes: body.notes,
  };
  state.add_student(token.as_deref(), s).await.map(Json).map_err(storage_error)
}

// --- Activities ---

#[instrument(level = "info", skip_all)]
pub async fn http_list_activities(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<ActivityOut>>, ApiError> {
  let token = bearer_token(&headers);
  let acts = state.list_activities(token.as_deref()).await.map_err(storage_error)?;
  Ok(Json(acts.iter().map(activity_to_out).collect()))
}

#[instrument(level = "info", skip_all, fields(name = %body.name))]
pub async fn http_create_activity(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateActivityIn>,
) -> Result<Json<ActivityOut>, ApiError> {
  let token = bearer_token(&headers);
  let a = Activity {
    id: Uuid::new_v4().to_string(),
    name: body.name,
    objective: body.objective,
    materials: body.materials,
    development: body.development,
    barrier_ids: body.barrier_ids.into_iter().collect(),
    learning_style_ids: body.learning_style_ids.into_iter().collect(),
  };
  let a = state.add_activity(token.as_deref(), a).await.map_err(storage_error)?;
  info!(target: "activity", id = %a.id, "Activity created");
  Ok(Json(activity_to_out(&a)))
}

#[instrument(level = "info", skip_all)]
pub async fn http_generate_activity(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<GenerateActivityIn>,
) -> impl IntoResponse {
  let token = bearer_token(&headers);
  let (activity, raw_text, origin) = logic::generate_activity(&state, token.as_deref(), &body).await;
  info!(target: "activity", %origin, name = %activity.name, "HTTP activity generation served");
  Json(GenerateActivityOut { activity, raw_text, origin: origin.to_string() })
}

// --- Wizard ---

#[instrument(level = "info", skip_all, fields(barrier = %body.barrier_id, styles = body.learning_style_ids.len()))]
pub async fn http_wizard_filter(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<WizardFilterIn>,
) -> Result<Json<WizardFilterOut>, ApiError> {
  let token = bearer_token(&headers);
  logic::wizard_candidates(&state, token.as_deref(), &body.barrier_id, &body.learning_style_ids)
    .await
    .map(Json)
    .map_err(storage_error)
}

// --- Interventions ---

#[instrument(level = "info", skip_all)]
pub async fn http_list_interventions(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> Result<Json<Vec<InterventionOut>>, ApiError> {
  let token = bearer_token(&headers);
  let items = state.list_interventions(token.as_deref()).await.map_err(storage_error)?;
  Ok(Json(items.iter().map(intervention_to_out).collect()))
}

#[instrument(level = "info", skip_all, fields(activity = %body.activity_id, student = %body.student_id))]
pub async fn http_create_intervention(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<CreateInterventionIn>,
) -> Result<Json<CreateInterventionOut>, ApiError> {
  let token = bearer_token(&headers);
  let (iv, comment) = logic::create_intervention(&state, token.as_deref(), body)
    .await
    .map_err(storage_error)?;
  Ok(Json(CreateInterventionOut {
    intervention: intervention_to_out(&iv),
    initial_comment: comment.as_ref().map(comment_to_out),
  }))
}

#[instrument(level = "info", skip_all, fields(%intervention_id))]
pub async fn http_list_comments(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(intervention_id): Path<String>,
) -> Result<Json<Vec<CommentOut>>, ApiError> {
  let token = bearer_token(&headers);
  let items = state
    .list_comments(token.as_deref(), &intervention_id)
    .await
    .map_err(storage_error)?;
  Ok(Json(items.iter().map(comment_to_out).collect()))
}

#[instrument(level = "info", skip_all, fields(%intervention_id))]
pub async fn http_create_comment(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Path(intervention_id): Path<String>,
  Json(body): Json<CreateCommentIn>,
) -> Result<Json<CommentOut>, ApiError> {
  let token = bearer_token(&headers);
  let c = logic::add_comment(&state, token.as_deref(), &intervention_id, body)
    .await
    .map_err(storage_error)?;
  Ok(Json(comment_to_out(&c)))
}
