//! Core behaviors shared by the HTTP handlers.
//!
//! This includes:
//!   - The generation pipeline (prompt -> completion -> parse). The parser
//!     is total, so the pipeline always produces a usable activity: when
//!     OpenAI is missing or fails we parse empty text and get the full
//!     fallback skeleton.
//!   - Wizard candidate computation (matcher + display-name resolution).
//!   - Intervention and comment creation.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::util::trunc_for_log;

use crate::domain::{GeneratedActivity, Intervention, InterventionComment};
use crate::matcher::{filter_activities, lookup_name};
use crate::parser;
use crate::protocol::{
  activity_to_out, CreateCommentIn, CreateInterventionIn, GenerateActivityIn, WizardFilterOut,
};
use crate::state::AppState;

pub const ORIGIN_OPENAI: &str = "openai_generated";
pub const ORIGIN_LOCAL: &str = "local_fallback";

/// Generate a structured activity for the selected barriers/styles.
/// Total end to end: collaborator failures degrade to the parser's
/// fallback skeleton instead of erroring.
#[instrument(level = "info", skip(state, token, req), fields(barriers = req.barrier_ids.len(), styles = req.learning_style_ids.len()))]
pub async fn generate_activity(
  state: &AppState,
  token: Option<&str>,
  req: &GenerateActivityIn,
) -> (GeneratedActivity, String, &'static str) {
  let barriers = match state.list_barriers(token).await {
    Ok(all) => all
      .into_iter()
      .filter(|b| req.barrier_ids.contains(&b.id))
      .collect::<Vec<_>>(),
    Err(e) => {
      error!(target: "activity", error = %e, "Barrier lookup failed; generating without barrier context");
      Vec::new()
    }
  };
  let styles = match state.list_learning_styles(token).await {
    Ok(all) => all
      .into_iter()
      .filter(|s| req.learning_style_ids.contains(&s.id))
      .collect::<Vec<_>>(),
    Err(e) => {
      error!(target: "activity", error = %e, "Style lookup failed; generating without style context");
      Vec::new()
    }
  };

  let student_history = match &req.student_id {
    Some(id) => match state.list_students(token).await {
      Ok(students) => students
        .iter()
        .find(|s| &s.id == id)
        .map(|s| s.notes.clone())
        .unwrap_or_default(),
      Err(e) => {
        error!(target: "activity", error = %e, "Student lookup failed; generating without history");
        String::new()
      }
    },
    None => String::new(),
  };

  if let Some(oa) = &state.openai {
    match oa
      .generate_activity_text(&state.prompts, &barriers, &styles, &student_history, &req.notes)
      .await
    {
      Ok(raw) => {
        debug!(target: "activity", preview = %trunc_for_log(&raw, 160), "Raw generation text");
        let activity = parser::parse(&raw);
        info!(target: "activity", name = %activity.name, steps = activity.development.steps.len(), "Generated activity parsed");
        return (activity, raw, ORIGIN_OPENAI);
      }
      Err(e) => {
        error!(target: "activity", error = %e, "OpenAI generation failed; using local fallback skeleton");
      }
    }
  } else {
    info!(target: "activity", "OpenAI disabled; using local fallback skeleton");
  }

  (parser::parse(""), String::new(), ORIGIN_LOCAL)
}

/// Candidate activities for the wizard's current selection, with display
/// names resolved. Activity listing errors surface to the caller; name
/// resolution degrades to the "Desconocido" sentinel instead of failing.
#[instrument(level = "info", skip(state, token), fields(%barrier_id, styles = learning_style_ids.len()))]
pub async fn wizard_candidates(
  state: &AppState,
  token: Option<&str>,
  barrier_id: &str,
  learning_style_ids: &[String],
) -> Result<WizardFilterOut, String> {
  let activities = state.list_activities(token).await?;

  let barriers = state.list_barriers(token).await.unwrap_or_else(|e| {
    error!(target: "wizard", error = %e, "Barrier names unavailable; using sentinel");
    Vec::new()
  });
  let styles = state.list_learning_styles(token).await.unwrap_or_else(|e| {
    error!(target: "wizard", error = %e, "Style names unavailable; using sentinel");
    Vec::new()
  });

  let selected: HashSet<String> = learning_style_ids.iter().cloned().collect();
  let hits = filter_activities(&activities, barrier_id, &selected);
  info!(target: "wizard", candidates = hits.len(), total = activities.len(), "Wizard filter evaluated");

  Ok(WizardFilterOut {
    barrier_name: lookup_name(barrier_id, &barriers),
    style_names: learning_style_ids
      .iter()
      .map(|id| lookup_name(id, &styles))
      .collect(),
    activities: hits.iter().map(|a| activity_to_out(a)).collect(),
  })
}

/// Record an intervention, plus its optional initial comment.
#[instrument(level = "info", skip(state, token, req), fields(activity = %req.activity_id, student = %req.student_id))]
pub async fn create_intervention(
  state: &AppState,
  token: Option<&str>,
  req: CreateInterventionIn,
) -> Result<(Intervention, Option<InterventionComment>), String> {
  let iv = Intervention {
    id: Uuid::new_v4().to_string(),
    activity_id: req.activity_id,
    student_id: req.student_id,
    barrier_ids: req.barrier_ids.into_iter().collect(),
    learning_style_ids: req.learning_style_ids.into_iter().collect(),
    date: req.date,
    observations: req.observations,
  };
  let iv = state.add_intervention(token, iv).await?;

  let comment = match req.initial_comment {
    Some(text) if !text.trim().is_empty() => Some(
      state
        .add_comment(token, new_comment(&iv.id, text))
        .await?,
    ),
    _ => None,
  };

  info!(target: "andamio_backend", id = %iv.id, with_comment = comment.is_some(), "Intervention recorded");
  Ok((iv, comment))
}

/// Append a follow-up comment to an existing intervention.
pub async fn add_comment(
  state: &AppState,
  token: Option<&str>,
  intervention_id: &str,
  req: CreateCommentIn,
) -> Result<InterventionComment, String> {
  state
    .add_comment(token, new_comment(intervention_id, req.text))
    .await
}

fn new_comment(intervention_id: &str, text: String) -> InterventionComment {
  InterventionComment {
    id: Uuid::new_v4().to_string(),
    intervention_id: intervention_id.to_string(),
    text,
    // Unix seconds; the storage backend may replace this with its own
    // timestamp type, the memory store keeps it as-is.
    created_at: unix_seconds(),
  }
}

fn unix_seconds() -> String {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs().to_string())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Activity;
  use crate::matcher::UNKNOWN_NAME;
  use crate::parser;

  // Fully in-memory state with seed reference data, independent of any
  // env vars the test host may carry.
  fn memory_state() -> AppState {
    use crate::config::Prompts;
    use crate::seeds::{seed_barriers, seed_learning_styles};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    AppState {
      barriers: Arc::new(RwLock::new(seed_barriers())),
      learning_styles: Arc::new(RwLock::new(seed_learning_styles())),
      students: Arc::new(RwLock::new(Vec::new())),
      activities: Arc::new(RwLock::new(Vec::new())),
      interventions: Arc::new(RwLock::new(Vec::new())),
      comments: Arc::new(RwLock::new(Vec::new())),
      storage: None,
      openai: None,
      prompts: Prompts::default(),
    }
  }

  #[tokio::test]
  async fn generation_without_openai_is_total() {
    let state = memory_state();
    let req = GenerateActivityIn {
      barrier_ids: vec!["bar-lectura".into()],
      learning_style_ids: vec!["ls-visual".into()],
      student_id: None,
      notes: String::new(),
    };
    let (activity, raw, origin) = generate_activity(&state, None, &req).await;
    assert_eq!(origin, ORIGIN_LOCAL);
    assert!(raw.is_empty());
    assert_eq!(activity, parser::parse(""));
  }

  #[tokio::test]
  async fn wizard_resolves_names_and_sentinel() {
    let state = memory_state();
    let act = Activity {
      id: "a1".into(),
      name: "Mapa Visual".into(),
      objective: String::new(),
      materials: vec![],
      development: Default::default(),
      barrier_ids: ["bar-lectura".to_string()].into_iter().collect(),
      learning_style_ids: ["ls-visual".to_string()].into_iter().collect(),
    };
    state.add_activity(None, act).await.expect("add");

    let out = wizard_candidates(&state, None, "bar-lectura", &["ls-visual".to_string(), "ls-fantasma".to_string()])
      .await
      .expect("wizard");
    assert_eq!(out.barrier_name, "Dificultad lectora");
    assert_eq!(out.style_names, vec!["Visual".to_string(), UNKNOWN_NAME.to_string()]);
    // ls-fantasma is selected but not addressed by the activity.
    assert!(out.activities.is_empty());

    let out2 = wizard_candidates(&state, None, "bar-lectura", &["ls-visual".to_string()])
      .await
      .expect("wizard");
    assert_eq!(out2.activities.len(), 1);
    assert_eq!(out2.activities[0].id, "a1");
  }

  #[tokio::test]
  async fn intervention_with_initial_comment() {
    let state = memory_state();
    let (iv, comment) = create_intervention(
      &state,
      None,
      CreateInterventionIn {
        activity_id: "a1".into(),
        student_id: "st1".into(),
        barrier_ids: vec!["bar-lectura".into()],
        learning_style_ids: vec!["ls-visual".into()],
        date: "2026-03-02".into(),
        observations: "primera sesión".into(),
        initial_comment: Some("buen arranque".into()),
      },
    )
    .await
    .expect("create");

    let comment = comment.expect("initial comment");
    assert_eq!(comment.intervention_id, iv.id);

    let listed = state.list_comments(None, &iv.id).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].text, "buen arranque");
  }
}
