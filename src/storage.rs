//! REST client for the hosted relational store (PostgREST-style API with
//! row-level security).
//!
//! The store owns authorization: we forward the caller's bearer token on
//! every request and let row-level policies decide visibility. When no
//! token is present we fall back to the service api key.
//!
//! This module is also the single normalization boundary for the loosely
//! typed JSON columns (`materials`, `development`): whether a value arrives
//! as a JSON array/object or as a JSON-encoded string, rows leave this
//! module as fully typed `Activity` values and nothing downstream ever
//! re-checks shapes.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, instrument};

use crate::domain::{
  Activity, ActivityDevelopment, Barrier, Intervention, InterventionComment, LearningStyle,
  Student,
};

#[derive(Clone)]
pub struct Storage {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

impl Storage {
  /// Construct the client if STORAGE_BASE_URL and STORAGE_API_KEY are set;
  /// otherwise return None and the app serves from its in-memory stores.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("STORAGE_BASE_URL").ok()?;
    let api_key = std::env::var("STORAGE_API_KEY").ok()?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(15))
      .build()
      .ok()?;

    Some(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn table_url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.base_url, table)
  }

  fn bearer<'a>(&'a self, token: Option<&'a str>) -> &'a str {
    token.unwrap_or(&self.api_key)
  }

  #[instrument(level = "debug", skip(self, token), fields(%table))]
  async fn get_rows<T: DeserializeOwned>(
    &self,
    token: Option<&str>,
    table: &str,
    query: &[(&str, &str)],
  ) -> Result<Vec<T>, String> {
    let res = self
      .client
      .get(self.table_url(table))
      .query(query)
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {}", self.bearer(token)))
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("storage HTTP {} on {}: {}", status, table, body));
    }
    res.json::<Vec<T>>().await.map_err(|e| e.to_string())
  }

  #[instrument(level = "debug", skip(self, token, rows), fields(%table))]
  async fn insert_rows(&self, token: Option<&str>, table: &str, rows: &Value) -> Result<(), String> {
    let res = self
      .client
      .post(self.table_url(table))
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {}", self.bearer(token)))
      .header(CONTENT_TYPE, "application/json")
      .header("Prefer", "return=minimal")
      .json(rows)
      .send()
      .await
      .map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("storage HTTP {} on {}: {}", status, table, body));
    }
    Ok(())
  }

  // --- Reference data ---

  pub async fn list_barriers(&self, token: Option<&str>) -> Result<Vec<Barrier>, String> {
    self.get_rows(token, "barriers", &[("select", "*")]).await
  }

  pub async fn insert_barrier(&self, token: Option<&str>, b: &Barrier) -> Result<(), String> {
    self
      .insert_rows(token, "barriers", &json!({
        "id": b.id, "name": b.name, "description": b.description,
      }))
      .await
  }

  pub async fn list_learning_styles(&self, token: Option<&str>) -> Result<Vec<LearningStyle>, String> {
    self.get_rows(token, "learning_styles", &[("select", "*")]).await
  }

  pub async fn insert_learning_style(&self, token: Option<&str>, s: &LearningStyle) -> Result<(), String> {
    self
      .insert_rows(token, "learning_styles", &json!({
        "id": s.id, "name": s.name, "description": s.description, "color": s.color,
      }))
      .await
  }

  pub async fn list_students(&self, token: Option<&str>) -> Result<Vec<Student>, String> {
    self.get_rows(token, "students", &[("select", "*")]).await
  }

  pub async fn insert_student(&self, token: Option<&str>, s: &Student) -> Result<(), String> {
    self
      .insert_rows(token, "students", &json!({
        "id": s.id, "name": s.name, "notes": s.notes,
      }))
      .await
  }

  // --- Activities ---

  /// Fetch activities with their join-table rows embedded, already
  /// normalized to the typed `Activity` shape.
  #[instrument(level = "info", skip(self, token))]
  pub async fn list_activities(&self, token: Option<&str>) -> Result<Vec<Activity>, String> {
    let rows: Vec<ActivityRow> = self
      .get_rows(token, "activities", &[(
        "select",
        "*,activity_barriers(barrier_id),activity_learning_styles(learning_style_id)",
      )])
      .await?;
    info!(target: "andamio_backend", count = rows.len(), "Fetched activities from storage");
    Ok(rows.into_iter().map(Activity::from).collect())
  }

  /// Insert an activity and its tag rows. Join rows go in bulk, one POST
  /// per join table.
  #[instrument(level = "info", skip(self, token, a), fields(id = %a.id))]
  pub async fn insert_activity(&self, token: Option<&str>, a: &Activity) -> Result<(), String> {
    self
      .insert_rows(token, "activities", &json!({
        "id": a.id,
        "name": a.name,
        "objective": a.objective,
        "materials": a.materials,
        "development": a.development,
      }))
      .await?;

    let barrier_links: Vec<Value> = a
      .barrier_ids
      .iter()
      .map(|b| json!({ "activity_id": a.id, "barrier_id": b }))
      .collect();
    if !barrier_links.is_empty() {
      self.insert_rows(token, "activity_barriers", &Value::Array(barrier_links)).await?;
    }

    let style_links: Vec<Value> = a
      .learning_style_ids
      .iter()
      .map(|s| json!({ "activity_id": a.id, "learning_style_id": s }))
      .collect();
    if !style_links.is_empty() {
      self
        .insert_rows(token, "activity_learning_styles", &Value::Array(style_links))
        .await?;
    }
    Ok(())
  }

  // --- Interventions ---

  pub async fn list_interventions(&self, token: Option<&str>) -> Result<Vec<Intervention>, String> {
    let rows: Vec<InterventionRow> = self
      .get_rows(token, "interventions", &[(
        "select",
        "*,intervention_barriers(barrier_id),intervention_learning_styles(learning_style_id)",
      )])
      .await?;
    Ok(rows.into_iter().map(Intervention::from).collect())
  }

  #[instrument(level = "info", skip(self, token, iv), fields(id = %iv.id))]
  pub async fn insert_intervention(&self, token: Option<&str>, iv: &Intervention) -> Result<(), String> {
    self
      .insert_rows(token, "interventions", &json!({
        "id": iv.id,
        "activity_id": iv.activity_id,
        "student_id": iv.student_id,
        "date": iv.date,
        "observations": iv.observations,
      }))
      .await?;

    let barrier_links: Vec<Value> = iv
      .barrier_ids
      .iter()
      .map(|b| json!({ "intervention_id": iv.id, "barrier_id": b }))
      .collect();
    if !barrier_links.is_empty() {
      self
        .insert_rows(token, "intervention_barriers", &Value::Array(barrier_links))
        .await?;
    }

    let style_links: Vec<Value> = iv
      .learning_style_ids
      .iter()
      .map(|s| json!({ "intervention_id": iv.id, "learning_style_id": s }))
      .collect();
    if !style_links.is_empty() {
      self
        .insert_rows(token, "intervention_learning_styles", &Value::Array(style_links))
        .await?;
    }
    Ok(())
  }

  pub async fn list_comments(
    &self,
    token: Option<&str>,
    intervention_id: &str,
  ) -> Result<Vec<InterventionComment>, String> {
    self
      .get_rows(token, "intervention_comments", &[
        ("select", "*"),
        ("intervention_id", &format!("eq.{intervention_id}")),
        ("order", "created_at.asc"),
      ])
      .await
  }

  pub async fn insert_comment(&self, token: Option<&str>, c: &InterventionComment) -> Result<(), String> {
    self
      .insert_rows(token, "intervention_comments", &json!({
        "id": c.id,
        "intervention_id": c.intervention_id,
        "text": c.text,
        "created_at": c.created_at,
      }))
      .await
  }
}

// --- Row DTOs and normalization ---

#[derive(Debug, Deserialize)]
struct ActivityRow {
  id: String,
  name: String,
  #[serde(default)] objective: String,
  #[serde(default)] materials: Value,
  #[serde(default)] development: Value,
  #[serde(default)] activity_barriers: Vec<BarrierLink>,
  #[serde(default)] activity_learning_styles: Vec<StyleLink>,
}

#[derive(Debug, Deserialize)]
struct BarrierLink {
  barrier_id: String,
}

#[derive(Debug, Deserialize)]
struct StyleLink {
  learning_style_id: String,
}

impl From<ActivityRow> for Activity {
  fn from(row: ActivityRow) -> Self {
    Activity {
      id: row.id,
      name: row.name,
      objective: row.objective,
      materials: normalize_materials(&row.materials),
      development: normalize_development(&row.development),
      barrier_ids: row.activity_barriers.into_iter().map(|l| l.barrier_id).collect(),
      learning_style_ids: row
        .activity_learning_styles
        .into_iter()
        .map(|l| l.learning_style_id)
        .collect(),
    }
  }
}

#[derive(Debug, Deserialize)]
struct InterventionRow {
  id: String,
  activity_id: String,
  student_id: String,
  #[serde(default)] date: String,
  #[serde(default)] observations: String,
  #[serde(default)] intervention_barriers: Vec<BarrierLink>,
  #[serde(default)] intervention_learning_styles: Vec<StyleLink>,
}

impl From<InterventionRow> for Intervention {
  fn from(row: InterventionRow) -> Self {
    Intervention {
      id: row.id,
      activity_id: row.activity_id,
      student_id: row.student_id,
      barrier_ids: row.intervention_barriers.into_iter().map(|l| l.barrier_id).collect(),
      learning_style_ids: row
        .intervention_learning_styles
        .into_iter()
        .map(|l| l.learning_style_id)
        .collect(),
      date: row.date,
      observations: row.observations,
    }
  }
}

/// The `materials` column may hold a JSON array or a JSON-encoded string
/// (older rows). Normalize both to `Vec<String>` here, once.
fn normalize_materials(v: &Value) -> Vec<String> {
  match v {
    Value::Array(items) => items
      .iter()
      .filter_map(|i| i.as_str())
      .map(str::to_string)
      .collect(),
    Value::String(s) => match serde_json::from_str::<Vec<String>>(s) {
      Ok(list) => list,
      Err(_) if s.trim().is_empty() => Vec::new(),
      Err(_) => vec![s.clone()],
    },
    _ => Vec::new(),
  }
}

/// Same policy for `development`: object or JSON-encoded string. A plain
/// string that is not valid JSON becomes the description with no steps.
fn normalize_development(v: &Value) -> ActivityDevelopment {
  match v {
    Value::Object(_) => serde_json::from_value(v.clone()).unwrap_or_default(),
    Value::String(s) => serde_json::from_str::<ActivityDevelopment>(s)
      .unwrap_or_else(|_| ActivityDevelopment { description: s.clone(), steps: Vec::new() }),
    _ => ActivityDevelopment::default(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn materials_normalize_from_array_and_string() {
    assert_eq!(
      normalize_materials(&json!(["Papel", "Tijeras"])),
      vec!["Papel".to_string(), "Tijeras".to_string()]
    );
    assert_eq!(
      normalize_materials(&json!("[\"Papel\",\"Tijeras\"]")),
      vec!["Papel".to_string(), "Tijeras".to_string()]
    );
    assert_eq!(normalize_materials(&json!("Papel continuo")), vec!["Papel continuo".to_string()]);
    assert!(normalize_materials(&json!("  ")).is_empty());
    assert!(normalize_materials(&Value::Null).is_empty());
  }

  #[test]
  fn development_normalizes_from_object_and_string() {
    let obj = json!({
      "description": "en parejas",
      "steps": [{"description": "Observar", "duration": "5 minutos"}]
    });
    let dev = normalize_development(&obj);
    assert_eq!(dev.description, "en parejas");
    assert_eq!(dev.steps.len(), 1);

    let encoded = json!(obj.to_string());
    let dev2 = normalize_development(&encoded);
    assert_eq!(dev2.steps[0].duration, "5 minutos");

    let plain = normalize_development(&json!("texto libre"));
    assert_eq!(plain.description, "texto libre");
    assert!(plain.steps.is_empty());
  }

  #[test]
  fn activity_row_collects_join_rows_into_sets() {
    let row: ActivityRow = serde_json::from_value(json!({
      "id": "a1",
      "name": "Mapa Visual",
      "materials": ["Papel"],
      "development": {"description": "", "steps": []},
      "activity_barriers": [{"barrier_id": "b1"}, {"barrier_id": "b2"}],
      "activity_learning_styles": [{"learning_style_id": "s1"}]
    }))
    .expect("row");
    let a = Activity::from(row);
    assert!(a.barrier_ids.contains("b1") && a.barrier_ids.contains("b2"));
    assert!(a.learning_style_ids.contains("s1"));
    assert_eq!(a.materials, vec!["Papel".to_string()]);
  }
}
