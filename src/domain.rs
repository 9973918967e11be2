//! Domain models: barriers, learning styles, students, activities,
//! interventions, and the structured form produced by the activity parser.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A named learning obstacle a student may face (e.g., reading difficulty).
/// Reference data: created once by a teacher, identified by opaque id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Barrier {
  pub id: String,
  pub name: String,
  #[serde(default)] pub description: String,
}

/// A preferred modality of learning (e.g., visual, auditory).
/// `color` is a display hint only and carries no semantics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LearningStyle {
  pub id: String,
  pub name: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub color: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Student {
  pub id: String,
  pub name: String,
  #[serde(default)] pub notes: String,
}

/// One ordered step of an activity. `duration` is an opaque display string
/// (e.g., "10-15 minutos"); callers never parse it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityStep {
  pub description: String,
  pub duration: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDevelopment {
  #[serde(default)] pub description: String,
  #[serde(default)] pub steps: Vec<ActivityStep>,
}

/// Normalized output of the activity text parser. The parser guarantees
/// `name`, `objective`, `materials`, and `development.steps` are non-empty
/// for any input whatsoever.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedActivity {
  pub name: String,
  pub objective: String,
  pub materials: Vec<String>,
  pub development: ActivityDevelopment,
}

/// Persisted activity as used by the wizard matcher. The tag sets say which
/// barriers and learning styles the activity addresses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Activity {
  pub id: String,
  pub name: String,
  #[serde(default)] pub objective: String,
  #[serde(default)] pub materials: Vec<String>,
  #[serde(default)] pub development: ActivityDevelopment,
  #[serde(default)] pub barrier_ids: HashSet<String>,
  #[serde(default)] pub learning_style_ids: HashSet<String>,
}

/// One application of an activity to a student, with date and observations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Intervention {
  pub id: String,
  pub activity_id: String,
  pub student_id: String,
  #[serde(default)] pub barrier_ids: HashSet<String>,
  #[serde(default)] pub learning_style_ids: HashSet<String>,
  #[serde(default)] pub date: String,
  #[serde(default)] pub observations: String,
}

/// Follow-up note attached to an intervention.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterventionComment {
  pub id: String,
  pub intervention_id: String,
  pub text: String,
  #[serde(default)] pub created_at: String,
}

/// Anything with an id and a display name. Lets the wizard resolve names
/// from any reference collection through a single lookup helper.
pub trait Named {
  fn id(&self) -> &str;
  fn name(&self) -> &str;
}

impl Named for Barrier {
  fn id(&self) -> &str { &self.id }
  fn name(&self) -> &str { &self.name }
}

impl Named for LearningStyle {
  fn id(&self) -> &str { &self.id }
  fn name(&self) -> &str { &self.name }
}

impl Named for Student {
  fn id(&self) -> &str { &self.id }
  fn name(&self) -> &str { &self.name }
}

impl Named for Activity {
  fn id(&self) -> &str { &self.id }
  fn name(&self) -> &str { &self.name }
}
