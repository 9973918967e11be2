//! Public request/response structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Set-valued tag fields serialize as sorted arrays so wire output is
//! deterministic regardless of internal hash order.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Activity, ActivityDevelopment, GeneratedActivity, Intervention,
};

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

//
// Reference data
//

#[derive(Debug, Deserialize)]
pub struct CreateBarrierIn {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLearningStyleIn {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentIn {
    pub name: String,
    #[serde(default)]
    pub notes: String,
}

//
// Activities
//

#[derive(Debug, Deserialize)]
pub struct CreateActivityIn {
    pub name: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub development: ActivityDevelopment,
    #[serde(default, rename = "barrierIds")]
    pub barrier_ids: Vec<String>,
    #[serde(default, rename = "learningStyleIds")]
    pub learning_style_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivityOut {
    pub id: String,
    pub name: String,
    pub objective: String,
    pub materials: Vec<String>,
    pub development: ActivityDevelopment,
    #[serde(rename = "barrierIds")]
    pub barrier_ids: Vec<String>,
    #[serde(rename = "learningStyleIds")]
    pub learning_style_ids: Vec<String>,
}

/// Convert the internal `Activity` to the public DTO.
pub fn activity_to_out(a: &Activity) -> ActivityOut {
    let mut barrier_ids: Vec<String> = a.barrier_ids.iter().cloned().collect();
    barrier_ids.sort();
    let mut learning_style_ids: Vec<String> = a.learning_style_ids.iter().cloned().collect();
    learning_style_ids.sort();
    ActivityOut {
        id: a.id.clone(),
        name: a.name.clone(),
        objective: a.objective.clone(),
        materials: a.materials.clone(),
        development: a.development.clone(),
        barrier_ids,
        learning_style_ids,
    }
}

//
// Generation
//

#[derive(Debug, Deserialize)]
pub struct GenerateActivityIn {
    #[serde(default, rename = "barrierIds")]
    pub barrier_ids: Vec<String>,
    #[serde(default, rename = "learningStyleIds")]
    pub learning_style_ids: Vec<String>,
    #[serde(default, rename = "studentId")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize)]
pub struct GenerateActivityOut {
    pub activity: GeneratedActivity,
    #[serde(rename = "rawText")]
    pub raw_text: String,
    pub origin: String,
}

//
// Wizard
//

#[derive(Debug, Deserialize)]
pub struct WizardFilterIn {
    #[serde(rename = "barrierId")]
    pub barrier_id: String,
    #[serde(default, rename = "learningStyleIds")]
    pub learning_style_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct WizardFilterOut {
    #[serde(rename = "barrierName")]
    pub barrier_name: String,
    #[serde(rename = "styleNames")]
    pub style_names: Vec<String>,
    pub activities: Vec<ActivityOut>,
}

//
// Interventions
//

#[derive(Debug, Deserialize)]
pub struct CreateInterventionIn {
    #[serde(rename = "activityId")]
    pub activity_id: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(default, rename = "barrierIds")]
    pub barrier_ids: Vec<String>,
    #[serde(default, rename = "learningStyleIds")]
    pub learning_style_ids: Vec<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub observations: String,
    #[serde(default, rename = "initialComment")]
    pub initial_comment: Option<String>,
}

#[derive(Serialize)]
pub struct InterventionOut {
    pub id: String,
    #[serde(rename = "activityId")]
    pub activity_id: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "barrierIds")]
    pub barrier_ids: Vec<String>,
    #[serde(rename = "learningStyleIds")]
    pub learning_style_ids: Vec<String>,
    pub date: String,
    pub observations: String,
}

pub fn intervention_to_out(iv: &Intervention) -> InterventionOut {
    let mut barrier_ids: Vec<String> = iv.barrier_ids.iter().cloned().collect();
    barrier_ids.sort();
    let mut learning_style_ids: Vec<String> = iv.learning_style_ids.iter().cloned().collect();
    learning_style_ids.sort();
    InterventionOut {
        id: iv.id.clone(),
        activity_id: iv.activity_id.clone(),
        student_id: iv.student_id.clone(),
        barrier_ids,
        learning_style_ids,
        date: iv.date.clone(),
        observations: iv.observations.clone(),
    }
}

#[derive(Serialize)]
pub struct CreateInterventionOut {
    pub intervention: InterventionOut,
    #[serde(rename = "initialComment")]
    pub initial_comment: Option<CommentOut>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentIn {
    pub text: String,
}

#[derive(Serialize)]
pub struct CommentOut {
    pub id: String,
    #[serde(rename = "interventionId")]
    pub intervention_id: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

pub fn comment_to_out(c: &crate::domain::InterventionComment) -> CommentOut {
    CommentOut {
        id: c.id.clone(),
        intervention_id: c.intervention_id.clone(),
        text: c.text.clone(),
        created_at: c.created_at.clone(),
    }
}
