//! Application state: collaborator clients, prompts, and in-memory stores.
//!
//! This module owns:
//!   - the optional storage client (PostgREST-style, row-level security)
//!   - the optional OpenAI client
//!   - the prompts struct (from TOML or defaults)
//!   - in-memory stores used when no storage backend is configured,
//!     seeded from the built-in bank plus the optional TOML bank
//!
//! Read/write policy is tiered: storage when configured (errors surface to
//! the HTTP caller), in-memory otherwise. The in-memory stores keep
//! insertion order, which the wizard relies on for stable results.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::{load_agent_config_from_env, Prompts};
use crate::domain::{
    Activity, Barrier, Intervention, InterventionComment, LearningStyle, Student,
};
use crate::openai::OpenAI;
use crate::seeds::{seed_barriers, seed_learning_styles};
use crate::storage::Storage;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub barriers: Arc<RwLock<Vec<Barrier>>>,
    pub learning_styles: Arc<RwLock<Vec<LearningStyle>>>,
    pub students: Arc<RwLock<Vec<Student>>>,
    pub activities: Arc<RwLock<Vec<Activity>>>,
    pub interventions: Arc<RwLock<Vec<Intervention>>>,
    pub comments: Arc<RwLock<Vec<InterventionComment>>>,
    pub storage: Option<Storage>,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, seed reference data, init clients.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg_opt = load_agent_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let mut barriers: Vec<Barrier> = Vec::new();
        let mut styles: Vec<LearningStyle> = Vec::new();

        // Insert config-bank entries first (if any).
        if let Some(cfg) = &cfg_opt {
            for b in &cfg.barriers {
                barriers.push(Barrier {
                    id: b.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: b.name.clone(),
                    description: b.description.clone(),
                });
            }
            for s in &cfg.learning_styles {
                styles.push(LearningStyle {
                    id: s.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                    name: s.name.clone(),
                    description: s.description.clone(),
                    color: s.color.clone(),
                });
            }
        }

        // Always add built-in seeds, but don't overwrite existing ids.
        for b in seed_barriers() {
            if !barriers.iter().any(|x| x.id == b.id) {
                barriers.push(b);
            }
        }
        for s in seed_learning_styles() {
            if !styles.iter().any(|x| x.id == s.id) {
                styles.push(s);
            }
        }

        info!(
            target: "andamio_backend",
            barriers = barriers.len(),
            learning_styles = styles.len(),
            "Startup reference inventory (in-memory)"
        );

        let storage = Storage::from_env();
        if let Some(st) = &storage {
            info!(target: "andamio_backend", base_url = %st.base_url(), "Storage backend enabled.");
        } else {
            info!(target: "andamio_backend", "Storage disabled (no STORAGE_BASE_URL). Using in-memory stores.");
        }

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "andamio_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "andamio_backend", "OpenAI disabled (no OPENAI_API_KEY). Generation uses the local fallback skeleton.");
        }

        Self {
            barriers: Arc::new(RwLock::new(barriers)),
            learning_styles: Arc::new(RwLock::new(styles)),
            students: Arc::new(RwLock::new(Vec::new())),
            activities: Arc::new(RwLock::new(Vec::new())),
            interventions: Arc::new(RwLock::new(Vec::new())),
            comments: Arc::new(RwLock::new(Vec::new())),
            storage,
            openai,
            prompts,
        }
    }

    // --- Reads (storage when configured, memory otherwise) ---

    pub async fn list_barriers(&self, token: Option<&str>) -> Result<Vec<Barrier>, String> {
        match &self.storage {
            Some(st) => st.list_barriers(token).await,
            None => Ok(self.barriers.read().await.clone()),
        }
    }

    pub async fn list_learning_styles(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<LearningStyle>, String> {
        match &self.storage {
            Some(st) => st.list_learning_styles(token).await,
            None => Ok(self.learning_styles.read().await.clone()),
        }
    }

    pub async fn list_students(&self, token: Option<&str>) -> Result<Vec<Student>, String> {
        match &self.storage {
            Some(st) => st.list_students(token).await,
            None => Ok(self.students.read().await.clone()),
        }
    }

    pub async fn list_activities(&self, token: Option<&str>) -> Result<Vec<Activity>, String> {
        match &self.storage {
            Some(st) => st.list_activities(token).await,
            None => Ok(self.activities.read().await.clone()),
        }
    }

    pub async fn list_interventions(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<Intervention>, String> {
        match &self.storage {
            Some(st) => st.list_interventions(token).await,
            None => Ok(self.interventions.read().await.clone()),
        }
    }

    pub async fn list_comments(
        &self,
        token: Option<&str>,
        intervention_id: &str,
    ) -> Result<Vec<InterventionComment>, String> {
        match &self.storage {
            Some(st) => st.list_comments(token, intervention_id).await,
            None => Ok(self
                .comments
                .read()
                .await
                .iter()
                .filter(|c| c.intervention_id == intervention_id)
                .cloned()
                .collect()),
        }
    }

    // --- Writes ---

    pub async fn add_barrier(&self, token: Option<&str>, b: Barrier) -> Result<Barrier, String> {
        match &self.storage {
            Some(st) => st.insert_barrier(token, &b).await.map(|_| b),
            None => {
                self.barriers.write().await.push(b.clone());
                Ok(b)
            }
        }
    }

    pub async fn add_learning_style(
        &self,
        token: Option<&str>,
        s: LearningStyle,
    ) -> Result<LearningStyle, String> {
        match &self.storage {
            Some(st) => st.insert_learning_style(token, &s).await.map(|_| s),
            None => {
                self.learning_styles.write().await.push(s.clone());
                Ok(s)
            }
        }
    }

    pub async fn add_student(&self, token: Option<&str>, s: Student) -> Result<Student, String> {
        match &self.storage {
            Some(st) => st.insert_student(token, &s).await.map(|_| s),
            None => {
                self.students.write().await.push(s.clone());
                Ok(s)
            }
        }
    }

    pub async fn add_activity(&self, token: Option<&str>, a: Activity) -> Result<Activity, String> {
        match &self.storage {
            Some(st) => st.insert_activity(token, &a).await.map(|_| a),
            None => {
                self.activities.write().await.push(a.clone());
                Ok(a)
            }
        }
    }

    pub async fn add_intervention(
        &self,
        token: Option<&str>,
        iv: Intervention,
    ) -> Result<Intervention, String> {
        match &self.storage {
            Some(st) => st.insert_intervention(token, &iv).await.map(|_| iv),
            None => {
                self.interventions.write().await.push(iv.clone());
                Ok(iv)
            }
        }
    }

    pub async fn add_comment(
        &self,
        token: Option<&str>,
        c: InterventionComment,
    ) -> Result<InterventionComment, String> {
        match &self.storage {
            Some(st) => st.insert_comment(token, &c).await.map(|_| c),
            None => {
                self.comments.write().await.push(c.clone());
                Ok(c)
            }
        }
    }
}
