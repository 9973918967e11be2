//! Minimal OpenAI client for our use-cases.
//!
//! We only call chat.completions and request plain text: the activity
//! parser is built precisely because the model follows the requested
//! section format loosely, so there is no strict-JSON path here.
//! Calls are instrumented and log model names, latencies, and response
//! sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{Barrier, LearningStyle};
use crate::util::fill_template;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model })
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "andamio-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or_else(|| body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    Ok(text)
  }

  // --- High-level helpers (domain-specialized) ---

  /// Ask the strong model for a new activity targeting the given barriers
  /// and learning styles. Returns the raw text; the caller parses it.
  #[instrument(
    level = "info",
    skip_all,
    fields(model = %self.strong_model, barriers = barriers.len(), styles = styles.len())
  )]
  pub async fn generate_activity_text(
    &self,
    prompts: &Prompts,
    barriers: &[Barrier],
    styles: &[LearningStyle],
    student_history: &str,
    notes: &str,
  ) -> Result<String, String> {
    let user = fill_template(
      &prompts.generation_user_template,
      &[
        ("barriers", &context_lines_barriers(barriers)),
        ("styles", &context_lines_styles(styles)),
        ("student_history", student_history),
        ("notes", notes),
      ],
    );

    let start = std::time::Instant::now();
    let result = self
      .chat_plain(&self.strong_model, &prompts.generation_system, &user, 0.8)
      .await;
    let elapsed = start.elapsed();

    match &result {
      Ok(text) => {
        info!(?elapsed, text_len = text.len(), "Activity text generated");
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during activity generation");
      }
    }
    result
  }
}

/// "- Nombre: descripción" context lines handed to the prompt template.
fn context_lines_barriers(barriers: &[Barrier]) -> String {
  barriers
    .iter()
    .map(|b| format!("- {}: {}", b.name, b.description))
    .collect::<Vec<_>>()
    .join("\n")
}

fn context_lines_styles(styles: &[LearningStyle]) -> String {
  styles
    .iter()
    .map(|s| format!("- {}: {}", s.name, s.description))
    .collect::<Vec<_>>()
    .join("\n")
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Prompts;

  #[test]
  fn context_lines_are_one_per_entry() {
    let barriers = vec![
      Barrier { id: "b1".into(), name: "Dificultad lectora".into(), description: "textos largos".into() },
      Barrier { id: "b2".into(), name: "Atención dispersa".into(), description: "pierde el foco".into() },
    ];
    let lines = context_lines_barriers(&barriers);
    assert_eq!(lines, "- Dificultad lectora: textos largos\n- Atención dispersa: pierde el foco");
  }

  #[test]
  fn user_prompt_carries_all_context_slots() {
    let prompts = Prompts::default();
    let user = fill_template(
      &prompts.generation_user_template,
      &[
        ("barriers", "- B: d"),
        ("styles", "- S: d"),
        ("student_history", "sin historial"),
        ("notes", "usar material concreto"),
      ],
    );
    assert!(user.contains("- B: d"));
    assert!(user.contains("- S: d"));
    assert!(user.contains("sin historial"));
    assert!(user.contains("usar material concreto"));
    assert!(!user.contains('{'));
  }
}
