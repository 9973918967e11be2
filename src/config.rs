//! Loading agent configuration (prompts + optional reference bank) from TOML.
//!
//! See `AgentConfig` and `Prompts` for the expected schema. The bank lets a
//! deployment ship its own barriers/learning styles without a storage
//! backend; entries without ids get fresh UUIDs at load time.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub barriers: Vec<BarrierCfg>,
  #[serde(default)]
  pub learning_styles: Vec<LearningStyleCfg>,
}

/// Barrier entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct BarrierCfg {
  #[serde(default)] pub id: Option<String>,
  pub name: String,
  #[serde(default)] pub description: String,
}

/// Learning-style entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct LearningStyleCfg {
  #[serde(default)] pub id: Option<String>,
  pub name: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub color: Option<String>,
}

/// Prompts used by the OpenAI client. Defaults request the Spanish section
/// format the activity parser knows how to read. Override them in TOML if
/// you need to tune tone/structure, but keep the section labels.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub generation_system: String,
  pub generation_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      generation_system: "Eres un especialista en educación inclusiva. Diseñas actividades de aula \
        adaptadas a barreras de aprendizaje y estilos de aprendizaje concretos. Responde SIEMPRE en \
        español y usa EXACTAMENTE este formato:\n\
        Nombre: <nombre corto de la actividad>\n\
        Objetivo: <objetivo pedagógico en una o dos frases>\n\
        Materiales:\n- <material 1>\n- <material 2>\n\
        Desarrollo:\n\
        Paso 1: <descripción> (<duración, p. ej. 10-15 minutos>)\n\
        Paso 2: <descripción> (<duración>)\n\
        Paso 3: <descripción> (<duración>)"
        .into(),
      generation_user_template: "Diseña una actividad para trabajar estas barreras de aprendizaje:\n\
        {barriers}\n\nY estos estilos de aprendizaje:\n{styles}\n\n\
        Historial del estudiante (puede estar vacío):\n{student_history}\n\n\
        Indicaciones del docente (pueden estar vacías):\n{notes}"
        .into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "andamio_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "andamio_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "andamio_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bank_entries_parse_from_toml() {
    let cfg: AgentConfig = toml::from_str(
      r##"
      [[barriers]]
      name = "Dificultad lectora"
      description = "Le cuesta decodificar textos largos"

      [[learning_styles]]
      id = "ls-visual"
      name = "Visual"
      color = "#4f9cf9"
      "##,
    )
    .expect("toml");
    assert_eq!(cfg.barriers.len(), 1);
    assert!(cfg.barriers[0].id.is_none());
    assert_eq!(cfg.learning_styles[0].id.as_deref(), Some("ls-visual"));
    // Prompts fall back to defaults when absent.
    assert!(cfg.prompts.generation_system.contains("Nombre:"));
  }
}
