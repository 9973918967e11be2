//! Seed data: built-in barriers and learning styles so the app is useful
//! even without external storage or a TOML bank.

use crate::domain::{Barrier, LearningStyle};

pub fn seed_barriers() -> Vec<Barrier> {
  vec![
    Barrier {
      id: "bar-lectura".into(),
      name: "Dificultad lectora".into(),
      description: "Le cuesta decodificar y comprender textos de su nivel.".into(),
    },
    Barrier {
      id: "bar-atencion".into(),
      name: "Atención dispersa".into(),
      description: "Pierde el foco en tareas que superan los diez minutos.".into(),
    },
    Barrier {
      id: "bar-calculo".into(),
      name: "Dificultad de cálculo".into(),
      description: "Errores frecuentes en operaciones básicas y estimación.".into(),
    },
  ]
}

pub fn seed_learning_styles() -> Vec<LearningStyle> {
  vec![
    LearningStyle {
      id: "ls-visual".into(),
      name: "Visual".into(),
      description: "Aprende mejor con esquemas, mapas y apoyos gráficos.".into(),
      color: Some("#4f9cf9".into()),
    },
    LearningStyle {
      id: "ls-auditivo".into(),
      name: "Auditivo".into(),
      description: "Aprende mejor escuchando y verbalizando.".into(),
      color: Some("#f9a84f".into()),
    },
    LearningStyle {
      id: "ls-kinestesico".into(),
      name: "Kinestésico".into(),
      description: "Aprende mejor manipulando y moviéndose.".into(),
      color: Some("#6fcf97".into()),
    },
  ]
}
