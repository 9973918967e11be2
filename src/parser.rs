//! Best-effort parser for generated activity text.
//!
//! The completion service is asked for a fixed Spanish format
//! (Nombre/Objetivo/Materiales/Desarrollo with "Paso N: ... (duración)"
//! steps) but only loosely follows it. `parse` is therefore total: every
//! input, however malformed, yields a structurally valid activity. Each
//! extraction pass is independent; whatever a pass cannot find is filled
//! with a fixed fallback literal rather than left blank.
//!
//! Step extraction is tiered: structured "Paso N" pattern, then a
//! blank-line paragraph heuristic, then a fixed 3-step skeleton. Each tier
//! is strictly more permissive than the previous; any extracted structure
//! beats the generic skeleton even when confidence is low.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{ActivityDevelopment, ActivityStep, GeneratedActivity};

pub const FALLBACK_NAME: &str = "Actividad Generada";
pub const FALLBACK_OBJECTIVE: &str =
  "Desarrollar habilidades específicas adaptadas a las necesidades del estudiante";
pub const FALLBACK_MATERIAL: &str = "Materiales básicos del aula";

// Section labels are matched case-insensitively and only at line start, so
// an embedded "materiales:" mid-sentence never opens a section.
static NAME_LABEL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?mi)^[ \t]*(?:nombre|t[ií]tulo|actividad)[ \t]*:[ \t]*(.+)$").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*#+[ \t]*(.+)$").unwrap());

static OBJECTIVE_START: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?mi)^[ \t]*(?:objetivos?|prop[oó]sito)[ \t]*:").unwrap());
static OBJECTIVE_STOP: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?mi)^[ \t]*(?:materiales|recursos|desarrollo|pasos)[ \t]*:").unwrap());

static MATERIALS_START: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?mi)^[ \t]*(?:materiales|recursos)[ \t]*:").unwrap());
static MATERIALS_STOP: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?mi)^[ \t]*(?:desarrollo|procedimiento|pasos)[ \t]*:").unwrap());
static MATERIALS_ITEM: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-•*]|\d+\.)[ \t]*").unwrap());

static DEVELOPMENT_START: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?mi)^[ \t]*(?:desarrollo|procedimiento|pasos|actividades)[ \t]*:").unwrap()
});
static STEP_MARKER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?mi)^[ \t]*(?:paso[ \t]+)?\d+[.:]").unwrap());
static STEP_FULL: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)(?:paso[ \t]+)?\d+[.:][ \t]*([^()\r\n]+?)[ \t]*\(([^()\r\n]+)\)").unwrap()
});
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").unwrap());
static PARAGRAPH_PASO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^paso\b").unwrap());
static EMBEDDED_DURATION: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)\((\d+(?:[ \t]*-[ \t]*\d+)?[ \t]*(?:minutos|horas))\)").unwrap()
});

/// Convert raw generated text into a structured activity. Total: never
/// fails, and every field of the result is non-empty per the fallbacks.
pub fn parse(raw_text: &str) -> GeneratedActivity {
  let name = extract_name(raw_text);
  let objective = extract_objective(raw_text);
  let materials = extract_materials(raw_text);
  let (description, mut steps) = extract_development(raw_text);
  if steps.is_empty() {
    steps = fallback_steps();
  }
  GeneratedActivity {
    name,
    objective,
    materials,
    development: ActivityDevelopment { description, steps },
  }
}

/// Generic skeleton used when no step structure can be recovered at all.
pub fn fallback_steps() -> Vec<ActivityStep> {
  vec![
    ActivityStep {
      description: "Introducción y presentación de la actividad".into(),
      duration: "10-15 minutos".into(),
    },
    ActivityStep {
      description: "Desarrollo de la actividad principal".into(),
      duration: "20-30 minutos".into(),
    },
    ActivityStep {
      description: "Cierre y reflexión sobre lo aprendido".into(),
      duration: "10-15 minutos".into(),
    },
  ]
}

/// Slice out the text between a section label and the next known header
/// (or end of text). Whitespace-only captures count as extraction failure.
fn section_block<'a>(text: &'a str, start: &Regex, stop: Option<&Regex>) -> Option<&'a str> {
  let m = start.find(text)?;
  let after = &text[m.end()..];
  let end = stop
    .and_then(|r| r.find(after))
    .map(|s| s.start())
    .unwrap_or(after.len());
  let block = after[..end].trim();
  if block.is_empty() { None } else { Some(block) }
}

/// "Nombre:/Título:/Actividad:" label, else a markdown heading, else the
/// first non-empty line verbatim. First hit wins.
fn extract_name(text: &str) -> String {
  if let Some(c) = NAME_LABEL.captures(text) {
    let v = c[1].trim();
    if !v.is_empty() {
      return v.to_string();
    }
  }
  if let Some(c) = HEADING.captures(text) {
    let v = c[1].trim();
    if !v.is_empty() {
      return v.to_string();
    }
  }
  text
    .lines()
    .map(str::trim)
    .find(|l| !l.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

fn extract_objective(text: &str) -> String {
  section_block(text, &OBJECTIVE_START, Some(&OBJECTIVE_STOP))
    .map(str::to_string)
    .unwrap_or_else(|| FALLBACK_OBJECTIVE.to_string())
}

fn extract_materials(text: &str) -> Vec<String> {
  let items: Vec<String> = section_block(text, &MATERIALS_START, Some(&MATERIALS_STOP))
    .map(|block| {
      MATERIALS_ITEM
        .split(block)
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect()
    })
    .unwrap_or_default();
  if items.is_empty() {
    vec![FALLBACK_MATERIAL.to_string()]
  } else {
    items
  }
}

/// Development block: free-text description prefix plus extracted steps.
/// Steps may come back empty here; `parse` installs the skeleton then.
fn extract_development(text: &str) -> (String, Vec<ActivityStep>) {
  let block = match section_block(text, &DEVELOPMENT_START, None) {
    Some(b) => b,
    None => return (String::new(), Vec::new()),
  };

  // Everything before the first step marker is prose description. Without
  // any marker the whole block goes to the paragraph heuristic instead.
  let (description, rest) = match STEP_MARKER.find(block) {
    Some(m) => (block[..m.start()].trim().to_string(), &block[m.start()..]),
    None => (String::new(), block),
  };

  let mut steps: Vec<ActivityStep> = STEP_FULL
    .captures_iter(rest)
    .map(|c| ActivityStep {
      description: c[1].trim().to_string(),
      duration: c[2].trim().to_string(),
    })
    .filter(|s| !s.description.is_empty())
    .collect();

  if steps.is_empty() {
    steps = paragraph_steps(rest);
  }
  (description, steps)
}

/// Paragraph heuristic: blank-line-separated paragraphs become steps when
/// at least two remain. Paragraphs starting with "Paso" are malformed
/// primary-pattern misses, not real step paragraphs, and are dropped.
fn paragraph_steps(block: &str) -> Vec<ActivityStep> {
  let paragraphs: Vec<&str> = PARAGRAPH_BREAK
    .split(block)
    .map(str::trim)
    .filter(|p| !p.is_empty() && !PARAGRAPH_PASO.is_match(p))
    .collect();
  if paragraphs.len() < 2 {
    return Vec::new();
  }

  paragraphs
    .iter()
    .enumerate()
    .map(|(i, p)| match EMBEDDED_DURATION.captures(p) {
      Some(c) => {
        let duration = c[1].trim().to_string();
        let description = EMBEDDED_DURATION.replace(p, "").trim().to_string();
        ActivityStep { description, duration }
      }
      // Synthetic placeholder duration for the i-th paragraph, kept as-is
      // for compatibility with earlier generations of this feature.
      None => ActivityStep {
        description: p.to_string(),
        duration: format!("{}-{} minutos", 10 * (i + 1), 10 * (i + 1) + 5),
      },
    })
    .filter(|s| !s.description.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_invariants(a: &GeneratedActivity) {
    assert!(!a.name.trim().is_empty());
    assert!(!a.objective.trim().is_empty());
    assert!(!a.materials.is_empty());
    assert!(!a.development.steps.is_empty());
  }

  #[test]
  fn total_on_degenerate_inputs() {
    for s in ["", "   \n\t\n  ", "texto sin ninguna etiqueta conocida", "Paso", ":::"] {
      let a = parse(s);
      assert_invariants(&a);
    }
    assert_eq!(parse("").name, FALLBACK_NAME);
    assert_eq!(parse("").objective, FALLBACK_OBJECTIVE);
    assert_eq!(parse("").materials, vec![FALLBACK_MATERIAL.to_string()]);
    assert_eq!(parse("").development.steps, fallback_steps());
  }

  #[test]
  fn name_label_wins_over_heading() {
    assert_eq!(parse("Nombre: Foo\nObjetivo: Bar").name, "Foo");
    assert_eq!(parse("# Foo\nObjetivo: Bar").name, "Foo");
    assert_eq!(parse("Título: Sombras\ntexto").name, "Sombras");
  }

  #[test]
  fn name_falls_back_to_first_nonempty_line() {
    assert_eq!(parse("\n\n  Una actividad de lectura\nmás texto").name, "Una actividad de lectura");
  }

  #[test]
  fn whitespace_only_label_value_is_a_miss() {
    // "Nombre:" with only spaces behind it falls through to the heading.
    assert_eq!(parse("Nombre:   \n# Respaldo").name, "Respaldo");
  }

  #[test]
  fn objective_is_bounded_by_next_header() {
    let a = parse("Objetivo: Mejorar la atención\nsostenida en clase\nMateriales:\n- Fichas");
    assert_eq!(a.objective, "Mejorar la atención\nsostenida en clase");
  }

  #[test]
  fn embedded_label_mid_sentence_does_not_open_a_section() {
    let a = parse("Objetivo: repasar los materiales: fichas y tarjetas\nDesarrollo:\nx");
    assert_eq!(a.objective, "repasar los materiales: fichas y tarjetas");
  }

  #[test]
  fn materials_split_on_list_delimiters() {
    let a = parse("Materiales:\n- A\n- B\nDesarrollo: ...");
    assert_eq!(a.materials, vec!["A".to_string(), "B".to_string()]);

    let b = parse("Materiales:\n1. Papel\n2. Tijeras\n• Pegamento\nPasos: ...");
    assert_eq!(b.materials, vec!["Papel".to_string(), "Tijeras".to_string(), "Pegamento".to_string()]);
  }

  #[test]
  fn materials_without_delimiters_become_one_item() {
    let a = parse("Recursos: papel y lápices de colores\nDesarrollo: x");
    assert_eq!(a.materials, vec!["papel y lápices de colores".to_string()]);
  }

  #[test]
  fn structured_steps_with_durations() {
    let a = parse("Desarrollo:\nPaso 1: Haz X (10-15 minutos)\nPaso 2: Haz Y (20 minutos)");
    assert_eq!(
      a.development.steps,
      vec![
        ActivityStep { description: "Haz X".into(), duration: "10-15 minutos".into() },
        ActivityStep { description: "Haz Y".into(), duration: "20 minutos".into() },
      ]
    );
  }

  #[test]
  fn bare_numbered_steps_also_match() {
    let a = parse("Pasos:\n1. Observar la lámina (5 minutos)\n2: Comentar en parejas (10 minutos)");
    assert_eq!(a.development.steps.len(), 2);
    assert_eq!(a.development.steps[0].description, "Observar la lámina");
    assert_eq!(a.development.steps[1].duration, "10 minutos");
  }

  #[test]
  fn description_prefix_before_first_marker() {
    let a = parse("Desarrollo:\nTrabajo en grupos pequeños.\nPaso 1: Repartir roles (5 minutos)\nPaso 2: Ensayar (15 minutos)");
    assert_eq!(a.development.description, "Trabajo en grupos pequeños.");
    assert_eq!(a.development.steps.len(), 2);
  }

  #[test]
  fn single_unstructured_block_yields_skeleton() {
    let a = parse("Desarrollo:\nuna sola línea sin pasos numerados");
    assert_eq!(a.development.steps, fallback_steps());
    assert!(a.development.description.is_empty());
  }

  #[test]
  fn paragraph_fallback_synthesizes_durations() {
    let a = parse("Desarrollo:\nPrimero se presenta el tema.\n\nLuego se trabaja en parejas.\n\nAl final se comparte (15 minutos)");
    let steps = &a.development.steps;
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].duration, "10-15 minutos");
    assert_eq!(steps[1].duration, "20-25 minutos");
    assert_eq!(steps[2].description, "Al final se comparte");
    assert_eq!(steps[2].duration, "15 minutos");
  }

  #[test]
  fn malformed_paso_paragraphs_are_discarded() {
    // "Paso" paragraphs without the parenthesized duration match neither
    // tier, so the skeleton applies.
    let a = parse("Desarrollo:\nPaso 1: algo sin duración\n\nPaso 2: más texto");
    assert_eq!(a.development.steps, fallback_steps());
  }

  #[test]
  fn end_to_end_scenario() {
    let raw = "Nombre: Mapa Visual\nObjetivo: Mejorar comprensión\nMateriales:\n- Papel\n- Marcadores\nDesarrollo:\nPaso 1: Introducir el tema (10-15 minutos)\nPaso 2: Crear el mapa (20-30 minutos)";
    let a = parse(raw);
    assert_eq!(a.name, "Mapa Visual");
    assert_eq!(a.objective, "Mejorar comprensión");
    assert_eq!(a.materials, vec!["Papel".to_string(), "Marcadores".to_string()]);
    assert_eq!(
      a.development.steps,
      vec![
        ActivityStep { description: "Introducir el tema".into(), duration: "10-15 minutos".into() },
        ActivityStep { description: "Crear el mapa".into(), duration: "20-30 minutos".into() },
      ]
    );
  }
}
