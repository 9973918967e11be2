//! Wizard matching: filter the activity catalog against the teacher's
//! current barrier/style selection, and resolve display names by id.
//!
//! Both functions are pure and deterministic; callers own all selection
//! state and simply re-invoke on every change.

use std::collections::HashSet;

use crate::domain::{Activity, Named};

/// Sentinel shown when a referenced id no longer resolves (deleted
/// out-of-band). The UI must never render a blank name.
pub const UNKNOWN_NAME: &str = "Desconocido";

/// Keep the activities that address `target_barrier_id` and cover every
/// selected learning style. Single linear pass; input order is preserved
/// and nothing is deduplicated.
///
/// An empty style selection is vacuously satisfied by every activity (the
/// barrier test still applies). Treating an empty selection as "not ready
/// to filter" is the caller's job, not enforced here.
pub fn filter_activities<'a>(
  activities: &'a [Activity],
  target_barrier_id: &str,
  target_learning_style_ids: &HashSet<String>,
) -> Vec<&'a Activity> {
  activities
    .iter()
    .filter(|a| a.barrier_ids.contains(target_barrier_id))
    .filter(|a| target_learning_style_ids.is_subset(&a.learning_style_ids))
    .collect()
}

/// Resolve an id to its display name, or the `"Desconocido"` sentinel when
/// no entry carries that id.
pub fn lookup_name<T: Named>(id: &str, collection: &[T]) -> String {
  collection
    .iter()
    .find(|item| item.id() == id)
    .map(|item| item.name().to_string())
    .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ActivityDevelopment, Barrier};

  fn activity(id: &str, barriers: &[&str], styles: &[&str]) -> Activity {
    Activity {
      id: id.into(),
      name: format!("actividad {id}"),
      objective: String::new(),
      materials: vec![],
      development: ActivityDevelopment::default(),
      barrier_ids: barriers.iter().map(|s| s.to_string()).collect(),
      learning_style_ids: styles.iter().map(|s| s.to_string()).collect(),
    }
  }

  fn styles(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn barrier_membership_and_style_superset() {
    let acts = vec![activity("a", &["b1"], &["s1", "s2"])];

    assert_eq!(filter_activities(&acts, "b1", &styles(&["s1"])).len(), 1);
    // s3 is not addressed by the activity: not a superset.
    assert!(filter_activities(&acts, "b1", &styles(&["s1", "s3"])).is_empty());
    // Wrong barrier.
    assert!(filter_activities(&acts, "b2", &styles(&["s1"])).is_empty());
  }

  #[test]
  fn multi_barrier_activity_matches_on_any_one() {
    let acts = vec![activity("a", &["b1", "b2", "b3"], &["s1"])];
    assert_eq!(filter_activities(&acts, "b2", &styles(&["s1"])).len(), 1);
  }

  #[test]
  fn empty_style_selection_is_vacuously_true() {
    let acts = vec![activity("a", &["b1"], &[]), activity("b", &["b2"], &["s1"])];
    let hits = filter_activities(&acts, "b1", &styles(&[]));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a");
  }

  #[test]
  fn order_is_preserved() {
    let acts = vec![
      activity("a", &["b1"], &["s1"]),
      activity("b", &["b2"], &["s1"]),
      activity("c", &["b1"], &["s1", "s2"]),
      activity("d", &["b1"], &["s1"]),
    ];
    let ids: Vec<&str> = filter_activities(&acts, "b1", &styles(&["s1"]))
      .iter()
      .map(|a| a.id.as_str())
      .collect();
    assert_eq!(ids, vec!["a", "c", "d"]);
  }

  #[test]
  fn lookup_hits_and_misses() {
    let barriers = vec![Barrier {
      id: "b1".into(),
      name: "Dificultad lectora".into(),
      description: String::new(),
    }];
    assert_eq!(lookup_name("b1", &barriers), "Dificultad lectora");
    assert_eq!(lookup_name("nonexistent-id", &barriers), UNKNOWN_NAME);
    assert_eq!(lookup_name("nonexistent-id", &Vec::<Barrier>::new()), UNKNOWN_NAME);
  }
}
