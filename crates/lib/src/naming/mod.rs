//! Name derivation for specifications.
//!
//! Every identifier used for a spec's tasks, packages and source set is a pure
//! function of its base name. Because several base names can normalize to the
//! same identifier (`orders-api` and `orders_api` both give `generate-OrdersApi`),
//! [`check_collisions`] must pass before a graph is built.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::consts::RESERVED_TASKS;
use crate::discovery::SpecDescriptor;

/// Prefix of per-spec generate task ids.
pub const GENERATE_PREFIX: &str = "generate";

/// Prefix of per-spec package task ids.
pub const JAR_PREFIX: &str = "jar";

/// All identifiers derived from one specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedNames {
  pub package_name: String,
  pub generate_task_id: String,
  pub compile_task_id: String,
  pub jar_task_id: String,
  pub source_unit_name: String,
}

impl DerivedNames {
  /// Derive all names for a base name.
  pub fn derive(base_name: &str) -> Self {
    Self {
      package_name: package_name(base_name),
      generate_task_id: task_name(GENERATE_PREFIX, base_name),
      compile_task_id: compile_task_name(base_name),
      jar_task_id: task_name(JAR_PREFIX, base_name),
      source_unit_name: source_unit_name(base_name),
    }
  }

  /// Derive all names for a discovered spec.
  pub fn for_spec(spec: &SpecDescriptor) -> Self {
    Self::derive(&spec.base_name)
  }

  fn entries(&self) -> [(IdentifierKind, &str); 4] {
    [
      (IdentifierKind::SourceUnit, self.source_unit_name.as_str()),
      (IdentifierKind::GenerateTask, self.generate_task_id.as_str()),
      (IdentifierKind::CompileTask, self.compile_task_id.as_str()),
      (IdentifierKind::JarTask, self.jar_task_id.as_str()),
    ]
  }
}

/// Java package segment for a spec.
///
/// Takes everything before the first `-` and lowercases it. No other
/// normalization is applied, so `_` and `.` survive into the package.
pub fn package_name(name: &str) -> String {
  let before_dash = name.split('-').next().unwrap_or(name);
  before_dash.to_lowercase()
}

/// Task id of the form `<prefix>-<PascalCasedName>`.
///
/// The name is split on runs of non-alphanumeric characters, empty segments
/// are dropped and each segment gets its first character upper-cased.
pub fn task_name(prefix: &str, name: &str) -> String {
  let prepared: String = name
    .split(|c: char| !c.is_ascii_alphanumeric())
    .filter(|segment| !segment.is_empty())
    .map(capitalize)
    .collect();

  format!("{}-{}", prefix, prepared)
}

/// Id of the isolated compile task for a spec, e.g. `compileOrdersJava`.
pub fn compile_task_name(name: &str) -> String {
  format!("compile{}Java", capitalize(name))
}

/// Name of the isolated source set for a spec.
pub fn source_unit_name(name: &str) -> String {
  name.to_string()
}

/// Upper-case the first character, leave the rest untouched.
pub(crate) fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// A spec paired with its derived names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedSpec {
  pub spec: SpecDescriptor,
  pub names: DerivedNames,
}

/// Which derived identifier collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum IdentifierKind {
  SourceUnit,
  GenerateTask,
  CompileTask,
  JarTask,
}

impl std::fmt::Display for IdentifierKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      IdentifierKind::SourceUnit => write!(f, "source unit"),
      IdentifierKind::GenerateTask => write!(f, "generate task"),
      IdentifierKind::CompileTask => write!(f, "compile task"),
      IdentifierKind::JarTask => write!(f, "jar task"),
    }
  }
}

/// One identifier claimed by more than one spec, or by a spec and a fixed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
  pub kind: IdentifierKind,
  pub identifier: String,
  /// Base names of the specs claiming the identifier. A reserved task id
  /// appears here as `<reserved>`.
  pub claimants: Vec<String>,
}

impl std::fmt::Display for Collision {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} '{}' is derived from: {}",
      self.kind,
      self.identifier,
      self.claimants.join(", ")
    )
  }
}

/// Errors from name validation.
#[derive(Debug, Error)]
pub enum NamingError {
  /// Two or more specs normalize to the same identifier.
  #[error("naming collision:\n  {}", format_collisions(.0))]
  Collision(Vec<Collision>),
}

fn format_collisions(collisions: &[Collision]) -> String {
  collisions.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n  ")
}

const RESERVED_CLAIMANT: &str = "<reserved>";

/// Check that no two specs share a derived identifier.
///
/// Every identifier kind is checked independently, and every task id is also
/// checked against the fixed task ids. All collisions are reported together.
pub fn check_collisions(specs: &[SpecDescriptor]) -> Result<Vec<NamedSpec>, NamingError> {
  let named: Vec<NamedSpec> = specs
    .iter()
    .map(|spec| NamedSpec {
      spec: spec.clone(),
      names: DerivedNames::for_spec(spec),
    })
    .collect();

  let mut claims: BTreeMap<(IdentifierKind, String), Vec<String>> = BTreeMap::new();
  for NamedSpec { spec, names } in &named {
    for (kind, identifier) in names.entries() {
      let claimants = claims.entry((kind, identifier.to_string())).or_default();
      claimants.push(spec.base_name.clone());
      if kind != IdentifierKind::SourceUnit && RESERVED_TASKS.contains(&identifier) && claimants.len() == 1 {
        claimants.push(RESERVED_CLAIMANT.to_string());
      }
    }
  }

  let collisions: Vec<Collision> = claims
    .into_iter()
    .filter(|(_, claimants)| claimants.len() > 1)
    .map(|((kind, identifier), claimants)| Collision {
      kind,
      identifier,
      claimants,
    })
    .collect();

  if collisions.is_empty() {
    Ok(named)
  } else {
    Err(NamingError::Collision(collisions))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn spec(name: &str) -> SpecDescriptor {
    SpecDescriptor::from_path(format!("/specs/{}.yaml", name)).unwrap()
  }

  #[test]
  fn task_name_pascal_cases_segments() {
    assert_eq!(task_name("generate", "person-api-v2"), "generate-PersonApiV2");
    assert_eq!(task_name("jar", "orders"), "jar-Orders");
  }

  #[test]
  fn task_name_collapses_separator_runs() {
    assert_eq!(task_name("generate", "--person__api..v2--"), "generate-PersonApiV2");
    assert_eq!(task_name("jar", "camelCase-name"), "jar-CamelCaseName");
  }

  #[test]
  fn task_name_of_separators_only_is_bare_prefix() {
    assert_eq!(task_name("jar", "---"), "jar-");
  }

  #[test]
  fn package_name_lowercases_before_first_dash() {
    assert_eq!(package_name("billing-service"), "billing");
    assert_eq!(package_name("Person-API"), "person");
    assert_eq!(package_name("orders"), "orders");
    assert_eq!(package_name("UPPER_case-x"), "upper_case");
  }

  #[test]
  fn package_name_keeps_punctuation() {
    assert_eq!(package_name("abc]XYZ-service"), "abc]xyz");
  }

  #[test]
  fn package_name_of_leading_dash_is_empty() {
    assert_eq!(package_name("-service"), "");
  }

  #[test]
  fn compile_task_capitalizes_first_char_only() {
    assert_eq!(compile_task_name("person-api"), "compilePerson-apiJava");
    assert_eq!(compile_task_name("orders"), "compileOrdersJava");
  }

  #[test]
  fn derived_names_for_spec() {
    let names = DerivedNames::for_spec(&spec("person-api-v2"));
    assert_eq!(
      names,
      DerivedNames {
        package_name: "person".to_string(),
        generate_task_id: "generate-PersonApiV2".to_string(),
        compile_task_id: "compilePerson-api-v2Java".to_string(),
        jar_task_id: "jar-PersonApiV2".to_string(),
        source_unit_name: "person-api-v2".to_string(),
      }
    );
  }

  #[test]
  fn distinct_specs_pass() {
    let specs = vec![spec("orders"), spec("person-api"), spec("billing-service")];
    let derived = check_collisions(&specs).unwrap();
    assert_eq!(derived.len(), 3);
    assert_eq!(derived[1].names.generate_task_id, "generate-PersonApi");
    assert_eq!(derived[1].spec.base_name, "person-api");
  }

  #[test]
  fn normalized_task_ids_collide() {
    let specs = vec![spec("orders-api"), spec("orders_api")];
    let err = check_collisions(&specs).unwrap_err();
    let NamingError::Collision(collisions) = &err;

    let kinds: Vec<IdentifierKind> = collisions.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![IdentifierKind::GenerateTask, IdentifierKind::JarTask]);
    assert_eq!(collisions[0].identifier, "generate-OrdersApi");
    assert_eq!(collisions[0].claimants, vec!["orders-api", "orders_api"]);

    let message = err.to_string();
    assert!(message.contains("generate task 'generate-OrdersApi'"));
    assert!(message.contains("jar task 'jar-OrdersApi'"));
  }

  #[test]
  fn same_base_name_collides_everywhere() {
    let specs = vec![
      SpecDescriptor::from_path("/specs/orders.yaml").unwrap(),
      SpecDescriptor::from_path("/specs/orders.yml").unwrap(),
    ];
    let NamingError::Collision(collisions) = check_collisions(&specs).unwrap_err();
    assert_eq!(collisions.len(), 4);
  }

  #[test]
  fn case_only_difference_collides_on_compile_task() {
    let specs = vec![spec("orders"), spec("Orders")];
    let NamingError::Collision(collisions) = check_collisions(&specs).unwrap_err();
    assert!(collisions.iter().any(|c| c.identifier == "compileOrdersJava"));
    assert!(collisions.iter().all(|c| c.kind != IdentifierKind::SourceUnit));
  }

  #[test]
  fn empty_input_has_no_collisions() {
    assert!(check_collisions(&[]).unwrap().is_empty());
  }
}
