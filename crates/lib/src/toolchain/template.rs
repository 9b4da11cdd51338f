//! Argument templates for external tools.
//!
//! Each command is configured as a list of arguments that may contain
//! `{name}` placeholders:
//!
//! - `{input}`, `{output}`: input/output path of the step
//! - `{generator}`: generator name
//! - `{options}`: generator options as comma-joined `key=value` pairs
//! - `{classpath}`: classpath joined with the platform path separator
//! - `{destination}`: compiler output directory
//! - `{sources}`: every source file; only valid as a whole argument, where it
//!   expands to one argument per file
//!
//! Use `{{` and `}}` for literal braces.
//!
//! # Example
//!
//! ```
//! use specbuild_lib::toolchain::template::{Bindings, expand};
//!
//! let mut bindings = Bindings::default();
//! bindings.set("output", "/tmp/out.jar");
//! bindings.set_many("sources", vec!["A.java".to_string(), "B.java".to_string()]);
//!
//! let args = vec!["cf".to_string(), "{output}".to_string(), "{sources}".to_string()];
//! assert_eq!(expand(&args, &bindings).unwrap(), vec!["cf", "/tmp/out.jar", "A.java", "B.java"]);
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

/// A segment of a parsed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text
  Literal(String),

  /// A `{name}` placeholder
  Placeholder(String),
}

/// Errors that can occur during template parsing or expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("unmatched '}}' at position {0}")]
  Unmatched(usize),

  #[error("empty placeholder at position {0}")]
  Empty(usize),

  #[error("unknown placeholder: {0}")]
  Unknown(String),

  #[error("placeholder {{{0}}} expands to several arguments and must stand alone")]
  MultiValueInline(String),
}

/// Parse one argument into segments.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, c)) = chars.next() {
    match c {
      '{' if matches!(chars.peek(), Some((_, '{'))) => {
        chars.next();
        literal.push('{');
      }
      '}' if matches!(chars.peek(), Some((_, '}'))) => {
        chars.next();
        literal.push('}');
      }
      '{' => {
        let mut name = String::new();
        let mut closed = false;
        for (_, c) in chars.by_ref() {
          if c == '}' {
            closed = true;
            break;
          }
          name.push(c);
        }
        if !closed {
          return Err(TemplateError::Unclosed(pos));
        }
        if name.is_empty() {
          return Err(TemplateError::Empty(pos));
        }
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Placeholder(name));
      }
      '}' => return Err(TemplateError::Unmatched(pos)),
      c => literal.push(c),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
  values: BTreeMap<String, Vec<String>>,
}

impl Bindings {
  /// Bind a single value.
  pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
    self.values.insert(name.to_string(), vec![value.into()]);
    self
  }

  /// Bind a list of values, expanded to one argument each.
  pub fn set_many(&mut self, name: &str, values: Vec<String>) -> &mut Self {
    self.values.insert(name.to_string(), values);
    self
  }

  fn get(&self, name: &str) -> Result<&[String], TemplateError> {
    self
      .values
      .get(name)
      .map(Vec::as_slice)
      .ok_or_else(|| TemplateError::Unknown(name.to_string()))
  }
}

/// Expand every argument of a command template.
pub fn expand(args: &[String], bindings: &Bindings) -> Result<Vec<String>, TemplateError> {
  let mut out = Vec::with_capacity(args.len());

  for arg in args {
    let segments = parse(arg)?;

    // A lone placeholder splices all of its values
    if let [Segment::Placeholder(name)] = segments.as_slice() {
      out.extend(bindings.get(name)?.iter().cloned());
      continue;
    }

    let mut expanded = String::new();
    for segment in &segments {
      match segment {
        Segment::Literal(text) => expanded.push_str(text),
        Segment::Placeholder(name) => match bindings.get(name)? {
          [value] => expanded.push_str(value),
          [] => {}
          _ => return Err(TemplateError::MultiValueInline(name.clone())),
        },
      }
    }
    out.push(expanded);
  }

  Ok(out)
}
