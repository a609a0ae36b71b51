//! Targets and attributes as reported by the dependency query.
//!
//! These values are produced once per query and never mutated. A [`Target`]
//! is keyed by its name, which is unique within one query universe.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Three-valued attribute flag (`stamp`, `linkstatic`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tristate {
  #[default]
  No,
  Yes,
  Auto,
}

impl Tristate {
  /// Canonical name of the value.
  pub fn as_str(&self) -> &'static str {
    match self {
      Tristate::No => "NO",
      Tristate::Yes => "YES",
      Tristate::Auto => "AUTO",
    }
  }
}

impl fmt::Display for Tristate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Payload of an attribute, one variant per type tag.
///
/// Dictionary variants keep their entries in query order; ordering is
/// normalized when the value is canonicalized for hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
  Integer(i64),
  IntegerList(Vec<i64>),
  Boolean(bool),
  Tristate(Tristate),
  String(String),
  Label(String),
  Output(String),
  StringList(Vec<String>),
  LabelList(Vec<String>),
  OutputList(Vec<String>),
  DistributionSet(Vec<String>),
  StringDict(Vec<(String, String)>),
  LabelDictUnary(Vec<(String, String)>),
  LabelKeyedStringDict(Vec<(String, String)>),
  LabelListDict(Vec<(String, Vec<String>)>),
  StringListDict(Vec<(String, Vec<String>)>),
  License,
  /// A type tag with no canonical form (selector lists, fileset entries, ...).
  /// Carries the tag as reported by the query tool.
  Unsupported(String),
}

impl AttributeValue {
  /// Type tag as spelled by the query tool.
  pub fn type_tag(&self) -> &str {
    match self {
      AttributeValue::Integer(_) => "INTEGER",
      AttributeValue::IntegerList(_) => "INTEGER_LIST",
      AttributeValue::Boolean(_) => "BOOLEAN",
      AttributeValue::Tristate(_) => "TRISTATE",
      AttributeValue::String(_) => "STRING",
      AttributeValue::Label(_) => "LABEL",
      AttributeValue::Output(_) => "OUTPUT",
      AttributeValue::StringList(_) => "STRING_LIST",
      AttributeValue::LabelList(_) => "LABEL_LIST",
      AttributeValue::OutputList(_) => "OUTPUT_LIST",
      AttributeValue::DistributionSet(_) => "DISTRIBUTION_SET",
      AttributeValue::StringDict(_) => "STRING_DICT",
      AttributeValue::LabelDictUnary(_) => "LABEL_DICT_UNARY",
      AttributeValue::LabelKeyedStringDict(_) => "LABEL_KEYED_STRING_DICT",
      AttributeValue::LabelListDict(_) => "LABEL_LIST_DICT",
      AttributeValue::StringListDict(_) => "STRING_LIST_DICT",
      AttributeValue::License => "LICENSE",
      AttributeValue::Unsupported(tag) => tag,
    }
  }
}

/// A named rule attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
  pub name: String,
  pub value: AttributeValue,
}

impl Attribute {
  pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
    Self {
      name: name.into(),
      value,
    }
  }
}

/// A build rule and the names of the targets it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
  pub name: String,
  /// Rule kind (`cc_library`, `genrule`, ...). Informational only; the kind
  /// is not folded into the hash.
  pub rule_class: String,
  pub attributes: Vec<Attribute>,
  /// Declared dependency names, in query order.
  pub inputs: Vec<String>,
}

/// A node of the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
  Rule(Rule),
  /// A file tracked in version control.
  SourceFile { name: String },
  /// A file produced by another rule's build step.
  GeneratedFile { name: String },
}

impl Target {
  /// The target's unique name within its query universe.
  pub fn name(&self) -> &str {
    match self {
      Target::Rule(rule) => &rule.name,
      Target::SourceFile { name } | Target::GeneratedFile { name } => name,
    }
  }

  /// Dependency names declared by this target. Files declare none.
  pub fn declared_deps(&self) -> &[String] {
    match self {
      Target::Rule(rule) => &rule.inputs,
      Target::SourceFile { .. } | Target::GeneratedFile { .. } => &[],
    }
  }

  /// Short description of the variant, for display.
  pub fn kind(&self) -> &str {
    match self {
      Target::Rule(rule) => &rule.rule_class,
      Target::SourceFile { .. } => "source file",
      Target::GeneratedFile { .. } => "generated file",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_per_variant() {
    let rule = Target::Rule(Rule {
      name: "//app:bin".to_string(),
      rule_class: "cc_binary".to_string(),
      attributes: vec![],
      inputs: vec!["//app:main.cc".to_string()],
    });
    let source = Target::SourceFile {
      name: "//app:main.cc".to_string(),
    };
    let generated = Target::GeneratedFile {
      name: "//app:bin.stripped".to_string(),
    };

    assert_eq!(rule.name(), "//app:bin");
    assert_eq!(source.name(), "//app:main.cc");
    assert_eq!(generated.name(), "//app:bin.stripped");
  }

  #[test]
  fn only_rules_declare_deps() {
    let rule = Target::Rule(Rule {
      name: "//a".to_string(),
      rule_class: "filegroup".to_string(),
      attributes: vec![],
      inputs: vec!["//b".to_string(), "//c".to_string()],
    });
    let source = Target::SourceFile { name: "//a:x".to_string() };

    assert_eq!(rule.declared_deps(), ["//b".to_string(), "//c".to_string()]);
    assert!(source.declared_deps().is_empty());
  }

  #[test]
  fn type_tags_round_trip_query_spelling() {
    assert_eq!(AttributeValue::LabelKeyedStringDict(vec![]).type_tag(), "LABEL_KEYED_STRING_DICT");
    assert_eq!(AttributeValue::Unsupported("SELECTOR_LIST".to_string()).type_tag(), "SELECTOR_LIST");
  }
}
