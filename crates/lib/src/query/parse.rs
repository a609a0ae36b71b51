//! Decoding of `--output=jsonproto` query results.
//!
//! The build tool prints its `build.proto` messages in proto3 JSON form:
//! field names are lowerCamelCase, enums are spelled by name, and fields at
//! their default value are omitted. Every raw field is therefore optional
//! here and defaulted.
//!
//! Both result shapes are accepted:
//! - `cquery`: `{"results": [{"target": {...}, "configuration": {...}}]}`
//! - `query`: `{"target": [{...}, {...}]}`

use serde::Deserialize;
use tracing::warn;

use super::types::{Attribute, AttributeValue, Rule, Target, Tristate};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQueryResults {
  #[serde(default)]
  results: Vec<RawConfiguredTarget>,
  #[serde(default)]
  target: Vec<RawTarget>,
}

#[derive(Debug, Deserialize)]
struct RawConfiguredTarget {
  target: OneOrMany<RawTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
  One(T),
  Many(Vec<T>),
}

impl<T> OneOrMany<T> {
  fn into_vec(self) -> Vec<T> {
    match self {
      OneOrMany::One(item) => vec![item],
      OneOrMany::Many(items) => items,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTarget {
  #[serde(rename = "type")]
  kind: String,
  rule: Option<RawRule>,
  source_file: Option<RawFile>,
  generated_file: Option<RawFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
  name: String,
  #[serde(default)]
  rule_class: String,
  #[serde(default)]
  attribute: Vec<RawAttribute>,
  #[serde(default)]
  rule_input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
  name: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry<V> {
  #[serde(default)]
  key: String,
  value: Option<V>,
}

impl<V: Default> RawEntry<V> {
  fn into_pair(self) -> (String, V) {
    (self.key, self.value.unwrap_or_default())
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttribute {
  name: String,
  #[serde(rename = "type")]
  kind: String,
  #[serde(default)]
  int_value: i64,
  #[serde(default)]
  int_list_value: Vec<i64>,
  #[serde(default)]
  boolean_value: bool,
  #[serde(default)]
  tristate_value: Tristate,
  #[serde(default)]
  string_value: String,
  #[serde(default)]
  string_list_value: Vec<String>,
  #[serde(default)]
  string_dict_value: Vec<RawEntry<String>>,
  #[serde(default)]
  label_dict_unary_value: Vec<RawEntry<String>>,
  #[serde(default)]
  label_keyed_string_dict_value: Vec<RawEntry<String>>,
  #[serde(default)]
  label_list_dict_value: Vec<RawEntry<Vec<String>>>,
  #[serde(default)]
  string_list_dict_value: Vec<RawEntry<Vec<String>>>,
}

fn pairs<V: Default>(entries: Vec<RawEntry<V>>) -> Vec<(String, V)> {
  entries.into_iter().map(RawEntry::into_pair).collect()
}

impl From<RawAttribute> for Attribute {
  fn from(raw: RawAttribute) -> Self {
    let value = match raw.kind.as_str() {
      "INTEGER" => AttributeValue::Integer(raw.int_value),
      "INTEGER_LIST" => AttributeValue::IntegerList(raw.int_list_value),
      "BOOLEAN" => AttributeValue::Boolean(raw.boolean_value),
      "TRISTATE" => AttributeValue::Tristate(raw.tristate_value),
      "STRING" => AttributeValue::String(raw.string_value),
      "LABEL" => AttributeValue::Label(raw.string_value),
      "OUTPUT" => AttributeValue::Output(raw.string_value),
      "STRING_LIST" => AttributeValue::StringList(raw.string_list_value),
      "LABEL_LIST" => AttributeValue::LabelList(raw.string_list_value),
      "OUTPUT_LIST" => AttributeValue::OutputList(raw.string_list_value),
      "DISTRIBUTION_SET" => AttributeValue::DistributionSet(raw.string_list_value),
      "STRING_DICT" => AttributeValue::StringDict(pairs(raw.string_dict_value)),
      "LABEL_DICT_UNARY" => AttributeValue::LabelDictUnary(pairs(raw.label_dict_unary_value)),
      "LABEL_KEYED_STRING_DICT" => AttributeValue::LabelKeyedStringDict(pairs(raw.label_keyed_string_dict_value)),
      "LABEL_LIST_DICT" => AttributeValue::LabelListDict(pairs(raw.label_list_dict_value)),
      "STRING_LIST_DICT" => AttributeValue::StringListDict(pairs(raw.string_list_dict_value)),
      "LICENSE" => AttributeValue::License,
      other => AttributeValue::Unsupported(other.to_string()),
    };

    Attribute { name: raw.name, value }
  }
}

impl RawTarget {
  /// Convert to a [`Target`], or `None` for discriminators that are not part
  /// of the build graph (package groups, environment groups).
  fn into_target(self) -> Option<Target> {
    match (self.kind.as_str(), self.rule, self.source_file, self.generated_file) {
      ("RULE", Some(rule), _, _) => Some(Target::Rule(Rule {
        name: rule.name,
        rule_class: rule.rule_class,
        attributes: rule.attribute.into_iter().map(Attribute::from).collect(),
        inputs: rule.rule_input,
      })),
      ("SOURCE_FILE", _, Some(file), _) => Some(Target::SourceFile { name: file.name }),
      ("GENERATED_FILE", _, _, Some(file)) => Some(Target::GeneratedFile { name: file.name }),
      (kind, ..) => {
        warn!(kind, "skipping query result with unsupported target type");
        None
      }
    }
  }
}

/// Parse the textual output of a `jsonproto` query into targets.
///
/// Output order is preserved; name uniqueness is not checked here.
pub fn parse_query_output(output: &str) -> Result<Vec<Target>, serde_json::Error> {
  if output.trim().is_empty() {
    return Ok(Vec::new());
  }

  let raw: RawQueryResults = serde_json::from_str(output)?;

  let configured = raw.results.into_iter().flat_map(|r| r.target.into_vec());
  Ok(configured.chain(raw.target).filter_map(RawTarget::into_target).collect())
}
