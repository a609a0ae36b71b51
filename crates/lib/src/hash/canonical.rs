//! Canonical string form of rule attributes.
//!
//! The canonical form is byte-identical for semantically identical values and
//! changes whenever a build-relevant part of the value changes:
//! - list order is kept (it is significant to the build)
//! - dictionary entries are sorted (their order is not)
//! - license metadata is always empty
//!
//! Attributes without a canonical form are rejected. Skipping them would hide
//! real changes behind an unchanged hash.

use thiserror::Error;

use crate::query::{Attribute, AttributeValue};

/// An attribute whose type tag has no canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported attribute type {kind} for attribute '{attribute}'")]
pub struct UnsupportedAttribute {
  pub attribute: String,
  pub kind: String,
}

/// Render an attribute's value for hashing.
pub fn canonicalize(attr: &Attribute) -> Result<String, UnsupportedAttribute> {
  let canonical = match &attr.value {
    AttributeValue::Integer(value) => value.to_string(),
    AttributeValue::IntegerList(values) => values.iter().map(i64::to_string).collect::<Vec<_>>().join(","),
    AttributeValue::Boolean(value) => value.to_string(),
    AttributeValue::Tristate(value) => value.as_str().to_string(),
    AttributeValue::String(value) | AttributeValue::Label(value) | AttributeValue::Output(value) => value.clone(),
    AttributeValue::StringList(values)
    | AttributeValue::LabelList(values)
    | AttributeValue::OutputList(values)
    | AttributeValue::DistributionSet(values) => values.join(","),
    AttributeValue::StringDict(entries)
    | AttributeValue::LabelDictUnary(entries)
    | AttributeValue::LabelKeyedStringDict(entries) => {
      sorted_entries(entries.iter().map(|(key, value)| format!("{}={}", key, value)))
    }
    AttributeValue::LabelListDict(entries) | AttributeValue::StringListDict(entries) => {
      sorted_entries(entries.iter().map(|(key, values)| format!("{}={}", key, values.join(":"))))
    }
    AttributeValue::License => String::new(),
    AttributeValue::Unsupported(_) => {
      return Err(UnsupportedAttribute {
        attribute: attr.name.clone(),
        kind: attr.value.type_tag().to_string(),
      });
    }
  };

  Ok(canonical)
}

fn sorted_entries(entries: impl Iterator<Item = String>) -> String {
  let mut entries: Vec<String> = entries.collect();
  entries.sort();
  entries.join(",")
}
