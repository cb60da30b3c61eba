//! Rule document types.
//!
//! A rule document maps record tags (`"LDR"` for the leader, otherwise the
//! 3-digit tag) to an ordered list of [`FieldRule`]s. It is plain data: the
//! [`RecordMapper`](super::RecordMapper) interprets it, nothing here executes.
//!
//! ```
//! use marc_rules::mapping::RuleDocument;
//!
//! let rules = RuleDocument::from_json(r#"{
//!     "001": [{ "target": "hrid", "subfield": [], "rules": [] }],
//!     "245": [{
//!         "target": "title",
//!         "subfield": ["a", "b"],
//!         "rules": [{ "conditions": [{ "type": "trim_period, trim" }] }]
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(rules.field_rules("245").unwrap()[0].subfield, vec!['a', 'b']);
//! assert!(rules.field_rules("650").is_none());
//! ```

use crate::error::{MarcError, Result};
use crate::field_query::IndicatorFilter;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rule-document key for the leader.
pub const LEADER_KEY: &str = "LDR";

/// Function name of the scripting hook.
pub const CUSTOM_FUNCTION: &str = "custom";

/// Free-form parameter bag passed to functions.
pub type Parameters = IndexMap<String, serde_json::Value>;

/// Per-tag rule lists, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleDocument {
    entries: IndexMap<String, Vec<FieldRule>>,
}

impl RuleDocument {
    /// Parse a rule document from JSON.
    ///
    /// Malformed entries (a key that is neither `LDR` nor a 3-character tag,
    /// a rule with neither target nor entity, nested groups) are logged and
    /// dropped; the rest of the document is kept.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Json`] if the text does not parse as a rule document.
    pub fn from_json(text: &str) -> Result<Self> {
        let parsed: IndexMap<String, Vec<FieldRule>> = serde_json::from_str(text)?;
        let mut entries = IndexMap::with_capacity(parsed.len());
        for (tag, rules) in parsed {
            if tag != LEADER_KEY && tag.len() != 3 {
                warn!(tag = %tag, "Rule key is neither LDR nor a 3-character tag; dropped");
                continue;
            }
            let rules: Vec<FieldRule> = rules
                .into_iter()
                .filter(|rule| match rule.check_shape(&tag) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(tag = %tag, error = %e, "Malformed field rule dropped");
                        false
                    },
                })
                .collect();
            entries.insert(tag, rules);
        }
        Ok(RuleDocument { entries })
    }

    /// Field rules for a tag, if the document has any.
    #[must_use]
    pub fn field_rules(&self, tag: &str) -> Option<&[FieldRule]> {
        self.entries.get(tag).map(Vec::as_slice)
    }

    /// Add (or replace) the rules for a tag.
    pub fn insert(&mut self, tag: impl Into<String>, rules: Vec<FieldRule>) {
        self.entries.insert(tag.into(), rules);
    }

    /// Iterate over `(tag, rules)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldRule])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// How one tag's content becomes one or more entity values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRule {
    /// Dotted target path on the entity
    pub target: Option<String>,
    /// Human-readable note, ignored by the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Subfield codes feeding this rule
    pub subfield: Vec<char>,
    /// Ordered transformation rules
    pub rules: Vec<MappingRule>,
    /// Field rules that together populate one entity instance
    pub entity: Vec<FieldRule>,
    /// Start a new instance per repeated occurrence of the grouped subfields
    pub entity_per_repeated_subfield: bool,
    /// Map only the first field with this tag
    pub ignore_subsequent_fields: bool,
    /// Map only the first occurrence of each subfield code within a field
    pub ignore_subsequent_subfields: bool,
    /// Do not strip a trailing backslash during normalization
    pub keep_trailing_backslash: bool,
    /// Run the rules once on the joined value instead of per subfield
    pub apply_rules_on_concatenated_data: bool,
    /// Skip unless the field has at least one of these codes
    pub required_subfield: Vec<char>,
    /// Skip if the field has any of these codes
    pub exclusive_subfield: Vec<char>,
    /// Only fields with matching indicators use this rule
    pub indicators: Option<IndicatorFilter>,
    /// Delimiter buckets
    pub sub_field_delimiter: Vec<DelimiterSpec>,
    /// Expand one subfield occurrence into several before mapping
    pub sub_field_split: Option<SplitSpec>,
    /// Rule used when this one produces an empty value
    pub alternative_mapping: Option<Box<FieldRule>>,
}

impl FieldRule {
    /// Create a plain rule for a target and subfield codes.
    #[must_use]
    pub fn new(target: impl Into<String>, subfield: &[char]) -> Self {
        FieldRule {
            target: Some(target.into()),
            subfield: subfield.to_vec(),
            ..FieldRule::default()
        }
    }

    /// Whether this rule is an entity group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        !self.entity.is_empty()
    }

    /// Check the required/exclusive subfield constraints against a field's codes.
    #[must_use]
    pub fn accepts_codes(&self, has_code: impl Fn(char) -> bool) -> bool {
        let required_ok = self.required_subfield.is_empty()
            || self.required_subfield.iter().any(|&c| has_code(c));
        let exclusive_ok = !self.exclusive_subfield.iter().any(|&c| has_code(c));
        required_ok && exclusive_ok
    }

    /// Whether any condition in this rule calls the scripting hook.
    #[must_use]
    pub fn uses_script(&self) -> bool {
        self.rules.iter().any(MappingRule::uses_script)
    }

    fn check_shape(&self, tag: &str) -> Result<()> {
        if self.is_group() {
            for inner in &self.entity {
                if inner.is_group() {
                    return Err(MarcError::RuleDocument(format!(
                        "tag {tag}: entity groups cannot nest"
                    )));
                }
                inner.check_shape(tag)?;
            }
        } else if self.target.is_none() {
            return Err(MarcError::RuleDocument(format!(
                "tag {tag}: rule has neither target nor entity"
            )));
        }
        if let Some(ref alternative) = self.alternative_mapping {
            alternative.check_shape(tag)?;
        }
        Ok(())
    }
}

/// A condition list plus an optional literal value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingRule {
    /// Conditions, evaluated left to right
    pub conditions: Vec<Condition>,
    /// Literal that replaces the computed value when every condition holds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl MappingRule {
    /// Whether any condition calls the scripting hook.
    #[must_use]
    pub fn uses_script(&self) -> bool {
        self.conditions.iter().any(Condition::is_custom)
    }
}

/// One step of a rule: named functions, their parameters, an optional literal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    /// Comma-separated function names
    #[serde(rename = "type")]
    pub kind: String,
    /// Parameters shared by every function of this condition
    pub parameter: Parameters,
    /// Literal to compare against, or the script source for `custom`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Feed the leader instead of the working value
    #[serde(rename = "LDR", skip_serializing_if = "std::ops::Not::not")]
    pub ldr: bool,
}

impl Condition {
    /// Condition applying the given comma-separated functions.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Condition {
            kind: kind.into(),
            ..Condition::default()
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.parameter.insert(key.to_string(), value.into());
        self
    }

    /// Function names in application order.
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.kind.split(',').map(str::trim).filter(|name| !name.is_empty())
    }

    /// Whether this condition calls the scripting hook.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.functions().any(|name| name == CUSTOM_FUNCTION)
    }
}

/// One delimiter bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimiterSpec {
    /// Text placed between this bucket's values
    pub value: String,
    /// Codes collected into this bucket; empty marks the default separator
    pub subfields: Vec<char>,
}

/// Subfield expansion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSpec {
    /// `split_every` or `custom`
    #[serde(rename = "type")]
    pub kind: String,
    /// Chunk length for `split_every`, script source for `custom`
    pub value: String,
}
