//! Field protection settings.
//!
//! A setting describes fields (or single subfields) that edits and merges
//! must leave alone. Every slot accepts `*`. Omitted indicators mean blank;
//! omitted subfield and data slots mean any.
//!
//! ```
//! use marc_rules::modify::{ProtectionSet, ProtectionSetting};
//! use marc_rules::Field;
//!
//! let setting: ProtectionSetting = serde_json::from_str(
//!     r#"{"id": "p1", "field": "*", "indicator1": "*", "indicator2": "*",
//!         "subfield": "a", "data": "electronic", "source": "SYSTEM"}"#,
//! ).unwrap();
//! let protection = ProtectionSet::new(vec![setting], &[]);
//!
//! let field = Field::builder("338".to_string(), ' ', ' ')
//!     .subfield_str('a', "electronic")
//!     .build();
//! assert!(protection.is_field_protected(&field));
//! ```

use crate::field_query::{IndicatorPattern, WILDCARD};
use crate::record::{ControlField, Field, Subfield};
use serde::{Deserialize, Serialize};

fn wildcard() -> String {
    WILDCARD.to_string()
}

/// One protection setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionSetting {
    /// Setting identifier, shared by a system setting and its overrides
    #[serde(default)]
    pub id: String,
    /// Tag or `*`
    pub field: String,
    /// First indicator; omitted means blank
    #[serde(default)]
    pub indicator1: IndicatorPattern,
    /// Second indicator; omitted means blank
    #[serde(default)]
    pub indicator2: IndicatorPattern,
    /// Subfield code or `*`
    #[serde(default = "wildcard")]
    pub subfield: String,
    /// Exact value or `*`
    #[serde(default = "wildcard")]
    pub data: String,
    /// Where the setting comes from (`SYSTEM`, `USER`)
    #[serde(default)]
    pub source: String,
    /// Whether this entry cancels a system setting with the same id and source
    #[serde(default, rename = "override")]
    pub is_override: bool,
}

impl ProtectionSetting {
    /// Setting protecting a tag with any indicators, subfields and data.
    #[must_use]
    pub fn new(id: impl Into<String>, field: impl Into<String>) -> Self {
        ProtectionSetting {
            id: id.into(),
            field: field.into(),
            indicator1: IndicatorPattern::Any,
            indicator2: IndicatorPattern::Any,
            subfield: wildcard(),
            data: wildcard(),
            source: "SYSTEM".to_string(),
            is_override: false,
        }
    }

    /// Restrict indicators.
    #[must_use]
    pub fn indicators(
        mut self,
        indicator1: IndicatorPattern,
        indicator2: IndicatorPattern,
    ) -> Self {
        self.indicator1 = indicator1;
        self.indicator2 = indicator2;
        self
    }

    /// Restrict the subfield code and value.
    #[must_use]
    pub fn subfield_data(mut self, subfield: impl Into<String>, data: impl Into<String>) -> Self {
        self.subfield = subfield.into();
        self.data = data.into();
        self
    }

    fn matches_tag(&self, tag: &str) -> bool {
        self.field == WILDCARD || self.field == tag
    }

    fn matches_data(&self, value: &str) -> bool {
        self.data == WILDCARD || self.data == value
    }

    fn matches_subfield(&self, subfield: &Subfield) -> bool {
        let single_code = self.subfield.chars().count() == 1;
        let code_ok = self.subfield == WILDCARD
            || single_code && self.subfield.chars().next() == Some(subfield.code);
        code_ok && self.matches_data(&subfield.value)
    }

    fn matches_header(&self, field: &Field) -> bool {
        self.matches_tag(&field.tag)
            && self.indicator1.matches(field.indicator1)
            && self.indicator2.matches(field.indicator2)
    }

    /// Whether the setting covers this subfield of `field`.
    #[must_use]
    pub fn protects_subfield(&self, field: &Field, subfield: &Subfield) -> bool {
        self.matches_header(field) && self.matches_subfield(subfield)
    }

    /// Whether the setting covers `field` (any of its subfields qualifies).
    #[must_use]
    pub fn protects_field(&self, field: &Field) -> bool {
        self.matches_header(field) && field.subfields.iter().any(|sf| self.matches_subfield(sf))
    }

    /// Whether the setting covers a control field (data compared to the whole value).
    #[must_use]
    pub fn protects_control(&self, field: &ControlField) -> bool {
        self.matches_tag(&field.tag) && self.matches_data(&field.value)
    }
}

/// The effective protection settings for one edit or merge.
#[derive(Debug, Clone, Default)]
pub struct ProtectionSet {
    settings: Vec<ProtectionSetting>,
}

impl ProtectionSet {
    /// Combine system settings with profile overrides.
    ///
    /// A system setting is dropped when an override with the same `id` and
    /// `source` has `override: true`. Overrides are not protections
    /// themselves.
    #[must_use]
    pub fn new(system: Vec<ProtectionSetting>, overrides: &[ProtectionSetting]) -> Self {
        let settings = system
            .into_iter()
            .filter(|setting| {
                !overrides.iter().any(|o| {
                    o.is_override && o.id == setting.id && o.source == setting.source
                })
            })
            .collect();
        ProtectionSet { settings }
    }

    /// No protection at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The effective settings.
    #[must_use]
    pub fn settings(&self) -> &[ProtectionSetting] {
        &self.settings
    }

    /// Whether any setting protects the field.
    #[must_use]
    pub fn is_field_protected(&self, field: &Field) -> bool {
        self.settings.iter().any(|s| s.protects_field(field))
    }

    /// Whether any setting protects this subfield of the field.
    #[must_use]
    pub fn is_subfield_protected(&self, field: &Field, subfield: &Subfield) -> bool {
        self.settings.iter().any(|s| s.protects_subfield(field, subfield))
    }

    /// Whether any setting protects the control field.
    #[must_use]
    pub fn is_control_protected(&self, field: &ControlField) -> bool {
        self.settings.iter().any(|s| s.protects_control(field))
    }
}
