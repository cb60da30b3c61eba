//! Field matching shared by the mapping and editing engines.
//!
//! Rule documents, edit directives, merge details and protection settings all
//! describe the fields they apply to the same way: a tag and two indicator
//! slots, each slot either a literal character or `*` for "any". This module
//! provides that matching in one place.
//!
//! # Examples
//!
//! ```
//! use marc_rules::field_query::{FieldQuery, IndicatorPattern};
//! use marc_rules::Field;
//!
//! let field = Field::builder("650".to_string(), ' ', '0')
//!     .subfield_str('a', "Cooking")
//!     .build();
//!
//! let query = FieldQuery::new()
//!     .tag("650")
//!     .indicator2(IndicatorPattern::Exact('0'))
//!     .has_subfield('a');
//! assert!(query.matches(&field));
//! ```

use crate::record::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard accepted in every tag, indicator, subfield and data slot.
pub const WILDCARD: &str = "*";

/// One indicator slot: a literal character or `*`.
///
/// Textual forms: `"*"` is [`IndicatorPattern::Any`]; an empty string and the
/// conventional `"\\"` both mean a blank indicator; anything else is taken
/// by its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndicatorPattern {
    /// Matches any indicator value
    Any,
    /// Matches exactly this value
    Exact(char),
}

impl Default for IndicatorPattern {
    fn default() -> Self {
        IndicatorPattern::Exact(' ')
    }
}

impl IndicatorPattern {
    /// Parse the textual form used in JSON documents.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            WILDCARD => IndicatorPattern::Any,
            "" | "\\" => IndicatorPattern::Exact(' '),
            other => IndicatorPattern::Exact(other.chars().next().unwrap_or(' ')),
        }
    }

    /// Check whether an indicator value satisfies this slot.
    #[must_use]
    pub fn matches(self, indicator: char) -> bool {
        match self {
            IndicatorPattern::Any => true,
            IndicatorPattern::Exact(expected) => expected == indicator,
        }
    }

    /// Whether this slot names a literal value.
    #[must_use]
    pub fn is_exact(self) -> bool {
        matches!(self, IndicatorPattern::Exact(_))
    }

    /// The literal value, if any.
    #[must_use]
    pub fn value(self) -> Option<char> {
        match self {
            IndicatorPattern::Any => None,
            IndicatorPattern::Exact(c) => Some(c),
        }
    }
}

impl From<String> for IndicatorPattern {
    fn from(text: String) -> Self {
        IndicatorPattern::parse(&text)
    }
}

impl From<IndicatorPattern> for String {
    fn from(pattern: IndicatorPattern) -> Self {
        pattern.to_string()
    }
}

impl fmt::Display for IndicatorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorPattern::Any => write!(f, "{WILDCARD}"),
            IndicatorPattern::Exact(c) => write!(f, "{c}"),
        }
    }
}

/// A pair of indicator slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndicatorFilter {
    /// First indicator slot
    #[serde(default)]
    pub ind1: IndicatorPattern,
    /// Second indicator slot
    #[serde(default)]
    pub ind2: IndicatorPattern,
}

impl IndicatorFilter {
    /// A filter accepting any indicators.
    #[must_use]
    pub fn any() -> Self {
        IndicatorFilter {
            ind1: IndicatorPattern::Any,
            ind2: IndicatorPattern::Any,
        }
    }

    /// Both slots must match.
    #[must_use]
    pub fn matches(&self, field: &Field) -> bool {
        self.ind1.matches(field.indicator1) && self.ind2.matches(field.indicator2)
    }

    /// Number of literal slots, used to rank competing filters.
    #[must_use]
    pub fn specificity(&self) -> usize {
        usize::from(self.ind1.is_exact()) + usize::from(self.ind2.is_exact())
    }
}

/// A query builder for finding fields matching tag, indicator and subfield criteria.
#[derive(Debug, Clone)]
pub struct FieldQuery {
    /// Optional tag filter. If None (or `*`), matches all tags.
    pub tag: Option<String>,
    /// First indicator slot
    pub indicator1: IndicatorPattern,
    /// Second indicator slot
    pub indicator2: IndicatorPattern,
    /// Required subfield codes (AND logic)
    pub required_subfields: Vec<char>,
}

impl Default for FieldQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldQuery {
    /// Create a new query that matches all fields.
    #[must_use]
    pub fn new() -> Self {
        FieldQuery {
            tag: None,
            indicator1: IndicatorPattern::Any,
            indicator2: IndicatorPattern::Any,
            required_subfields: Vec::new(),
        }
    }

    /// Restrict query to fields with a specific tag. `*` keeps every tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = if tag == WILDCARD { None } else { Some(tag) };
        self
    }

    /// Restrict the first indicator.
    #[must_use]
    pub fn indicator1(mut self, pattern: IndicatorPattern) -> Self {
        self.indicator1 = pattern;
        self
    }

    /// Restrict the second indicator.
    #[must_use]
    pub fn indicator2(mut self, pattern: IndicatorPattern) -> Self {
        self.indicator2 = pattern;
        self
    }

    /// Require the field to have a subfield with the given code.
    ///
    /// Multiple calls add additional required subfields (AND logic).
    #[must_use]
    pub fn has_subfield(mut self, code: char) -> Self {
        if !self.required_subfields.contains(&code) {
            self.required_subfields.push(code);
        }
        self
    }

    /// Check if a field matches all criteria in this query.
    #[must_use]
    pub fn matches(&self, field: &Field) -> bool {
        if let Some(ref tag) = self.tag {
            if field.tag != *tag {
                return false;
            }
        }

        self.indicator1.matches(field.indicator1)
            && self.indicator2.matches(field.indicator2)
            && self
                .required_subfields
                .iter()
                .all(|&code| field.has_subfield(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_field(tag: &str, ind1: char, ind2: char, subfields: &[(char, &str)]) -> Field {
        let mut field = Field::new(tag.to_string(), ind1, ind2);
        for &(code, value) in subfields {
            field.add_subfield_str(code, value);
        }
        field
    }

    #[test]
    fn test_indicator_pattern_parse() {
        assert_eq!(IndicatorPattern::parse("*"), IndicatorPattern::Any);
        assert_eq!(IndicatorPattern::parse(""), IndicatorPattern::Exact(' '));
        assert_eq!(IndicatorPattern::parse("\\"), IndicatorPattern::Exact(' '));
        assert_eq!(IndicatorPattern::parse("0"), IndicatorPattern::Exact('0'));
    }

    #[test]
    fn test_indicator_pattern_serde() {
        let filter: IndicatorFilter = serde_json::from_str(r#"{"ind1":"*","ind2":"0"}"#).unwrap();
        assert_eq!(filter.ind1, IndicatorPattern::Any);
        assert_eq!(filter.ind2, IndicatorPattern::Exact('0'));
        assert_eq!(filter.specificity(), 1);

        let back = serde_json::to_string(&filter).unwrap();
        assert_eq!(back, r#"{"ind1":"*","ind2":"0"}"#);
    }

    #[test]
    fn test_wildcard_matches_any_single_value() {
        let filter = IndicatorFilter {
            ind1: IndicatorPattern::Any,
            ind2: IndicatorPattern::Exact('1'),
        };
        for ind1 in [' ', '0', '9', 'a'] {
            assert!(filter.matches(&create_test_field("245", ind1, '1', &[])));
        }
        assert!(!filter.matches(&create_test_field("245", '1', '0', &[])));
    }

    #[test]
    fn test_both_indicators_must_match() {
        let filter = IndicatorFilter {
            ind1: IndicatorPattern::Exact('1'),
            ind2: IndicatorPattern::Exact('0'),
        };
        assert!(filter.matches(&create_test_field("245", '1', '0', &[])));
        assert!(!filter.matches(&create_test_field("245", '1', '4', &[])));
        assert!(!filter.matches(&create_test_field("245", '0', '0', &[])));
    }

    #[test]
    fn test_query_matches_tag() {
        let field = create_test_field("650", ' ', '0', &[('a', "Subject")]);
        assert!(FieldQuery::new().tag("650").matches(&field));
        assert!(!FieldQuery::new().tag("651").matches(&field));
        assert!(FieldQuery::new().tag("*").matches(&field));
    }

    #[test]
    fn test_query_combines_criteria() {
        let field = create_test_field("650", ' ', '0', &[('a', "Subject"), ('x', "History")]);

        let query = FieldQuery::new()
            .tag("650")
            .indicator2(IndicatorPattern::Exact('0'))
            .has_subfield('a')
            .has_subfield('x');
        assert!(query.matches(&field));

        let query = FieldQuery::new()
            .tag("650")
            .indicator2(IndicatorPattern::Exact('1'));
        assert!(!query.matches(&field));

        let query = FieldQuery::new().tag("650").has_subfield('b');
        assert!(!query.matches(&field));
    }
}
