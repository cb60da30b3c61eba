//! Settings for the record mutation engine.

use crate::error::Result;
use crate::field_order::DEFAULT_SORTABLE_PREFIXES;
use crate::record::Field;
use serde::{Deserialize, Serialize};

/// Tags that may occur at most once per record.
pub const DEFAULT_NON_REPEATABLE_TAGS: &[&str] = &[
    "001", "002", "003", "004", "005", "008", "010", "018", "036", "038", "040", "042", "044",
    "045", "066", "073", "240", "243", "245", "254", "256", "263", "306", "357", "384", "507",
    "514", "841", "842", "844", "882",
];

/// A single local field treated as non-repeatable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalField {
    /// Tag
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
}

impl Default for LocalField {
    fn default() -> Self {
        LocalField {
            tag: "999".to_string(),
            indicator1: 'f',
            indicator2: 'f',
        }
    }
}

/// Configuration for [`RecordModifier`](super::RecordModifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModifierConfig {
    /// Leading tag digits whose fields are inserted in ascending tag order
    pub sortable_tag_prefixes: Vec<char>,
    /// Tags replaced wholesale during merges (every 1xx tag is included implicitly)
    pub non_repeatable_tags: Vec<String>,
    /// Local field replaced wholesale during merges
    pub local_non_repeatable: LocalField,
    /// Tags never merged implicitly
    pub system_tags: Vec<String>,
}

impl Default for ModifierConfig {
    fn default() -> Self {
        Self {
            sortable_tag_prefixes: DEFAULT_SORTABLE_PREFIXES.to_vec(),
            non_repeatable_tags: DEFAULT_NON_REPEATABLE_TAGS
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
            local_non_repeatable: LocalField::default(),
            system_tags: vec!["001".to_string(), "999".to_string()],
        }
    }
}

impl ModifierConfig {
    /// Parse from JSON; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON for this type.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the sortable tag prefixes.
    #[must_use]
    pub fn with_sortable_tag_prefixes(mut self, prefixes: &[char]) -> Self {
        self.sortable_tag_prefixes = prefixes.to_vec();
        self
    }

    /// Set the system tags.
    #[must_use]
    pub fn with_system_tags(mut self, tags: &[&str]) -> Self {
        self.system_tags = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Whether a data field is replaced wholesale during merges.
    #[must_use]
    pub fn is_non_repeatable(&self, field: &Field) -> bool {
        self.is_non_repeatable_tag(&field.tag)
            || (field.tag == self.local_non_repeatable.tag
                && field.indicator1 == self.local_non_repeatable.indicator1
                && field.indicator2 == self.local_non_repeatable.indicator2)
    }

    /// Whether a tag is non-repeatable regardless of indicators.
    #[must_use]
    pub fn is_non_repeatable_tag(&self, tag: &str) -> bool {
        tag.starts_with('1') || self.non_repeatable_tags.iter().any(|t| t == tag)
    }

    /// Whether a tag is excluded from implicit merge details.
    #[must_use]
    pub fn is_system_tag(&self, tag: &str) -> bool {
        self.system_tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModifierConfig::default();
        assert_eq!(config.sortable_tag_prefixes, vec!['0', '1', '8', '9']);
        assert!(config.is_non_repeatable_tag("245"));
        assert!(config.is_non_repeatable_tag("130"));
        assert!(!config.is_non_repeatable_tag("650"));
        assert!(config.is_system_tag("001"));
        assert!(config.is_system_tag("999"));
    }

    #[test]
    fn test_local_field_needs_indicators() {
        let config = ModifierConfig::default();
        assert!(config.is_non_repeatable(&Field::new("999".to_string(), 'f', 'f')));
        assert!(!config.is_non_repeatable(&Field::new("999".to_string(), ' ', ' ')));
    }

    #[test]
    fn test_json_overrides() {
        let config = ModifierConfig::from_json(r#"{"sortableTagPrefixes": ["0"]}"#).unwrap();
        assert_eq!(config.sortable_tag_prefixes, vec!['0']);
        assert_eq!(config.system_tags, vec!["001", "999"]);
    }

    #[test]
    fn test_builder_setters() {
        let config = ModifierConfig::default()
            .with_sortable_tag_prefixes(&['0', '1'])
            .with_system_tags(&["001"]);
        assert_eq!(config.sortable_tag_prefixes, vec!['0', '1']);
        assert!(!config.is_system_tag("999"));
    }
}
