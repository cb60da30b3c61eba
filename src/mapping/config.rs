//! Settings for the rule mapping engine.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Configuration for [`RecordMapper`](super::RecordMapper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapperConfig {
    /// Separator between subfield values when a rule declares no delimiters
    pub default_delimiter: String,
    /// Upper bound on operations for one script run
    pub script_max_operations: u64,
    /// Upper bound on the length of any string a script builds
    pub script_max_string_size: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            default_delimiter: " ".to_string(),
            script_max_operations: 100_000,
            script_max_string_size: 64 * 1024,
        }
    }
}

impl MapperConfig {
    /// Parse from JSON; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON for this type.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the default delimiter.
    #[must_use]
    pub fn with_default_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.default_delimiter = delimiter.into();
        self
    }

    /// Set the per-run script operation limit.
    #[must_use]
    pub fn with_script_max_operations(mut self, limit: u64) -> Self {
        self.script_max_operations = limit;
        self
    }

    /// Set the script string size limit.
    #[must_use]
    pub fn with_script_max_string_size(mut self, limit: usize) -> Self {
        self.script_max_string_size = limit;
        self
    }
}
