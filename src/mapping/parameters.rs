//! Read-only reference tables supplied with each mapping call.
//!
//! Lookup functions such as `set_instance_type_id` resolve a human-readable
//! name or code to an identifier through these tables. The engine never
//! writes to them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Table of instance (resource) types, matched by code.
pub const INSTANCE_TYPES: &str = "instanceTypes";
/// Table of identifier types, matched by name.
pub const IDENTIFIER_TYPES: &str = "identifierTypes";
/// Table of contributor (relator) types, matched by code.
pub const CONTRIBUTOR_TYPES: &str = "contributorTypes";
/// Table of contributor name types, matched by name.
pub const CONTRIBUTOR_NAME_TYPES: &str = "contributorNameTypes";
/// Table of classification types, matched by name.
pub const CLASSIFICATION_TYPES: &str = "classificationTypes";
/// Table of instance note types, matched by name.
pub const INSTANCE_NOTE_TYPES: &str = "instanceNoteTypes";
/// Table of issuance modes, matched by name.
pub const ISSUANCE_MODES: &str = "issuanceModes";
/// Table of holdings types, matched by name.
pub const HOLDINGS_TYPES: &str = "holdingsTypes";
/// Table of electronic access relationships, matched by name.
pub const ELECTRONIC_ACCESS_RELATIONSHIPS: &str = "electronicAccessRelationships";

/// One row of a reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Identifier written into the entity
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional short code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ReferenceEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(id: &str, name: &str, code: Option<&str>) -> Self {
        ReferenceEntry {
            id: id.to_string(),
            name: name.to_string(),
            code: code.map(str::to_string),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct TableIndex {
    by_name: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

/// Named reference tables plus a lazily built lookup index.
///
/// The index is computed once, on first lookup, and shared by later lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingParameters {
    #[serde(flatten)]
    tables: IndexMap<String, Vec<ReferenceEntry>>,
    #[serde(skip)]
    index: OnceLock<HashMap<String, TableIndex>>,
}

impl MappingParameters {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, consuming and returning `self`.
    ///
    /// Must be called before the first lookup; the index is not rebuilt.
    #[must_use]
    pub fn with_table(mut self, name: &str, entries: Vec<ReferenceEntry>) -> Self {
        self.tables.insert(name.to_string(), entries);
        self.index = OnceLock::new();
        self
    }

    /// Parse tables from JSON (`{"instanceTypes": [{"id":..,"name":..,"code":..}], ...}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not have the expected shape.
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Entries of a table.
    #[must_use]
    pub fn table(&self, name: &str) -> &[ReferenceEntry] {
        self.tables.get(name).map_or(&[], Vec::as_slice)
    }

    /// Find an entry by exact name.
    #[must_use]
    pub fn by_name(&self, table: &str, name: &str) -> Option<&ReferenceEntry> {
        let position = *self.index().get(table)?.by_name.get(name)?;
        self.table(table).get(position)
    }

    /// Find an entry by exact code.
    #[must_use]
    pub fn by_code(&self, table: &str, code: &str) -> Option<&ReferenceEntry> {
        let position = *self.index().get(table)?.by_code.get(code)?;
        self.table(table).get(position)
    }

    fn index(&self) -> &HashMap<String, TableIndex> {
        self.index.get_or_init(|| {
            self.tables
                .iter()
                .map(|(name, entries)| {
                    let mut index = TableIndex::default();
                    for (position, entry) in entries.iter().enumerate() {
                        index.by_name.entry(entry.name.clone()).or_insert(position);
                        if let Some(ref code) = entry.code {
                            index.by_code.entry(code.clone()).or_insert(position);
                        }
                    }
                    (name.clone(), index)
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_code() {
        let params = MappingParameters::new().with_table(
            INSTANCE_TYPES,
            vec![
                ReferenceEntry::new("it-txt", "text", Some("txt")),
                ReferenceEntry::new("it-sti", "still image", Some("sti")),
            ],
        );

        assert_eq!(params.by_code(INSTANCE_TYPES, "sti").unwrap().id, "it-sti");
        assert_eq!(params.by_name(INSTANCE_TYPES, "text").unwrap().id, "it-txt");
        assert!(params.by_code(INSTANCE_TYPES, "zzz").is_none());
        assert!(params.by_code(IDENTIFIER_TYPES, "txt").is_none());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let params = MappingParameters::new().with_table(
            IDENTIFIER_TYPES,
            vec![
                ReferenceEntry::new("first", "ISBN", None),
                ReferenceEntry::new("second", "ISBN", None),
            ],
        );
        assert_eq!(params.by_name(IDENTIFIER_TYPES, "ISBN").unwrap().id, "first");
    }

    #[test]
    fn test_from_json() {
        let params = MappingParameters::from_json(
            r#"{"identifierTypes": [{"id": "id-isbn", "name": "ISBN"}]}"#,
        )
        .unwrap();
        assert_eq!(params.table(IDENTIFIER_TYPES).len(), 1);
        assert_eq!(params.by_name(IDENTIFIER_TYPES, "ISBN").unwrap().id, "id-isbn");
    }
}
