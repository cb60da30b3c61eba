//! MARC record structures and operations.
//!
//! This module provides the record model shared by the mapping and editing engines:
//! - [`Record`]: leader, ordered control fields and ordered data fields
//! - [`ControlField`]: fields 001-009 (tag + raw text)
//! - [`Field`]: variable data fields (010+)
//! - [`Subfield`]: coded data elements within fields
//!
//! Unlike a tag-keyed map, both field lists keep their exact sequence. Edits
//! that add or move fields rely on this to place new fields among existing
//! ones (see [`crate::field_order`]).
//!
//! # Examples
//!
//! ```
//! use marc_rules::{Field, Leader, Record};
//!
//! let record = Record::builder(Leader::default())
//!     .control_field_str("001", "in00000001")
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Title")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(record.get_control_field("001"), Some("in00000001"));
//! assert_eq!(record.get_field("245").and_then(|f| f.get_subfield('a')), Some("Title"));
//! ```

use crate::leader::Leader;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The family of a record, derived from leader position 06.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Bibliographic record (every type code not listed below)
    Bibliographic,
    /// Holdings record (`u`, `v`, `x`, `y`)
    Holdings,
    /// Authority record (`z`)
    Authority,
}

impl RecordKind {
    /// Classify a leader/06 type code.
    #[must_use]
    pub fn from_type_code(code: char) -> Self {
        match code {
            'z' => RecordKind::Authority,
            'u' | 'v' | 'x' | 'y' => RecordKind::Holdings,
            _ => RecordKind::Bibliographic,
        }
    }
}

/// A MARC record: leader, ordered control fields and ordered data fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record leader (24 characters)
    pub leader: Leader,
    /// Control fields (001-009) in record order
    pub control_fields: Vec<ControlField>,
    /// Data fields (010+) in record order
    pub fields: Vec<Field>,
}

/// A control field (001-009): a tag and its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlField {
    /// Field tag (3 digits)
    pub tag: String,
    /// Raw field text
    pub value: String,
}

/// A data field in a MARC record (fields 010 and higher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field tag (3 digits)
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
    /// Subfields (stored in `SmallVec` to avoid allocation for typical fields
    /// with 4 or fewer subfields)
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield value
    pub value: String,
}

impl Subfield {
    /// Create a subfield
    #[must_use]
    pub fn new(code: char, value: impl Into<String>) -> Self {
        Subfield {
            code,
            value: value.into(),
        }
    }
}

impl ControlField {
    /// Create a control field
    #[must_use]
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        ControlField {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// Returns `true` for tags 001-009 (and the leader pseudo-tag excluded).
#[must_use]
pub fn is_control_tag(tag: &str) -> bool {
    tag.len() == 3 && tag.starts_with("00")
}

impl Record {
    /// Create a new MARC record with the given leader
    #[must_use]
    pub fn new(leader: Leader) -> Self {
        Record {
            leader,
            control_fields: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Create a builder for fluently constructing MARC records
    #[must_use]
    pub fn builder(leader: Leader) -> RecordBuilder {
        RecordBuilder {
            record: Record::new(leader),
        }
    }

    /// The record family, from leader/06.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        RecordKind::from_type_code(self.leader.record_type)
    }

    /// Append a control field (001-009)
    pub fn add_control_field(&mut self, tag: String, value: String) {
        self.control_fields.push(ControlField { tag, value });
    }

    /// Append a control field using string slices
    pub fn add_control_field_str(&mut self, tag: &str, value: &str) {
        self.add_control_field(tag.to_string(), value.to_string());
    }

    /// Get the first control field value for a tag
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|cf| cf.tag == tag)
            .map(|cf| cf.value.as_str())
    }

    /// Append a data field
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Get first field with a given tag
    #[must_use]
    pub fn get_field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    /// Iterate over fields matching a specific tag, in record order
    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    /// Iterate over fields matching a query.
    pub fn fields_matching<'a>(
        &'a self,
        query: &'a crate::field_query::FieldQuery,
    ) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |field| query.matches(field))
    }

    /// Remove fields matching a predicate
    ///
    /// Returns the removed fields.
    pub fn remove_fields_where<F>(&mut self, predicate: F) -> Vec<Field>
    where
        F: Fn(&Field) -> bool,
    {
        let mut removed = Vec::new();
        self.fields.retain(|f| {
            if predicate(f) {
                removed.push(f.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove control fields matching a predicate
    ///
    /// Returns the removed control fields.
    pub fn remove_control_fields_where<F>(&mut self, predicate: F) -> Vec<ControlField>
    where
        F: Fn(&ControlField) -> bool,
    {
        let mut removed = Vec::new();
        self.control_fields.retain(|cf| {
            if predicate(cf) {
                removed.push(cf.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Iterate over the record's field tags in order: control fields first, then data fields.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.control_fields
            .iter()
            .map(|cf| cf.tag.as_str())
            .chain(self.fields.iter().map(|f| f.tag.as_str()))
    }
}

/// Builder for fluently constructing MARC records
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field to the record being built
    #[must_use]
    pub fn control_field_str(mut self, tag: &str, value: &str) -> Self {
        self.record.add_control_field_str(tag, value);
        self
    }

    /// Add a data field to the record being built
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.record.add_field(field);
        self
    }

    /// Build the record
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

impl Field {
    /// Create a new data field
    #[must_use]
    pub fn new(tag: String, indicator1: char, indicator2: char) -> Self {
        Field {
            tag,
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Create a builder for constructing fields fluently
    ///
    /// # Examples
    ///
    /// ```
    /// use marc_rules::Field;
    ///
    /// let field = Field::builder("650".to_string(), ' ', '0')
    ///     .subfield_str('a', "Cooking")
    ///     .subfield_str('x', "History")
    ///     .build();
    /// assert_eq!(field.get_subfield('x'), Some("History"));
    /// ```
    #[must_use]
    pub fn builder(tag: String, indicator1: char, indicator2: char) -> FieldBuilder {
        FieldBuilder {
            field: Field::new(tag, indicator1, indicator2),
        }
    }

    /// Add a subfield
    pub fn add_subfield(&mut self, code: char, value: String) {
        self.subfields.push(Subfield { code, value });
    }

    /// Add a subfield using a string slice
    pub fn add_subfield_str(&mut self, code: char, value: &str) {
        self.add_subfield(code, value.to_string());
    }

    /// Get all values for a subfield code
    #[must_use]
    pub fn get_subfield_values(&self, code: char) -> Vec<&str> {
        self.subfields
            .iter()
            .filter(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
            .collect()
    }

    /// Get first value for a subfield code
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Check whether the field has at least one subfield with this code
    #[must_use]
    pub fn has_subfield(&self, code: char) -> bool {
        self.subfields.iter().any(|sf| sf.code == code)
    }

    /// Remove all subfields with a given code
    ///
    /// Returns the removed subfields.
    pub fn remove_subfields(&mut self, code: char) -> Vec<Subfield> {
        self.remove_subfields_where(|sf| sf.code == code)
    }

    /// Remove subfields matching a predicate
    ///
    /// Returns the removed subfields.
    pub fn remove_subfields_where<F>(&mut self, predicate: F) -> Vec<Subfield>
    where
        F: Fn(&Subfield) -> bool,
    {
        let mut removed = Vec::new();
        self.subfields.retain(|sf| {
            if predicate(sf) {
                removed.push(sf.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Whether the field has no subfields left
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subfields.is_empty()
    }
}

/// Builder for fluently constructing MARC fields
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Add a subfield using a string slice
    #[must_use]
    pub fn subfield_str(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield_str(code, value);
        self
    }

    /// Build the field
    #[must_use]
    pub fn build(self) -> Field {
        self.field
    }
}
