//! Edit directive documents.
//!
//! A directive names an action, the fields it applies to, and per-subfield
//! instructions:
//!
//! ```json
//! {
//!   "order": 0,
//!   "action": "EDIT",
//!   "field": {
//!     "field": "856", "indicator1": "4", "indicator2": "0",
//!     "subfields": [{
//!       "subfield": "z",
//!       "subaction": "INSERT",
//!       "position": "AFTER_STRING",
//!       "data": { "text": " (campus only)" }
//!     }]
//!   }
//! }
//! ```
//!
//! For the leader (`"LDR"`) and control fields the `subfield` slot holds a
//! character position (`"06"`) or an inclusive range (`"06-07"`).

use crate::error::{MarcError, Result};
use crate::field_query::{FieldQuery, IndicatorPattern, WILDCARD};
use serde::{Deserialize, Serialize};

/// Tag used by directives addressing the leader.
pub const LEADER_TAG: &str = "LDR";

/// Top-level action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Add a field
    Add,
    /// Delete fields or subfields
    Delete,
    /// Change values in place
    Edit,
    /// Move subfields to another field
    Move,
}

/// Per-subfield action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Subaction {
    /// Insert literal text or a new subfield
    Insert,
    /// Replace a span or substring
    Replace,
    /// Remove a span or substring
    Remove,
    /// Move into a newly created field
    CreateNewField,
    /// Move into fields that already exist
    AddToExistingField,
}

/// Where an INSERT places its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    /// Prepend to the subfield value
    BeforeString,
    /// Append to the subfield value
    AfterString,
    /// Add a brand-new subfield
    NewSubfield,
}

fn any_indicator() -> IndicatorPattern {
    IndicatorPattern::Any
}

/// Payload of one subfield instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectiveData {
    /// Literal text for ADD and INSERT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Guard or search string for REPLACE and REMOVE; `*` matches anything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find: Option<String>,
    /// Replacement for REPLACE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_with: Option<String>,
    /// Destination of a MOVE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relocation_field: Option<Box<FieldSpec>>,
}

/// One subfield instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubfieldDirective {
    /// Subfield code, `*`, or a character position/range for control fields
    pub subfield: String,
    /// What to do
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subaction: Option<Subaction>,
    /// INSERT placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Payload
    #[serde(default)]
    pub data: DirectiveData,
}

impl SubfieldDirective {
    /// Instruction for one subfield code.
    #[must_use]
    pub fn new(subfield: impl Into<String>) -> Self {
        SubfieldDirective {
            subfield: subfield.into(),
            subaction: None,
            position: None,
            data: DirectiveData::default(),
        }
    }

    /// Set the subaction.
    #[must_use]
    pub fn subaction(mut self, subaction: Subaction) -> Self {
        self.subaction = Some(subaction);
        self
    }

    /// Set the INSERT position.
    #[must_use]
    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the literal text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.data.text = Some(text.into());
        self
    }

    /// Set find and replacement.
    #[must_use]
    pub fn find_replace(
        mut self,
        find: impl Into<String>,
        replace_with: impl Into<String>,
    ) -> Self {
        self.data.find = Some(find.into());
        self.data.replace_with = Some(replace_with.into());
        self
    }

    /// Set only the find string.
    #[must_use]
    pub fn find(mut self, find: impl Into<String>) -> Self {
        self.data.find = Some(find.into());
        self
    }

    /// Set the MOVE destination.
    #[must_use]
    pub fn relocate_to(mut self, destination: FieldSpec) -> Self {
        self.data.relocation_field = Some(Box::new(destination));
        self
    }

    /// Whether this instruction addresses every subfield.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.subfield == WILDCARD
    }

    /// The single subfield code, if the slot holds one.
    #[must_use]
    pub fn code(&self) -> Option<char> {
        let mut chars = self.subfield.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if self.subfield != WILDCARD => Some(c),
            _ => None,
        }
    }

    /// Inclusive character range for leader and control-field edits.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::InvalidField`] if the slot is not `NN` or `NN-NN`.
    pub fn position_range(&self) -> Result<(usize, usize)> {
        let parse = |text: &str| {
            text.trim().parse::<usize>().map_err(|_| {
                MarcError::InvalidField(format!("'{}' is not a character position", self.subfield))
            })
        };
        let (start, end) = match self.subfield.split_once('-') {
            Some((start, end)) => (parse(start)?, parse(end)?),
            None => {
                let position = parse(&self.subfield)?;
                (position, position)
            },
        };
        if end < start {
            return Err(MarcError::InvalidField(format!(
                "range '{}' ends before it starts",
                self.subfield
            )));
        }
        Ok((start, end))
    }
}

/// Which fields a directive or merge detail addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Tag, `LDR`, or `*`
    pub field: String,
    /// First indicator slot; omitted means any
    #[serde(default = "any_indicator")]
    pub indicator1: IndicatorPattern,
    /// Second indicator slot; omitted means any
    #[serde(default = "any_indicator")]
    pub indicator2: IndicatorPattern,
    /// Subfield instructions
    #[serde(default)]
    pub subfields: Vec<SubfieldDirective>,
}

impl FieldSpec {
    /// Spec for a tag with any indicators and no subfield instructions.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        FieldSpec {
            field: tag.into(),
            indicator1: IndicatorPattern::Any,
            indicator2: IndicatorPattern::Any,
            subfields: Vec::new(),
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

    /// Add a subfield instruction.
    #[must_use]
    pub fn subfield(mut self, directive: SubfieldDirective) -> Self {
        self.subfields.push(directive);
        self
    }

    /// Whether this spec addresses the leader.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        self.field == LEADER_TAG
    }

    /// Query matching data fields by tag and indicators.
    #[must_use]
    pub fn query(&self) -> FieldQuery {
        FieldQuery::new()
            .tag(self.field.clone())
            .indicator1(self.indicator1)
            .indicator2(self.indicator2)
    }

    /// Subfield codes named by the instructions (wildcards excluded).
    #[must_use]
    pub fn codes(&self) -> Vec<char> {
        self.subfields.iter().filter_map(SubfieldDirective::code).collect()
    }
}

/// One ordered edit instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditDirective {
    /// Application order, ascending
    #[serde(default)]
    pub order: u32,
    /// Action
    pub action: Action,
    /// Target fields and subfield instructions
    pub field: FieldSpec,
}

impl EditDirective {
    /// Create a directive.
    #[must_use]
    pub fn new(order: u32, action: Action, field: FieldSpec) -> Self {
        EditDirective {
            order,
            action,
            field,
        }
    }

    /// Parse a JSON array of directives.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe directives.
    pub fn list_from_json(text: &str) -> Result<Vec<EditDirective>> {
        Ok(serde_json::from_str(text)?)
    }
}
