//! The record mutation engine.

use super::config::ModifierConfig;
use super::directives::{EditDirective, FieldSpec};
use super::edit::Editor;
use super::merge::{MergePolicy, Merger, PlainMerge};
use super::protection::ProtectionSet;
use crate::error::{MarcError, Result};
use crate::record::Record;
use tracing::debug;

fn not_initialized() -> MarcError {
    MarcError::Configuration("modifier used before initialize".to_string())
}

/// Applies edit directives and merges to one record at a time.
///
/// A modifier holds the record it works on between calls. Call
/// [`initialize`](Self::initialize) before anything else and again for
/// every new record.
///
/// ```
/// use marc_rules::modify::{
///     Action, EditDirective, FieldSpec, ModifierConfig, ProtectionSet, RecordModifier,
///     SubfieldDirective,
/// };
/// use marc_rules::{Field, Leader, Record};
///
/// let mut record = Record::new(Leader::default());
/// for tag in ["490", "507", "650"] {
///     let mut field = Field::new(tag.to_string(), ' ', ' ');
///     field.add_subfield_str('a', "x");
///     record.add_field(field);
/// }
///
/// let mut modifier = RecordModifier::new(ProtectionSet::none(), ModifierConfig::default());
/// modifier.initialize(record);
/// modifier.apply(&[EditDirective::new(
///     0,
///     Action::Add,
///     FieldSpec::new("500").subfield(SubfieldDirective::new("a").text("Note")),
/// )])?;
///
/// let record = modifier.finish()?;
/// let tags: Vec<&str> = record.fields.iter().map(|f| f.tag.as_str()).collect();
/// assert_eq!(tags, ["490", "507", "500", "650"]);
/// # Ok::<(), marc_rules::MarcError>(())
/// ```
#[derive(Debug)]
pub struct RecordModifier {
    protection: ProtectionSet,
    config: ModifierConfig,
    record: Option<Record>,
}

impl RecordModifier {
    /// Create a modifier with its protection settings and configuration.
    #[must_use]
    pub fn new(protection: ProtectionSet, config: ModifierConfig) -> Self {
        RecordModifier {
            protection,
            config,
            record: None,
        }
    }

    /// Start work on `record`, discarding any record from a previous call.
    pub fn initialize(&mut self, record: Record) {
        if self.record.is_some() {
            debug!("Discarding unfinished record");
        }
        self.record = Some(record);
    }

    /// Effective protection settings.
    #[must_use]
    pub fn protection(&self) -> &ProtectionSet {
        &self.protection
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ModifierConfig {
        &self.config
    }

    /// The record being modified.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn record(&self) -> Result<&Record> {
        self.record.as_ref().ok_or_else(not_initialized)
    }

    /// Apply directives in ascending `order`.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn apply(&mut self, directives: &[EditDirective]) -> Result<()> {
        let record = self.record.as_mut().ok_or_else(not_initialized)?;
        Editor::new(record, &self.protection, &self.config).apply_all(directives);
        Ok(())
    }

    /// Merge `incoming` into the record. An empty `details` merges every tag
    /// except the system tags.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn merge(&mut self, incoming: &Record, details: &[FieldSpec]) -> Result<()> {
        self.merge_with(incoming, details, &mut PlainMerge)
    }

    /// Merge with a caller-supplied [`MergePolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn merge_with(
        &mut self,
        incoming: &Record,
        details: &[FieldSpec],
        policy: &mut dyn MergePolicy,
    ) -> Result<()> {
        let record = self.record.as_mut().ok_or_else(not_initialized)?;
        Merger::new(record, &self.protection, &self.config, policy).merge(incoming, details);
        Ok(())
    }

    /// Hand back the modified record. The modifier needs a new
    /// [`initialize`](Self::initialize) afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn finish(&mut self) -> Result<Record> {
        self.record.take().ok_or_else(not_initialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::record::Field;

    fn modifier() -> RecordModifier {
        RecordModifier::new(ProtectionSet::none(), ModifierConfig::default())
    }

    #[test]
    fn test_calls_before_initialize_fail() {
        let mut modifier = modifier();
        assert!(modifier.apply(&[]).unwrap_err().is_configuration());
        assert!(modifier
            .merge(&Record::new(Leader::default()), &[])
            .unwrap_err()
            .is_configuration());
        assert!(modifier.finish().unwrap_err().is_configuration());
        assert!(modifier.record().is_err());
    }

    #[test]
    fn test_finish_requires_reinitialize() {
        let mut modifier = modifier();
        modifier.initialize(Record::new(Leader::default()));
        assert!(modifier.finish().is_ok());
        assert!(modifier.finish().unwrap_err().is_configuration());
    }

    #[test]
    fn test_initialize_replaces_record() {
        let mut modifier = modifier();
        let mut first = Record::new(Leader::default());
        first.add_field(Field::new("500".to_string(), ' ', ' '));
        modifier.initialize(first);
        modifier.initialize(Record::new(Leader::default()));
        assert!(modifier.record().unwrap().fields.is_empty());
    }
}
