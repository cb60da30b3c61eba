//! Editing and merging of MARC records.
//!
//! [`RecordModifier`] applies ordered [`EditDirective`]s to a record or folds
//! an incoming record into it, always respecting a [`ProtectionSet`].
//! [`BibRecordModifier`] adds authority link preservation for bibliographic
//! merges.

pub mod config;
pub mod directives;
mod edit;
pub mod linking;
pub mod merge;
mod modifier;
pub mod protection;

pub use config::{LocalField, ModifierConfig, DEFAULT_NON_REPEATABLE_TAGS};
pub use directives::{
    Action, DirectiveData, EditDirective, FieldSpec, Position, Subaction, SubfieldDirective,
    LEADER_TAG,
};
pub use linking::{BibRecordModifier, Link, LinkPreservation, LinkingRule};
pub use merge::{MergePolicy, PlainMerge};
pub use modifier::RecordModifier;
pub use protection::{ProtectionSet, ProtectionSetting};
