#![warn(missing_docs)]

//! # marc-rules
//!
//! Rule-driven mapping of MARC records onto catalog entities, and protected
//! editing and merging of the records themselves.
//!
//! Records arrive already parsed: a leader, control fields and data fields.
//! This crate never reads or writes the ISO 2709 wire format.
//!
//! ## Quick Start
//!
//! ### Mapping a record
//!
//! ```
//! use marc_rules::mapping::{shapes, MappingParameters, RecordMapper, RuleDocument};
//! use marc_rules::{Field, Leader, Record};
//!
//! let rules = RuleDocument::from_json(r#"{
//!     "245": [{"target": "title", "subfield": ["a", "b"], "rules": []}]
//! }"#)?;
//!
//! let mut record = Record::new(Leader::default());
//! let mut title = Field::new("245".to_string(), '1', '0');
//! title.add_subfield_str('a', "Rust in practice :");
//! title.add_subfield_str('b', "a guide");
//! record.add_field(title);
//!
//! let mapper = RecordMapper::default();
//! let instance = mapper
//!     .map(&record, &rules, &MappingParameters::default(), &shapes::INSTANCE)
//!     .expect("leader renders");
//! assert_eq!(instance.get_text("title"), Some("Rust in practice : a guide"));
//! # Ok::<(), marc_rules::MarcError>(())
//! ```
//!
//! ### Editing a record
//!
//! ```
//! use marc_rules::modify::{
//!     Action, EditDirective, FieldSpec, ModifierConfig, ProtectionSet, RecordModifier,
//!     SubfieldDirective,
//! };
//! use marc_rules::{Field, Leader, Record};
//!
//! let mut record = Record::new(Leader::default());
//! let mut isbn = Field::new("020".to_string(), ' ', ' ');
//! isbn.add_subfield_str('a', "9780000000001");
//! record.add_field(isbn);
//!
//! let mut modifier = RecordModifier::new(ProtectionSet::none(), ModifierConfig::default());
//! modifier.initialize(record);
//! modifier.apply(&[EditDirective::new(
//!     0,
//!     Action::Delete,
//!     FieldSpec::new("020").subfield(SubfieldDirective::new("*")),
//! )])?;
//! assert!(modifier.finish()?.fields.is_empty());
//! # Ok::<(), marc_rules::MarcError>(())
//! ```
//!
//! ## Modules
//!
//! - [`record`]: Record structures (`Record`, `ControlField`, `Field`, `Subfield`)
//! - [`leader`]: The 24-character record leader
//! - [`field_query`]: Tag and indicator matching
//! - [`field_order`]: Where new fields go
//! - [`mapping`]: Rule documents, the record mapper and target entity shapes
//! - [`modify`]: Edit directives, protection settings, merging and link preservation
//! - [`error`]: Error types and result type

pub mod error;
pub mod field_order;
pub mod field_query;
pub mod leader;
pub mod mapping;
pub mod modify;
/// Core MARC record structures (`Record`, `Field`, `Subfield`)
pub mod record;

pub use error::{MarcError, Result};
pub use field_query::{FieldQuery, IndicatorFilter, IndicatorPattern};
pub use leader::Leader;
pub use mapping::{Entity, EntityShape, MappingParameters, RecordMapper, RuleDocument};
pub use modify::{BibRecordModifier, EditDirective, ProtectionSet, RecordModifier};
pub use record::{
    ControlField, Field, FieldBuilder, Record, RecordBuilder, RecordKind, Subfield,
};
