//! Rule-driven mapping from MARC records to catalog entities.
//!
//! A [`RuleDocument`] says, per tag, which subfields feed which entity field
//! and how their values are transformed. [`RecordMapper`] interprets it
//! against a [`Record`](crate::Record) and fills an [`Entity`] of any
//! [`EntityShape`], with reference-table lookups served from
//! [`MappingParameters`].
//!
//! Authority shapes get their rules expanded before mapping (see
//! [`authority`]).

pub mod authority;
pub mod config;
pub mod delimiters;
pub mod entity;
pub mod functions;
pub mod parameters;
pub mod path;
pub mod processor;
pub mod rules;
pub mod script;
pub mod shapes;

pub use config::MapperConfig;
pub use entity::{
    Entity, EntityShape, FieldDef, FieldKind, InstanceCursor, Scalar, ScalarKind, ShapeKind, Slot,
};
pub use functions::{BuiltinFn, FunctionContext, FunctionLibrary};
pub use parameters::{MappingParameters, ReferenceEntry};
pub use path::TargetPath;
pub use processor::RecordMapper;
pub use rules::{
    Condition, DelimiterSpec, FieldRule, MappingRule, Parameters, RuleDocument, SplitSpec,
};
pub use script::{RhaiTransform, ScriptCache, ScriptValue, ValueTransform};
