//! Target entities and the accessor tables describing their shape.
//!
//! An [`EntityShape`] is a hand-written table of the fields a target type
//! exposes, each with its [`FieldKind`]. An [`Entity`] is an instance of a
//! shape: an ordered set of filled slots. Nothing is allocated for a field
//! until a rule produces a non-empty value for it.
//!
//! The mapping engine never touches slots directly. It resolves a dotted
//! path once against the shape ([`TargetPath`](super::path::TargetPath)) and
//! then calls [`Entity::assign`], which walks the path and creates
//! intermediate objects and collection elements as needed.

use super::path::TargetPath;
use crate::error::{MarcError, Result};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Which record family a shape is populated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Populated from bibliographic records
    Bibliographic,
    /// Populated from holdings records
    Holdings,
    /// Populated from authority records; enables rule expansion
    Authority,
}

/// Primitive leaf types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Text
    Str,
    /// `true` / `false`
    Bool,
    /// Signed integer
    Int,
}

impl ScalarKind {
    /// Convert produced text into a scalar of this kind.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the text does not parse.
    pub fn coerce(self, text: &str) -> std::result::Result<Scalar, String> {
        match self {
            ScalarKind::Str => Ok(Scalar::Str(text.to_string())),
            ScalarKind::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Scalar::Bool(true)),
                "false" => Ok(Scalar::Bool(false)),
                other => Err(format!("'{other}' is not a boolean")),
            },
            ScalarKind::Int => text
                .trim()
                .parse::<i64>()
                .map(Scalar::Int)
                .map_err(|e| e.to_string()),
        }
    }
}

/// The kind of one field in a shape.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Single primitive
    Scalar(ScalarKind),
    /// Collection of primitives; each assignment appends
    ScalarList(ScalarKind),
    /// Nested object
    Object(&'static EntityShape),
    /// Collection of objects; elements are created per instance
    ObjectList(&'static EntityShape),
}

/// One named field of a shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Field name as used in dotted paths
    pub name: &'static str,
    /// Its kind
    pub kind: FieldKind,
}

impl FieldDef {
    /// Text field.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Scalar(ScalarKind::Str),
        }
    }

    /// Boolean field.
    #[must_use]
    pub const fn flag(name: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Scalar(ScalarKind::Bool),
        }
    }

    /// Integer field.
    #[must_use]
    pub const fn int(name: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Scalar(ScalarKind::Int),
        }
    }

    /// List of text values.
    #[must_use]
    pub const fn texts(name: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::ScalarList(ScalarKind::Str),
        }
    }

    /// Nested object.
    #[must_use]
    pub const fn object(name: &'static str, shape: &'static EntityShape) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Object(shape),
        }
    }

    /// List of objects.
    #[must_use]
    pub const fn objects(name: &'static str, shape: &'static EntityShape) -> Self {
        FieldDef {
            name,
            kind: FieldKind::ObjectList(shape),
        }
    }
}

/// Accessor table for one target type.
#[derive(Debug)]
pub struct EntityShape {
    /// Type name, used in log messages
    pub name: &'static str,
    /// Record family
    pub kind: ShapeKind,
    /// Fields in declaration order
    pub fields: &'static [FieldDef],
}

impl EntityShape {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|def| def.name == name)
    }

    /// Whether authority rule expansion applies.
    #[must_use]
    pub fn is_authority(&self) -> bool {
        self.kind == ShapeKind::Authority
    }
}

/// A primitive value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Text
    Str(String),
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => write!(f, "{s}"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
        }
    }
}

/// A filled field of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Slot {
    /// Single primitive
    Scalar(Scalar),
    /// Collection of primitives
    Scalars(Vec<Scalar>),
    /// Nested object
    Object(Entity),
    /// Collection of objects
    Objects(Vec<Entity>),
}

/// Which object collections already hold the element receiving values.
///
/// A collection element is created the first time a value targets the
/// collection and reused afterwards, until [`InstanceCursor::new_instance`]
/// signals that following values belong to a fresh element.
#[derive(Debug, Default)]
pub struct InstanceCursor {
    opened: HashSet<String>,
}

impl InstanceCursor {
    /// Fresh cursor: the next value in every collection starts an element.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that following values belong to new collection elements.
    pub fn new_instance(&mut self) {
        self.opened.clear();
    }
}

/// An instance of an [`EntityShape`].
#[derive(Debug, Clone)]
pub struct Entity {
    shape: &'static EntityShape,
    slots: IndexMap<&'static str, Slot>,
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.shape, other.shape) && self.slots == other.slots
    }
}

impl Entity {
    /// Empty entity of a shape.
    #[must_use]
    pub fn new(shape: &'static EntityShape) -> Self {
        Entity {
            shape,
            slots: IndexMap::new(),
        }
    }

    /// The entity's shape.
    #[must_use]
    pub fn shape(&self) -> &'static EntityShape {
        self.shape
    }

    /// Whether nothing has been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A top-level slot.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// A top-level text value.
    #[must_use]
    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.slots.get(name) {
            Some(Slot::Scalar(Scalar::Str(s))) => Some(s),
            _ => None,
        }
    }

    /// Render as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization fails, which the slot types
    /// never cause in practice.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Assign produced text at a resolved path.
    ///
    /// Intermediate objects and collection elements are created on demand;
    /// the `cursor` decides whether an object collection gets a new element
    /// or the previous one keeps filling up.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ValueConversion`] if the text does not fit the
    /// leaf type, or [`MarcError::UnresolvedPath`] if the path was resolved
    /// against another shape.
    pub fn assign(
        &mut self,
        path: &TargetPath,
        text: &str,
        cursor: &mut InstanceCursor,
    ) -> Result<()> {
        if !std::ptr::eq(path.root(), self.shape) {
            return Err(MarcError::UnresolvedPath {
                path: path.as_str().to_string(),
                reason: format!(
                    "resolved against '{}', assigned to '{}'",
                    path.root().name,
                    self.shape.name
                ),
            });
        }
        let value = path
            .leaf_kind()
            .coerce(text)
            .map_err(|reason| MarcError::ValueConversion {
                value: text.to_string(),
                target: path.as_str().to_string(),
                reason,
            })?;
        let mut prefix = String::new();
        assign_segments(self, path.segments(), &mut prefix, value, cursor, path.as_str())
    }
}

fn assign_segments(
    entity: &mut Entity,
    segments: &[&'static FieldDef],
    prefix: &mut String,
    value: Scalar,
    cursor: &mut InstanceCursor,
    path: &str,
) -> Result<()> {
    let Some((def, rest)) = segments.split_first() else {
        return Err(unresolved(path, "empty path"));
    };

    match def.kind {
        FieldKind::Scalar(_) => {
            entity.slots.insert(def.name, Slot::Scalar(value));
            Ok(())
        },
        FieldKind::ScalarList(_) => {
            match entity
                .slots
                .entry(def.name)
                .or_insert_with(|| Slot::Scalars(Vec::new()))
            {
                Slot::Scalars(values) => {
                    values.push(value);
                    Ok(())
                },
                _ => Err(unresolved(path, "slot holds a different kind")),
            }
        },
        FieldKind::Object(shape) => {
            prefix.push_str(def.name);
            prefix.push('.');
            match entity
                .slots
                .entry(def.name)
                .or_insert_with(|| Slot::Object(Entity::new(shape)))
            {
                Slot::Object(child) => assign_segments(child, rest, prefix, value, cursor, path),
                _ => Err(unresolved(path, "slot holds a different kind")),
            }
        },
        FieldKind::ObjectList(shape) => {
            let key = format!("{prefix}{}", def.name);
            let Slot::Objects(items) = entity
                .slots
                .entry(def.name)
                .or_insert_with(|| Slot::Objects(Vec::new()))
            else {
                return Err(unresolved(path, "slot holds a different kind"));
            };
            if items.is_empty() || !cursor.opened.contains(&key) {
                items.push(Entity::new(shape));
                cursor.opened.insert(key.clone());
            }
            let child = items
                .last_mut()
                .ok_or_else(|| unresolved(path, "collection element missing"))?;
            *prefix = key;
            prefix.push('.');
            assign_segments(child, rest, prefix, value, cursor, path)
        },
    }
}

fn unresolved(path: &str, reason: &str) -> MarcError {
    MarcError::UnresolvedPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (name, slot) in &self.slots {
            map.serialize_entry(name, slot)?;
        }
        map.end()
    }
}
