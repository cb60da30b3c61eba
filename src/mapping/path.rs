//! Dotted target paths resolved against an [`EntityShape`].
//!
//! Resolution happens once per rule target and checks every segment: all
//! but the last must be objects or object lists, the last must be a scalar
//! or scalar list. The resolved segment list is what
//! [`Entity::assign`](super::entity::Entity::assign) walks.

use super::entity::{EntityShape, FieldDef, FieldKind, ScalarKind};
use crate::error::{MarcError, Result};

/// A dotted path checked against a shape.
#[derive(Debug, Clone)]
pub struct TargetPath {
    text: String,
    root: &'static EntityShape,
    segments: Vec<&'static FieldDef>,
}

impl TargetPath {
    /// Resolve `text` (e.g. `"contributors.name"`) against `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::UnresolvedPath`] when a segment is missing from
    /// the shape, a scalar has children, or the path ends on an object.
    pub fn resolve(shape: &'static EntityShape, text: &str) -> Result<Self> {
        let fail = |reason: String| MarcError::UnresolvedPath {
            path: text.to_string(),
            reason,
        };

        let parts: Vec<&str> = text.split('.').collect();
        let mut current = shape;
        let mut segments = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let last = index + 1 == parts.len();
            let def = current
                .field(part)
                .ok_or_else(|| fail(format!("'{}' has no field '{part}'", current.name)))?;

            match def.kind {
                FieldKind::Object(child) | FieldKind::ObjectList(child) => {
                    if last {
                        return Err(fail(format!("'{part}' is an object, not a value")));
                    }
                    current = child;
                },
                FieldKind::Scalar(_) | FieldKind::ScalarList(_) => {
                    if !last {
                        return Err(fail(format!("'{part}' is a value and has no fields")));
                    }
                },
            }
            segments.push(def);
        }

        Ok(TargetPath {
            text: text.to_string(),
            root: shape,
            segments,
        })
    }

    /// The path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Shape the path was resolved against.
    #[must_use]
    pub fn root(&self) -> &'static EntityShape {
        self.root
    }

    /// Resolved segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[&'static FieldDef] {
        &self.segments
    }

    /// Scalar type of the final segment.
    #[must_use]
    pub fn leaf_kind(&self) -> ScalarKind {
        match self.segments.last().map(|def| def.kind) {
            Some(FieldKind::Scalar(kind) | FieldKind::ScalarList(kind)) => kind,
            _ => ScalarKind::Str,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::shapes::{AUTHORITY, HOLDINGS, INSTANCE};

    #[test]
    fn test_resolve_nested() {
        let path = TargetPath::resolve(&INSTANCE, "contributors.primary").unwrap();
        assert_eq!(path.segments().len(), 2);
        assert_eq!(path.leaf_kind(), ScalarKind::Bool);
        assert_eq!(path.as_str(), "contributors.primary");
    }

    #[test]
    fn test_resolve_single_object() {
        let path = TargetPath::resolve(&HOLDINGS, "callNumber.prefix").unwrap();
        assert_eq!(path.segments()[0].name, "callNumber");
    }

    #[test]
    fn test_unknown_segment() {
        let err = TargetPath::resolve(&INSTANCE, "contributors.nickname").unwrap_err();
        assert!(matches!(err, MarcError::UnresolvedPath { .. }));
        assert!(TargetPath::resolve(&INSTANCE, "").is_err());
    }

    #[test]
    fn test_path_must_end_on_value() {
        assert!(TargetPath::resolve(&INSTANCE, "identifiers").is_err());
        assert!(TargetPath::resolve(&INSTANCE, "title.value").is_err());
    }

    #[test]
    fn test_relation_paths() {
        for relation in ["broaderTerm", "narrowerTerm", "earlierHeading", "laterHeading"] {
            assert!(TargetPath::resolve(&AUTHORITY, &format!("{relation}.headingRef")).is_ok());
            assert!(TargetPath::resolve(&AUTHORITY, &format!("{relation}.headingType")).is_ok());
        }
    }
}
