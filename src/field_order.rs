//! Placement of new fields among existing ones.
//!
//! Control fields are always kept in ascending tag order. Data fields follow
//! one of two rules depending on their leading tag digit:
//!
//! - **Sortable** groups (by default `0`, `1`, `8`, `9`): the field goes in
//!   ascending tag order, after any fields with an equal tag.
//! - **Thematic** groups (everything else): cataloguers order these by meaning,
//!   not by tag, so the field goes directly after the last field sharing its
//!   leading digit. If the group is empty, ascending tag order is used.
//!
//! ```
//! use marc_rules::field_order::{insert_data_field, DEFAULT_SORTABLE_PREFIXES};
//! use marc_rules::{Field, Leader, Record};
//!
//! let mut record = Record::new(Leader::default());
//! for tag in ["490", "507", "650"] {
//!     record.add_field(Field::new(tag.to_string(), ' ', ' '));
//! }
//! let note = Field::new("500".to_string(), ' ', ' ');
//! insert_data_field(&mut record, note, DEFAULT_SORTABLE_PREFIXES);
//!
//! let tags: Vec<&str> = record.fields.iter().map(|f| f.tag.as_str()).collect();
//! assert_eq!(tags, ["490", "507", "500", "650"]);
//! ```

use crate::record::{ControlField, Field, Record};

/// Leading tag digits whose fields are inserted in ascending tag order.
pub const DEFAULT_SORTABLE_PREFIXES: &[char] = &['0', '1', '8', '9'];

/// Index at which a data field with `tag` should be inserted into `fields`.
#[must_use]
pub fn data_field_position(fields: &[Field], tag: &str, sortable_prefixes: &[char]) -> usize {
    let leading = tag.chars().next();
    let sortable = leading.map_or(true, |c| sortable_prefixes.contains(&c));

    if !sortable {
        if let Some(last) = fields.iter().rposition(|f| f.tag.chars().next() == leading) {
            return last + 1;
        }
    }

    ascending_position(fields.iter().map(|f| f.tag.as_str()), tag)
}

/// Insert a data field using the placement rules above. Returns its index.
pub fn insert_data_field(record: &mut Record, field: Field, sortable_prefixes: &[char]) -> usize {
    let position = data_field_position(&record.fields, &field.tag, sortable_prefixes);
    record.fields.insert(position, field);
    position
}

/// Insert a control field in ascending tag order. Returns its index.
pub fn insert_control_field(record: &mut Record, field: ControlField) -> usize {
    let position = ascending_position(
        record.control_fields.iter().map(|cf| cf.tag.as_str()),
        &field.tag,
    );
    record.control_fields.insert(position, field);
    position
}

/// First position whose tag sorts after `tag`, so equal tags keep their order.
fn ascending_position<'a>(tags: impl Iterator<Item = &'a str>, tag: &str) -> usize {
    let mut position = 0;
    for (index, existing) in tags.enumerate() {
        if existing > tag {
            return index;
        }
        position = index + 1;
    }
    position
}
