//! Edit mode: ordered directives applied to one record.
//!
//! Malformed directives and refused changes are logged and skipped; a bad
//! directive never aborts the rest of the batch.

use super::config::ModifierConfig;
use super::directives::{Action, EditDirective, FieldSpec, Position, Subaction, SubfieldDirective};
use super::protection::ProtectionSet;
use crate::field_order::{insert_control_field, insert_data_field};
use crate::field_query::IndicatorPattern;
use crate::leader::Leader;
use crate::record::{is_control_tag, ControlField, Field, Record, Subfield};
use regex::{NoExpand, Regex};
use tracing::{debug, warn};

/// How a REPLACE/REMOVE `find` string selects text in a subfield value.
#[derive(Debug)]
enum FindPattern {
    /// `*` or omitted: the whole value
    Everything,
    /// Plain substring
    Literal(String),
    /// Glob with `*`, matched against the whole value
    Glob(Regex),
}

impl FindPattern {
    fn parse(find: Option<&str>) -> Option<Self> {
        match find {
            None | Some("*") => Some(FindPattern::Everything),
            Some(text) if text.contains('*') => {
                let body = text
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                match Regex::new(&format!("^(?s:{body})$")) {
                    Ok(re) => Some(FindPattern::Glob(re)),
                    Err(e) => {
                        warn!(find = text, error = %e, "Unusable find pattern");
                        None
                    },
                }
            },
            Some(text) => Some(FindPattern::Literal(text.to_string())),
        }
    }

    /// The rewritten value, or `None` when nothing matched.
    fn apply(&self, value: &str, replacement: &str) -> Option<String> {
        match self {
            FindPattern::Everything => Some(replacement.to_string()),
            FindPattern::Literal(text) if text.is_empty() => None,
            FindPattern::Literal(text) => value
                .contains(text.as_str())
                .then(|| value.replace(text.as_str(), replacement)),
            FindPattern::Glob(re) => re
                .is_match(value)
                .then(|| re.replace_all(value, NoExpand(replacement)).into_owned()),
        }
    }
}

/// Rewrite an inclusive character range of a fixed-length value.
///
/// REPLACE pads or truncates the replacement to the range width. REMOVE
/// blanks the range when `keep_length` is set and deletes it otherwise.
fn splice_range(
    value: &str,
    (start, end): (usize, usize),
    directive: &SubfieldDirective,
    keep_length: bool,
) -> Option<String> {
    let chars: Vec<char> = value.chars().collect();
    if end >= chars.len() {
        warn!(range = %directive.subfield, length = chars.len(), "Range past end of value");
        return None;
    }
    let current: String = chars[start..=end].iter().collect();
    if let Some(find) = directive.data.find.as_deref() {
        if find != "*" && find != current {
            debug!(range = %directive.subfield, found = %current, "Range guard did not match");
            return None;
        }
    }

    let width = end - start + 1;
    let middle: String = match directive.subaction {
        Some(Subaction::Replace) => {
            let replacement = directive.data.replace_with.as_deref().unwrap_or("");
            replacement.chars().chain(std::iter::repeat(' ')).take(width).collect()
        },
        Some(Subaction::Remove) if keep_length => " ".repeat(width),
        Some(Subaction::Remove) => String::new(),
        other => {
            warn!(subaction = ?other, "Unsupported subaction for a positional edit");
            return None;
        },
    };

    let mut result: String = chars[..start].iter().collect();
    result.push_str(&middle);
    result.extend(&chars[end + 1..]);
    Some(result)
}

fn matches_code(directive: &SubfieldDirective, code: char) -> bool {
    directive.is_wildcard() || directive.code() == Some(code)
}

/// Applies directives to one record under a protection set.
pub(crate) struct Editor<'a> {
    record: &'a mut Record,
    protection: &'a ProtectionSet,
    config: &'a ModifierConfig,
}

impl<'a> Editor<'a> {
    pub(crate) fn new(
        record: &'a mut Record,
        protection: &'a ProtectionSet,
        config: &'a ModifierConfig,
    ) -> Self {
        Editor {
            record,
            protection,
            config,
        }
    }

    /// Apply directives in ascending `order`; equal orders keep their sequence.
    pub(crate) fn apply_all(&mut self, directives: &[EditDirective]) {
        let mut ordered: Vec<&EditDirective> = directives.iter().collect();
        ordered.sort_by_key(|d| d.order);
        for directive in ordered {
            self.apply(directive);
        }
    }

    pub(crate) fn apply(&mut self, directive: &EditDirective) {
        debug!(action = ?directive.action, tag = %directive.field.field, "Applying directive");
        let spec = &directive.field;
        match directive.action {
            Action::Add => self.add(spec),
            Action::Delete => self.delete(spec),
            Action::Edit => {
                for sub in &spec.subfields {
                    self.edit(spec, sub);
                }
            },
            Action::Move => {
                for sub in &spec.subfields {
                    self.relocate(spec, sub);
                }
            },
        }
    }

    fn add(&mut self, spec: &FieldSpec) {
        if is_control_tag(&spec.field) {
            let Some(text) = spec.subfields.iter().find_map(|s| s.data.text.as_deref()) else {
                warn!(tag = %spec.field, "ADD of a control field without text");
                return;
            };
            let field = ControlField::new(spec.field.clone(), text);
            if self.protection.is_control_protected(&field) {
                warn!(tag = %field.tag, "Protected control field not added");
                return;
            }
            insert_control_field(self.record, field);
            return;
        }

        let mut field = Field::new(
            spec.field.clone(),
            spec.indicator1.value().unwrap_or(' '),
            spec.indicator2.value().unwrap_or(' '),
        );
        for sub in &spec.subfields {
            match (sub.code(), sub.data.text.as_deref()) {
                (Some(code), Some(text)) if !text.is_empty() => field.add_subfield_str(code, text),
                _ => debug!(subfield = %sub.subfield, "Skipping ADD subfield without code or text"),
            }
        }
        if field.is_empty() {
            warn!(tag = %spec.field, "ADD produced an empty field");
            return;
        }
        if self.protection.is_field_protected(&field) {
            warn!(tag = %field.tag, "Protected field not added");
            return;
        }
        insert_data_field(self.record, field, &self.config.sortable_tag_prefixes);
    }

    fn delete(&mut self, spec: &FieldSpec) {
        let protection = self.protection;
        if is_control_tag(&spec.field) {
            let removed = self.record.remove_control_fields_where(|cf| {
                cf.tag == spec.field && !protection.is_control_protected(cf)
            });
            debug!(tag = %spec.field, count = removed.len(), "Deleted control fields");
            return;
        }

        let query = spec.query();
        let whole_field = spec.subfields.is_empty()
            || spec.subfields.iter().any(SubfieldDirective::is_wildcard);
        if whole_field {
            let removed = self
                .record
                .remove_fields_where(|f| query.matches(f) && !protection.is_field_protected(f));
            debug!(tag = %spec.field, count = removed.len(), "Deleted fields");
            return;
        }

        let codes = spec.codes();
        for field in self.record.fields.iter_mut().filter(|f| query.matches(f)) {
            let snapshot = field.clone();
            field.remove_subfields_where(|sf| {
                codes.contains(&sf.code) && !protection.is_subfield_protected(&snapshot, sf)
            });
        }
        self.drop_emptied(|f| query.matches(f));
    }

    fn edit(&mut self, spec: &FieldSpec, sub: &SubfieldDirective) {
        if spec.is_leader() {
            self.edit_leader(sub);
        } else if is_control_tag(&spec.field) {
            self.edit_control(spec, sub);
        } else {
            match sub.subaction {
                Some(Subaction::Insert) => self.insert(spec, sub),
                Some(Subaction::Replace | Subaction::Remove) => self.replace(spec, sub),
                other => warn!(subaction = ?other, tag = %spec.field, "Unsupported EDIT subaction"),
            }
        }
    }

    fn edit_leader(&mut self, sub: &SubfieldDirective) {
        let range = match sub.position_range() {
            Ok(range) => range,
            Err(e) => {
                warn!(error = %e, "Skipping leader edit");
                return;
            },
        };
        if Leader::overlaps_reserved(range.0, range.1) {
            warn!(range = %sub.subfield, "Leader edit touches structural positions; refused");
            return;
        }
        let current = match self.record.leader.render() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Leader cannot be rendered; edit skipped");
                return;
            },
        };
        let Some(updated) = splice_range(&current, range, sub, true) else {
            return;
        };
        match Leader::parse(&updated) {
            Ok(leader) => self.record.leader = leader,
            Err(e) => warn!(error = %e, "Edited leader is invalid; edit skipped"),
        }
    }

    fn edit_control(&mut self, spec: &FieldSpec, sub: &SubfieldDirective) {
        let range = match sub.position_range() {
            Ok(range) => range,
            Err(e) => {
                warn!(tag = %spec.field, error = %e, "Skipping control field edit");
                return;
            },
        };
        let keep_length = matches!(spec.field.as_str(), "006" | "007" | "008");
        for field in self.record.control_fields.iter_mut().filter(|cf| cf.tag == spec.field) {
            if self.protection.is_control_protected(field) {
                debug!(tag = %field.tag, "Protected control field left unchanged");
                continue;
            }
            if let Some(updated) = splice_range(&field.value, range, sub, keep_length) {
                field.value = updated;
            }
        }
    }

    fn insert(&mut self, spec: &FieldSpec, sub: &SubfieldDirective) {
        let Some(text) = sub.data.text.as_deref() else {
            warn!(tag = %spec.field, "INSERT without text");
            return;
        };
        let query = spec.query();
        let protection = self.protection;
        let position = sub.position.unwrap_or(Position::NewSubfield);

        for field in self.record.fields.iter_mut().filter(|f| query.matches(f)) {
            match position {
                Position::NewSubfield => {
                    let Some(code) = sub.code() else {
                        warn!(subfield = %sub.subfield, "NEW_SUBFIELD needs a single code");
                        return;
                    };
                    let subfield = Subfield::new(code, text);
                    if protection.is_subfield_protected(field, &subfield) {
                        continue;
                    }
                    field.subfields.push(subfield);
                },
                Position::BeforeString | Position::AfterString => {
                    let snapshot = field.clone();
                    for sf in field.subfields.iter_mut() {
                        if !matches_code(sub, sf.code)
                            || protection.is_subfield_protected(&snapshot, sf)
                        {
                            continue;
                        }
                        if position == Position::BeforeString {
                            sf.value.insert_str(0, text);
                        } else {
                            sf.value.push_str(text);
                        }
                    }
                },
            }
        }
    }

    fn replace(&mut self, spec: &FieldSpec, sub: &SubfieldDirective) {
        let Some(pattern) = FindPattern::parse(sub.data.find.as_deref()) else {
            return;
        };
        let replacement = match sub.subaction {
            Some(Subaction::Replace) => sub.data.replace_with.as_deref().unwrap_or(""),
            _ => "",
        };
        let query = spec.query();
        let protection = self.protection;

        for field in self.record.fields.iter_mut().filter(|f| query.matches(f)) {
            let snapshot = field.clone();
            for sf in field.subfields.iter_mut() {
                if !matches_code(sub, sf.code) || protection.is_subfield_protected(&snapshot, sf) {
                    continue;
                }
                if let Some(updated) = pattern.apply(&sf.value, replacement) {
                    sf.value = updated;
                }
            }
            field.remove_subfields_where(|sf| sf.value.is_empty());
        }
        self.drop_emptied(|f| query.matches(f));
    }

    fn relocate(&mut self, spec: &FieldSpec, sub: &SubfieldDirective) {
        let Some(destination) = sub.data.relocation_field.as_deref() else {
            warn!(tag = %spec.field, "MOVE without a relocation field");
            return;
        };
        let target_code = destination.subfields.first().and_then(SubfieldDirective::code);
        let remap = |sf: &Subfield| match (sub.is_wildcard(), target_code) {
            (false, Some(code)) => Subfield::new(code, sf.value.clone()),
            _ => sf.clone(),
        };

        let query = spec.query();
        let protection = self.protection;
        let movable = |field: &Field, sf: &Subfield| {
            matches_code(sub, sf.code) && !protection.is_subfield_protected(field, sf)
        };

        // (source index, subfields taken from it)
        let plan: Vec<(usize, Vec<Subfield>)> = self
            .record
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| query.matches(f))
            .filter_map(|(index, f)| {
                let taken: Vec<Subfield> =
                    f.subfields.iter().filter(|sf| movable(f, sf)).map(&remap).collect();
                (!taken.is_empty()).then_some((index, taken))
            })
            .collect();
        if plan.is_empty() {
            debug!(tag = %spec.field, "Nothing to move");
            return;
        }

        let mut created = Vec::new();
        let moved_from: Vec<usize> = match sub.subaction {
            Some(Subaction::CreateNewField) => {
                let mut moved_from = Vec::new();
                for (index, taken) in &plan {
                    let source = &self.record.fields[*index];
                    let inherit = |pattern: IndicatorPattern, fallback: char| {
                        pattern.value().unwrap_or(fallback)
                    };
                    let mut field = Field::new(
                        destination.field.clone(),
                        inherit(destination.indicator1, source.indicator1),
                        inherit(destination.indicator2, source.indicator2),
                    );
                    field.subfields.extend(taken.iter().cloned());
                    if self.protection.is_field_protected(&field) {
                        warn!(tag = %field.tag, "Protected destination field not created");
                        continue;
                    }
                    created.push(field);
                    moved_from.push(*index);
                }
                moved_from
            },
            Some(Subaction::AddToExistingField) => {
                let target = destination.query();
                let sources: Vec<usize> = plan.iter().map(|(index, _)| *index).collect();
                let targets: Vec<usize> = self
                    .record
                    .fields
                    .iter()
                    .enumerate()
                    .filter(|(index, f)| target.matches(f) && !sources.contains(index))
                    .map(|(index, _)| index)
                    .collect();
                if targets.is_empty() {
                    debug!(
                        tag = %destination.field,
                        "No existing destination field; nothing moves"
                    );
                    return;
                }
                let moved: Vec<Subfield> =
                    plan.iter().flat_map(|(_, taken)| taken.iter().cloned()).collect();
                for index in targets {
                    self.record.fields[index].subfields.extend(moved.iter().cloned());
                }
                sources
            },
            other => {
                warn!(subaction = ?other, "Unsupported MOVE subaction");
                return;
            },
        };

        for &index in &moved_from {
            let field = &mut self.record.fields[index];
            let snapshot = field.clone();
            field.remove_subfields_where(|sf| movable(&snapshot, sf));
        }
        let mut index = 0;
        self.record.fields.retain(|f| {
            let keep = !(moved_from.contains(&index) && f.is_empty());
            index += 1;
            keep
        });
        for field in created {
            insert_data_field(self.record, field, &self.config.sortable_tag_prefixes);
        }
    }

    fn drop_emptied(&mut self, scope: impl Fn(&Field) -> bool) {
        self.record.remove_fields_where(|f| scope(f) && f.is_empty());
    }
}
