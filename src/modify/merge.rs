//! Merge mode: fold an incoming record into a previously matched one.
//!
//! Each merge detail names a tag (and optionally indicators and subfield
//! codes). Without details every tag present on either side is merged,
//! except the configured system tags.
//!
//! - Whole-field details: the existing fields of the group are rebuilt from
//!   the incoming ones. Non-repeatable fields are replaced wholesale;
//!   repeatable fields are only added when no equal field remains. Existing
//!   fields that nothing replaced are pruned unless protected or retained by
//!   the [`MergePolicy`].
//! - Subfield details: incoming and existing fields are paired by position
//!   and only the named codes are replaced.
//!
//! The leader is always taken from the incoming record.

use super::config::ModifierConfig;
use super::directives::FieldSpec;
use super::protection::ProtectionSet;
use crate::field_order::{insert_control_field, insert_data_field};
use crate::field_query::WILDCARD;
use crate::record::{is_control_tag, Field, Record, Subfield};
use indexmap::IndexSet;
use smallvec::SmallVec;
use std::borrow::Cow;
use tracing::debug;

/// Hooks that let a caller take part in merging data fields.
pub trait MergePolicy {
    /// Adjust an incoming field against the existing field it was paired
    /// with, if any. Both sides may be changed.
    fn reconcile(&mut self, existing: Option<&mut Field>, incoming: &mut Field);

    /// Whether an existing field that no incoming field replaced must
    /// survive pruning.
    fn retains(&self, field: &Field) -> bool;
}

/// Merge without extra rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainMerge;

impl MergePolicy for PlainMerge {
    fn reconcile(&mut self, _existing: Option<&mut Field>, _incoming: &mut Field) {}

    fn retains(&self, _field: &Field) -> bool {
        false
    }
}

/// Pick the existing field an incoming field should be compared with:
/// an equal field, then one with the same `$0`, then the one at the same
/// position.
fn partner(old: &[Field], paired: &[bool], incoming: &Field, position: usize) -> Option<usize> {
    let free = |index: &usize| !paired[*index];
    if let Some(index) = (0..old.len()).filter(free).find(|&i| old[i] == *incoming) {
        return Some(index);
    }
    if let Some(id) = incoming.get_subfield('0') {
        if let Some(index) = (0..old.len())
            .filter(free)
            .find(|&i| old[i].get_subfield('0') == Some(id))
        {
            return Some(index);
        }
    }
    (position < old.len() && !paired[position]).then_some(position)
}

/// Replace the `codes` subfields of `existing` with those of `incoming`,
/// placed where the first replaced subfield was.
fn replace_codes(existing: &mut Field, incoming: &Field, codes: &[char]) {
    let mut replacements: Vec<Subfield> = incoming
        .subfields
        .iter()
        .filter(|sf| codes.contains(&sf.code))
        .cloned()
        .collect();
    let mut result: SmallVec<[Subfield; 4]> = SmallVec::new();
    let mut placed = false;
    for sf in std::mem::take(&mut existing.subfields) {
        if codes.contains(&sf.code) {
            if !placed {
                result.extend(replacements.drain(..));
                placed = true;
            }
        } else {
            result.push(sf);
        }
    }
    result.extend(replacements);
    existing.subfields = result;
}

pub(crate) struct Merger<'a> {
    record: &'a mut Record,
    protection: &'a ProtectionSet,
    config: &'a ModifierConfig,
    policy: &'a mut dyn MergePolicy,
}

impl<'a> Merger<'a> {
    pub(crate) fn new(
        record: &'a mut Record,
        protection: &'a ProtectionSet,
        config: &'a ModifierConfig,
        policy: &'a mut dyn MergePolicy,
    ) -> Self {
        Merger {
            record,
            protection,
            config,
            policy,
        }
    }

    pub(crate) fn merge(&mut self, incoming: &Record, details: &[FieldSpec]) {
        self.record.leader = incoming.leader.clone();

        let details: Cow<'_, [FieldSpec]> =
            if details.is_empty() || details.iter().any(|d| d.field == WILDCARD) {
                Cow::Owned(self.expand_details(incoming, details))
            } else {
                Cow::Borrowed(details)
            };

        for detail in details.iter() {
            if is_control_tag(&detail.field) {
                self.merge_control(incoming, &detail.field);
            } else if detail.codes().is_empty() {
                self.merge_whole(incoming, detail);
            } else {
                self.merge_subfields(incoming, detail);
            }
        }
    }

    /// One detail per tag on either side for every wildcard (or missing) detail.
    fn expand_details(&self, incoming: &Record, details: &[FieldSpec]) -> Vec<FieldSpec> {
        let tags: IndexSet<String> = self
            .record
            .tags()
            .chain(incoming.tags())
            .filter(|tag| !self.config.is_system_tag(tag))
            .map(str::to_string)
            .collect();

        if details.is_empty() {
            return tags.into_iter().map(FieldSpec::new).collect();
        }
        details
            .iter()
            .flat_map(|detail| {
                if detail.field == WILDCARD {
                    tags.iter()
                        .map(|tag| FieldSpec {
                            field: tag.clone(),
                            ..detail.clone()
                        })
                        .collect()
                } else {
                    vec![detail.clone()]
                }
            })
            .collect()
    }

    fn merge_control(&mut self, incoming: &Record, tag: &str) {
        let protection = self.protection;
        let kept: Vec<_> = self
            .record
            .control_fields
            .iter()
            .filter(|cf| cf.tag == tag && protection.is_control_protected(cf))
            .cloned()
            .collect();
        let removed = self.record.remove_control_fields_where(|cf| {
            cf.tag == tag && !protection.is_control_protected(cf)
        });

        let non_repeatable = self.config.is_non_repeatable_tag(tag);
        if non_repeatable && !kept.is_empty() {
            debug!(tag, "Protected control field kept over incoming value");
            return;
        }
        let limit = if non_repeatable { 1 } else { usize::MAX };
        let mut added = 0;
        for field in incoming.control_fields.iter().filter(|cf| cf.tag == tag).take(limit) {
            if !kept.contains(field) {
                insert_control_field(self.record, field.clone());
                added += 1;
            }
        }
        debug!(tag, removed = removed.len(), added, "Merged control field");
    }

    fn merge_whole(&mut self, incoming: &Record, detail: &FieldSpec) {
        let query = detail.query();
        let mut arriving: Vec<Field> = incoming.fields_matching(&query).cloned().collect();
        let anchor = self.record.fields.iter().position(|f| query.matches(f));
        let mut old = self.record.remove_fields_where(|f| query.matches(f));

        let mut paired = vec![false; old.len()];
        for (position, field) in arriving.iter_mut().enumerate() {
            let found = partner(&old, &paired, field, position);
            if let Some(index) = found {
                paired[index] = true;
            }
            self.policy
                .reconcile(found.map(|index| &mut old[index]), field);
        }

        let mut rebuilt: Vec<Field> = Vec::new();
        for (index, field) in old.into_iter().enumerate() {
            if self.protection.is_field_protected(&field)
                || (!paired[index] && self.policy.retains(&field))
            {
                rebuilt.push(field);
            } else if !paired[index] {
                debug!(tag = %field.tag, "Pruned field absent from incoming record");
            }
        }

        let survivors = rebuilt.len();
        for field in arriving {
            if self.config.is_non_repeatable(&field)
                && rebuilt
                    .iter()
                    .any(|f| f.tag == field.tag && self.config.is_non_repeatable(f))
            {
                debug!(tag = %field.tag, "Non-repeatable field already present; incoming dropped");
                continue;
            }
            if rebuilt.contains(&field) {
                continue;
            }
            rebuilt.push(field);
        }
        debug!(
            tag = %detail.field,
            kept = survivors,
            total = rebuilt.len(),
            "Merged field group"
        );

        match anchor {
            Some(position) => {
                let tail = self.record.fields.split_off(position);
                self.record.fields.extend(rebuilt);
                self.record.fields.extend(tail);
            },
            None => {
                for field in rebuilt {
                    insert_data_field(self.record, field, &self.config.sortable_tag_prefixes);
                }
            },
        }
    }

    fn merge_subfields(&mut self, incoming: &Record, detail: &FieldSpec) {
        let query = detail.query();
        let codes = detail.codes();
        let targets: Vec<usize> = self
            .record
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| query.matches(f))
            .map(|(index, _)| index)
            .collect();
        let arriving: Vec<Field> = incoming.fields_matching(&query).cloned().collect();

        let mut unpaired = Vec::new();
        for (position, mut field) in arriving.into_iter().enumerate() {
            let Some(&index) = targets.get(position) else {
                unpaired.push(field);
                continue;
            };
            let existing = &mut self.record.fields[index];
            if self.protection.is_field_protected(existing) {
                debug!(tag = %existing.tag, "Protected field left unchanged");
                continue;
            }
            self.policy.reconcile(Some(&mut *existing), &mut field);
            replace_codes(existing, &field, &codes);
        }

        for mut field in unpaired {
            self.policy.reconcile(None, &mut field);
            if self.protection.is_field_protected(&field) {
                debug!(tag = %field.tag, "Protected incoming field not added");
                continue;
            }
            insert_data_field(self.record, field, &self.config.sortable_tag_prefixes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_query::IndicatorPattern;
    use crate::leader::Leader;
    use crate::modify::directives::SubfieldDirective;
    use crate::modify::protection::ProtectionSetting;

    fn field(tag: &str, ind1: char, ind2: char, subfields: &[(char, &str)]) -> Field {
        let mut f = Field::new(tag.to_string(), ind1, ind2);
        for &(code, value) in subfields {
            f.add_subfield_str(code, value);
        }
        f
    }

    fn existing() -> Record {
        let mut record = Record::new(Leader::default());
        record.add_control_field_str("001", "local-1");
        record.add_control_field_str("005", "20200101000000.0");
        record.add_field(field("020", ' ', ' ', &[('a', "111")]));
        record.add_field(field("245", '1', '0', &[('a', "Old title")]));
        record.add_field(field("500", ' ', ' ', &[('a', "Local note")]));
        record.add_field(field("650", ' ', '0', &[('a', "Cats")]));
        record.add_field(field("650", ' ', '0', &[('a', "Dogs")]));
        record.add_field(field("999", 'f', 'f', &[('i', "uuid-1")]));
        record
    }

    fn incoming() -> Record {
        let mut leader = Leader::default();
        leader.record_status = 'c';
        let mut record = Record::new(leader);
        record.add_control_field_str("001", "remote-9");
        record.add_control_field_str("005", "20240101000000.0");
        record.add_field(field("020", ' ', ' ', &[('a', "111")]));
        record.add_field(field("245", '1', '0', &[('a', "New title")]));
        record.add_field(field("650", ' ', '0', &[('a', "Dogs")]));
        record.add_field(field("650", ' ', '0', &[('a', "Birds")]));
        record
    }

    fn merge(
        record: &mut Record,
        incoming: &Record,
        protection: &ProtectionSet,
        details: &[FieldSpec],
    ) {
        let config = ModifierConfig::default();
        let mut policy = PlainMerge;
        Merger::new(record, protection, &config, &mut policy).merge(incoming, details);
    }

    fn values(record: &Record, tag: &str) -> Vec<String> {
        record
            .fields_by_tag(tag)
            .filter_map(|f| f.get_subfield('a').map(str::to_string))
            .collect()
    }

    #[test]
    fn test_implicit_merge() {
        let mut record = existing();
        merge(&mut record, &incoming(), &ProtectionSet::none(), &[]);

        assert_eq!(record.leader.record_status, 'c');
        // system tags untouched
        assert_eq!(record.get_control_field("001"), Some("local-1"));
        assert_eq!(record.get_field("999").unwrap().get_subfield('i'), Some("uuid-1"));

        assert_eq!(record.get_control_field("005"), Some("20240101000000.0"));
        assert_eq!(values(&record, "245"), vec!["New title"]);
        assert_eq!(values(&record, "020"), vec!["111"]);
        assert_eq!(values(&record, "650"), vec!["Dogs", "Birds"]);
        assert!(record.get_field("500").is_none());
    }

    #[test]
    fn test_protected_field_survives_pruning() {
        let mut record = existing();
        let protection = ProtectionSet::new(vec![ProtectionSetting::new("p", "500")], &[]);
        merge(&mut record, &incoming(), &protection, &[]);
        assert_eq!(values(&record, "500"), vec!["Local note"]);
    }

    #[test]
    fn test_protected_non_repeatable_wins() {
        let mut record = existing();
        let protection = ProtectionSet::new(vec![ProtectionSetting::new("p", "245")], &[]);
        merge(&mut record, &incoming(), &protection, &[]);
        assert_eq!(values(&record, "245"), vec!["Old title"]);
    }

    #[test]
    fn test_repeatable_not_duplicated() {
        let mut record = existing();
        let protection = ProtectionSet::new(vec![ProtectionSetting::new("p", "650")], &[]);
        merge(&mut record, &incoming(), &protection, &[]);
        assert_eq!(values(&record, "650"), vec!["Cats", "Dogs", "Birds"]);
    }

    #[test]
    fn test_declared_detail_limits_merge() {
        let mut record = existing();
        merge(&mut record, &incoming(), &ProtectionSet::none(), &[FieldSpec::new("245")]);
        assert_eq!(values(&record, "245"), vec!["New title"]);
        assert_eq!(values(&record, "500"), vec!["Local note"]);
        assert_eq!(values(&record, "650"), vec!["Cats", "Dogs"]);
        assert_eq!(record.get_control_field("005"), Some("20200101000000.0"));
    }

    #[test]
    fn test_subfield_detail_replaces_named_codes() {
        let mut record = Record::new(Leader::default());
        record.add_field(field(
            "100",
            '1',
            ' ',
            &[('a', "Smith"), ('d', "1970-"), ('e', "author")],
        ));
        let mut incoming = Record::new(Leader::default());
        incoming.add_field(field("100", '1', ' ', &[('a', "Smythe"), ('d', "1970-2020")]));

        let detail = FieldSpec::new("100").subfield(SubfieldDirective::new("d"));
        merge(&mut record, &incoming, &ProtectionSet::none(), &[detail]);

        let merged = record.get_field("100").unwrap();
        assert_eq!(merged.get_subfield('a'), Some("Smith"));
        assert_eq!(merged.get_subfield('d'), Some("1970-2020"));
        assert_eq!(merged.get_subfield('e'), Some("author"));
        let codes: Vec<char> = merged.subfields.iter().map(|sf| sf.code).collect();
        assert_eq!(codes, vec!['a', 'd', 'e']);
    }

    #[test]
    fn test_wildcard_detail_expands_with_indicators() {
        let mut record = existing();
        let detail =
            FieldSpec::new("*").indicators(IndicatorPattern::Any, IndicatorPattern::Exact('0'));
        merge(&mut record, &incoming(), &ProtectionSet::none(), &[detail]);
        // only fields with indicator2 '0' took part
        assert_eq!(values(&record, "650"), vec!["Dogs", "Birds"]);
        assert_eq!(values(&record, "245"), vec!["New title"]);
        assert_eq!(values(&record, "500"), vec!["Local note"]);
    }

    #[test]
    fn test_retaining_policy_vetoes_pruning() {
        struct KeepLocal;
        impl MergePolicy for KeepLocal {
            fn reconcile(&mut self, _existing: Option<&mut Field>, _incoming: &mut Field) {}
            fn retains(&self, field: &Field) -> bool {
                field.get_subfield('a') == Some("Local note")
            }
        }

        let mut record = existing();
        let config = ModifierConfig::default();
        let protection = ProtectionSet::none();
        let mut policy = KeepLocal;
        Merger::new(&mut record, &protection, &config, &mut policy).merge(&incoming(), &[]);
        assert_eq!(values(&record, "500"), vec!["Local note"]);
    }

    #[test]
    fn test_partner_selection() {
        let old = vec![
            field("650", ' ', '0', &[('a', "A"), ('0', "id-1")]),
            field("650", ' ', '0', &[('a', "B"), ('0', "id-2")]),
        ];
        let paired = vec![false, false];
        let same_id = field("650", ' ', '0', &[('a', "B2"), ('0', "id-2")]);
        assert_eq!(partner(&old, &paired, &same_id, 0), Some(1));
        let equal = old[0].clone();
        assert_eq!(partner(&old, &paired, &equal, 1), Some(0));
        let unrelated = field("650", ' ', '0', &[('a', "C")]);
        assert_eq!(partner(&old, &[true, false], &unrelated, 0), None);
    }
}
