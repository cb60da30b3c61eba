//! Rule expansion for authority-shaped targets.
//!
//! Authority headings need more than the rule document states literally:
//!
//! - In 1xx, 4xx and 5xx fields carrying subdivisions (`$v $x $y $z`) the
//!   subdivisions are joined with `--` while the main heading parts keep
//!   their space separator.
//! - In 5xx fields the control subfield `$w` names the relation to the
//!   referenced heading. Each relation adds a group filling
//!   `<relation>.headingRef` and `<relation>.headingType`.
//! - Every 5xx rule gets a truncated twin targeting `<target>Trunc`, fed by
//!   the same subfields minus `$i` and the numeric control subfields.
//!
//! Rules inside an entity group are expanded like top-level rules: they feed
//! the relation groups, and the group gets a truncated twin of its own.
//!
//! The expanded list is ordered relation groups, then the original rules,
//! then the truncated twins.

use super::rules::{Condition, DelimiterSpec, FieldRule, MappingRule};
use crate::record::Field;

/// Codes holding heading subdivisions.
pub const SUBDIVISION_CODES: [char; 4] = ['x', 'y', 'z', 'v'];

/// Separator used between subdivisions.
pub const SUBDIVISION_SEPARATOR: &str = "--";

/// Suffix of truncated-heading targets.
pub const TRUNCATED_SUFFIX: &str = "Trunc";

/// Relation named by one `$w` character, if any.
#[must_use]
pub fn relation_for(code: char) -> Option<&'static str> {
    match code {
        'g' => Some("broaderTerm"),
        'h' => Some("narrowerTerm"),
        'a' => Some("earlierHeading"),
        'b' => Some("laterHeading"),
        _ => None,
    }
}

/// Expand the rules selected for one field of an authority record.
#[must_use]
pub fn expand_rules(field: &Field, rules: &[&FieldRule]) -> Vec<FieldRule> {
    let leading = field.tag.chars().next();
    let mut originals: Vec<FieldRule> = rules.iter().map(|rule| (*rule).clone()).collect();

    if matches!(leading, Some('1' | '4' | '5'))
        && SUBDIVISION_CODES.iter().any(|&c| field.has_subfield(c))
    {
        for rule in originals.iter_mut() {
            add_subdivision_buckets(rule);
            for inner in rule.entity.iter_mut() {
                add_subdivision_buckets(inner);
            }
        }
    }

    if leading != Some('5') {
        return originals;
    }

    let mut relations: Vec<&'static str> = Vec::new();
    for code in field.get_subfield('w').unwrap_or_default().chars() {
        if let Some(relation) = relation_for(code) {
            if !relations.contains(&relation) {
                relations.push(relation);
            }
        }
    }

    let mut expanded: Vec<FieldRule> = relations
        .iter()
        .map(|relation| relation_group(relation, &originals))
        .filter(FieldRule::is_group)
        .collect();

    let truncated: Vec<FieldRule> = originals.iter().filter_map(truncated_copy).collect();

    expanded.append(&mut originals);
    expanded.extend(truncated);
    expanded
}

fn add_subdivision_buckets(rule: &mut FieldRule) {
    if rule.is_group() || rule.subfield.is_empty() {
        return;
    }
    let heading: Vec<char> = rule
        .subfield
        .iter()
        .copied()
        .filter(|c| !SUBDIVISION_CODES.contains(c))
        .collect();
    rule.sub_field_delimiter = vec![
        DelimiterSpec {
            value: " ".to_string(),
            subfields: heading,
        },
        DelimiterSpec {
            value: SUBDIVISION_SEPARATOR.to_string(),
            subfields: SUBDIVISION_CODES.to_vec(),
        },
        DelimiterSpec {
            value: SUBDIVISION_SEPARATOR.to_string(),
            subfields: Vec::new(),
        },
    ];
}

/// Plain rules, with group members taking the place of their group.
fn plain_rules(rules: &[FieldRule]) -> impl Iterator<Item = &FieldRule> {
    rules.iter().flat_map(|rule| {
        if rule.is_group() {
            rule.entity.iter()
        } else {
            std::slice::from_ref(rule).iter()
        }
    })
}

fn relation_group(relation: &str, originals: &[FieldRule]) -> FieldRule {
    let mut entity = Vec::new();
    for rule in plain_rules(originals) {
        let Some(ref target) = rule.target else {
            continue;
        };

        let mut heading_ref = rule.clone();
        heading_ref.target = Some(format!("{relation}.headingRef"));
        heading_ref.alternative_mapping = None;
        entity.push(heading_ref);

        let mut heading_type = rule.clone();
        heading_type.target = Some(format!("{relation}.headingType"));
        heading_type.alternative_mapping = None;
        heading_type.apply_rules_on_concatenated_data = true;
        heading_type.rules.push(MappingRule {
            conditions: vec![
                Condition::new("set_heading_type_by_name").with_parameter("name", target.as_str())
            ],
            value: None,
        });
        entity.push(heading_type);
    }

    FieldRule {
        entity,
        ..FieldRule::default()
    }
}

fn truncated_copy(rule: &FieldRule) -> Option<FieldRule> {
    if rule.is_group() {
        let entity: Vec<FieldRule> = rule.entity.iter().filter_map(truncated_copy).collect();
        return (!entity.is_empty()).then(|| FieldRule {
            entity,
            ..rule.clone()
        });
    }
    let target = rule.target.as_ref()?;
    let keep = |c: &char| *c != 'i' && !c.is_ascii_digit();

    let mut copy = rule.clone();
    copy.target = Some(format!("{target}{TRUNCATED_SUFFIX}"));
    copy.subfield.retain(keep);
    copy.sub_field_delimiter = rule
        .sub_field_delimiter
        .iter()
        .filter_map(|spec| {
            if spec.subfields.is_empty() {
                return Some(spec.clone());
            }
            let subfields: Vec<char> = spec.subfields.iter().copied().filter(keep).collect();
            (!subfields.is_empty()).then(|| DelimiterSpec {
                value: spec.value.clone(),
                subfields,
            })
        })
        .collect();
    copy.alternative_mapping = None;
    Some(copy)
}
