//! Integration tests for record editing, merging and link preservation

mod common;

use common::{create_authority_leader, create_realistic_record, create_test_leader, field, tags};
use marc_rules::modify::{
    Action, BibRecordModifier, EditDirective, FieldSpec, Link, LinkingRule, ModifierConfig,
    Position, ProtectionSet, ProtectionSetting, RecordModifier, Subaction, SubfieldDirective,
};
use marc_rules::{IndicatorPattern, Record};

fn modifier(protection: ProtectionSet) -> RecordModifier {
    RecordModifier::new(protection, ModifierConfig::default())
}

fn edit(record: Record, protection: ProtectionSet, directives: &[EditDirective]) -> Record {
    let mut modifier = modifier(protection);
    modifier.initialize(record);
    modifier.apply(directives).unwrap();
    modifier.finish().unwrap()
}

#[test]
fn test_thematic_insertion_order() {
    let mut record = Record::new(create_test_leader());
    for tag in ["490", "507", "650"] {
        record.add_field(field(tag, ' ', ' ', &[('a', "x")]));
    }
    let add = EditDirective::new(
        0,
        Action::Add,
        FieldSpec::new("500").subfield(SubfieldDirective::new("a").text("Note")),
    );
    let record = edit(record, ProtectionSet::none(), &[add]);
    assert_eq!(tags(&record), vec!["490", "507", "500", "650"]);
}

#[test]
fn test_electronic_protection_on_any_tag() {
    let setting: ProtectionSetting = serde_json::from_str(
        r#"{"id": "e1", "field": "*", "indicator1": "*", "indicator2": "*",
            "subfield": "a", "data": "electronic", "source": "USER"}"#,
    )
    .unwrap();
    let protection = ProtectionSet::new(vec![setting], &[]);

    let mut record = Record::new(create_test_leader());
    record.add_field(field("338", ' ', ' ', &[('a', "electronic"), ('b', "cr")]));
    record.add_field(field("538", ' ', ' ', &[('a', "electronic")]));
    record.add_field(field("538", ' ', ' ', &[('a', "print")]));

    let directives = [
        EditDirective::new(
            0,
            Action::Delete,
            FieldSpec::new("338").subfield(SubfieldDirective::new("a")),
        ),
        EditDirective::new(
            1,
            Action::Delete,
            FieldSpec::new("538").subfield(SubfieldDirective::new("a")),
        ),
    ];
    let record = edit(record, protection, &directives);

    assert_eq!(record.get_field("338").unwrap().get_subfield('a'), Some("electronic"));
    let remaining: Vec<&str> = record
        .fields_by_tag("538")
        .filter_map(|f| f.get_subfield('a'))
        .collect();
    assert_eq!(remaining, vec!["electronic"]);
}

#[test]
fn test_delete_respects_indicator_limited_protection() {
    let mut record = Record::new(create_test_leader());
    record.add_field(field("020", ' ', '0', &[('a', "keep")]));
    record.add_field(field("020", ' ', '1', &[('a', "drop")]));

    let protection = ProtectionSet::new(
        vec![ProtectionSetting::new("p", "020")
            .indicators(IndicatorPattern::Any, IndicatorPattern::Exact('0'))],
        &[],
    );
    let delete = EditDirective::new(
        0,
        Action::Delete,
        FieldSpec::new("020").subfield(SubfieldDirective::new("*")),
    );
    let record = edit(record, protection, &[delete]);

    assert_eq!(record.fields.len(), 1);
    assert_eq!(record.fields[0].indicator2, '0');
    assert_eq!(record.fields[0].get_subfield('a'), Some("keep"));
}

#[test]
fn test_override_lifts_protection() {
    let system = vec![ProtectionSetting::new("p", "500")];
    let mut cancel = ProtectionSetting::new("p", "500");
    cancel.is_override = true;
    let protection = ProtectionSet::new(system, &[cancel]);

    let delete = EditDirective::new(0, Action::Delete, FieldSpec::new("500"));
    let record = edit(create_realistic_record(), protection, &[delete]);
    assert!(record.get_field("500").is_none());
}

#[test]
fn test_directive_document_round() {
    let directives = EditDirective::list_from_json(
        r#"[
            {"order": 2, "action": "EDIT", "field": {
                "field": "856", "indicator1": "4", "indicator2": "0",
                "subfields": [{"subfield": "z", "subaction": "INSERT", "position": "AFTER_STRING",
                               "data": {"text": " (campus only)"}}]}},
            {"order": 1, "action": "EDIT", "field": {"field": "LDR",
                "subfields": [{"subfield": "05", "subaction": "REPLACE",
                               "data": {"find": "n", "replaceWith": "c"}}]}},
            {"order": 3, "action": "MOVE", "field": {"field": "500",
                "subfields": [{"subfield": "a", "subaction": "CREATE_NEW_FIELD",
                               "data": {"relocationField": {
                                   "field": "590", "subfields": [{"subfield": "a"}]}}}]}}
        ]"#,
    )
    .unwrap();
    let record = edit(create_realistic_record(), ProtectionSet::none(), &directives);

    assert_eq!(record.leader.record_status, 'c');
    assert_eq!(
        record.get_field("856").unwrap().get_subfield('z'),
        Some("Online access (campus only)")
    );
    assert!(record.get_field("500").is_none());
    assert_eq!(record.get_field("590").unwrap().get_subfield('a'), Some("First edition."));
}

#[test]
fn test_reserved_leader_positions_are_refused() {
    common::init_logging();
    let before = create_realistic_record();
    let directive = EditDirective::new(
        0,
        Action::Edit,
        FieldSpec::new("LDR").subfield(
            SubfieldDirective::new("12-16")
                .subaction(Subaction::Replace)
                .find_replace("*", "99999"),
        ),
    );
    let after = edit(before.clone(), ProtectionSet::none(), &[directive]);
    assert_eq!(after.leader, before.leader);
}

#[test]
fn test_insert_new_subfield_on_every_match() {
    let directive = EditDirective::new(
        0,
        Action::Edit,
        FieldSpec::new("650")
            .indicators(IndicatorPattern::Any, IndicatorPattern::Exact('0'))
            .subfield(
                SubfieldDirective::new("2")
                    .subaction(Subaction::Insert)
                    .position(Position::NewSubfield)
                    .text("lcsh"),
            ),
    );
    let record = edit(create_realistic_record(), ProtectionSet::none(), &[directive]);
    assert!(record.fields_by_tag("650").all(|f| f.get_subfield('2') == Some("lcsh")));
}

#[test]
fn test_merge_replaces_and_prunes() {
    let mut incoming = Record::new(create_test_leader());
    incoming.add_control_field_str("001", "remote");
    incoming.add_field(field("245", '1', '0', &[('a', "Dune :"), ('b', "deluxe edition")]));
    incoming.add_field(field("650", ' ', '0', &[('a', "Deserts"), ('z', "Arrakis")]));
    incoming.add_field(field("650", ' ', '0', &[('a', "Ecology")]));

    let protection = ProtectionSet::new(vec![ProtectionSetting::new("p", "856")], &[]);
    let mut modifier = modifier(protection);
    modifier.initialize(create_realistic_record());
    modifier.merge(&incoming, &[]).unwrap();
    let record = modifier.finish().unwrap();

    assert_eq!(record.get_control_field("001"), Some("in00000012"));
    assert_eq!(record.get_field("245").unwrap().get_subfield('b'), Some("deluxe edition"));
    let subjects: Vec<&str> = record
        .fields_by_tag("650")
        .filter_map(|f| f.get_subfield('a'))
        .collect();
    assert_eq!(subjects, vec!["Deserts", "Ecology"]);
    assert!(record.get_field("020").is_none());
    assert!(record.get_field("100").is_none());
    assert!(record.get_field("856").is_some());
}

#[test]
fn test_merge_with_subfield_detail() {
    let mut incoming = Record::new(create_test_leader());
    incoming.add_field(field("245", '1', '0', &[('a', "Dune (revised) /"), ('c', "F. Herbert.")]));

    let mut modifier = modifier(ProtectionSet::none());
    modifier.initialize(create_realistic_record());
    modifier
        .merge(&incoming, &[FieldSpec::new("245").subfield(SubfieldDirective::new("c"))])
        .unwrap();
    let record = modifier.finish().unwrap();

    let title = record.get_field("245").unwrap();
    assert_eq!(title.get_subfield('a'), Some("Dune /"));
    assert_eq!(title.get_subfield('c'), Some("F. Herbert."));
    assert_eq!(record.fields.len(), create_realistic_record().fields.len());
}

fn herbert_link() -> Link {
    Link {
        bib_record_tag: "100".to_string(),
        bib_record_subfields: vec!['a', 'd'],
        authority_id: "auth-herbert".to_string(),
        authority_natural_id: "n79093009".to_string(),
    }
}

fn linking_rules() -> Vec<LinkingRule> {
    serde_json::from_str(
        r#"[{"bibField": "100", "authoritySubfields": ["a", "b", "c", "d", "q"]}]"#,
    )
    .unwrap()
}

fn incoming_with_author(id: &str) -> Record {
    let mut incoming = create_realistic_record();
    incoming.fields.retain(|f| f.tag != "100");
    incoming.add_field(field(
        "100",
        '1',
        ' ',
        &[('a', "Herbert, F."), ('e', "author."), ('0', id)],
    ));
    incoming
}

#[test]
fn test_link_kept_when_id_unchanged() {
    let mut modifier = BibRecordModifier::new(modifier(ProtectionSet::none()));
    modifier
        .initialize(create_realistic_record(), linking_rules(), vec![herbert_link()])
        .unwrap();
    modifier
        .merge(&incoming_with_author("http://id.loc.gov/authorities/names/n79093009"), &[])
        .unwrap();

    assert_eq!(modifier.kept_links(), &[herbert_link()]);
    let record = modifier.finish().unwrap();
    let author = record.get_field("100").unwrap();
    assert_eq!(author.get_subfield('9'), Some("auth-herbert"));
    assert_eq!(author.get_subfield('a'), Some("Herbert, Frank,"));
    assert_eq!(author.get_subfield('e'), Some("author."));
}

#[test]
fn test_link_broken_when_id_changes() {
    common::init_logging();
    let mut modifier = BibRecordModifier::new(modifier(ProtectionSet::none()));
    modifier
        .initialize(create_realistic_record(), linking_rules(), vec![herbert_link()])
        .unwrap();
    modifier
        .merge(&incoming_with_author("http://id.loc.gov/authorities/names/n12345678"), &[])
        .unwrap();

    assert!(modifier.kept_links().is_empty());
    let record = modifier.finish().unwrap();
    let author = record.get_field("100").unwrap();
    assert!(!author.has_subfield('9'));
    assert_eq!(author.get_subfield('a'), Some("Herbert, F."));
}

#[test]
fn test_bib_modifier_rejects_authority_record() {
    let mut modifier = BibRecordModifier::new(modifier(ProtectionSet::none()));
    let err = modifier
        .initialize(Record::new(create_authority_leader()), linking_rules(), Vec::new())
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(modifier.finish().unwrap_err().is_configuration());
}
