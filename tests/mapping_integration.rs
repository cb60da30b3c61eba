//! Integration tests for rule-driven record mapping

mod common;

use common::{create_authority_leader, create_realistic_record, create_test_leader, field};
use marc_rules::mapping::parameters::{
    ELECTRONIC_ACCESS_RELATIONSHIPS, IDENTIFIER_TYPES, INSTANCE_NOTE_TYPES, ISSUANCE_MODES,
};
use marc_rules::mapping::{
    shapes, FunctionContext, FunctionLibrary, MapperConfig, MappingParameters, RecordMapper,
    ReferenceEntry, RuleDocument, ScriptValue, ValueTransform,
};
use marc_rules::{MarcError, Record};
use serde_json::json;

const INSTANCE_RULES: &str = r#"{
    "001": [{"target": "hrid", "subfield": []}],
    "008": [{"target": "languages", "subfield": [],
             "rules": [{"conditions": [
                 {"type": "char_select", "parameter": {"from": 35, "to": 38}}
             ]}]}],
    "LDR": [{"target": "modeOfIssuanceId", "subfield": [],
             "rules": [{"conditions": [{"type": "set_issuance_mode_id"}]}]}],
    "020": [{"entity": [
        {"target": "identifiers.identifierTypeId", "subfield": ["a"],
         "rules": [{"conditions": [
             {"type": "set_identifier_type_id_by_name", "parameter": {"name": "ISBN"}}
         ]}]},
        {"target": "identifiers.value", "subfield": ["a", "q"]}
    ]}],
    "100": [{"entity": [
        {"target": "contributors.name", "subfield": ["a", "d"],
         "rules": [{"conditions": [{"type": "remove_ending_punc, trim_period"}]}]},
        {"target": "contributors.primary", "subfield": ["a"],
         "rules": [{"conditions": [], "value": "true"}]}
    ]}],
    "245": [{"target": "title", "subfield": ["a", "c"]}],
    "500": [{"entity": [
        {"target": "notes.note", "subfield": ["a"]},
        {"target": "notes.instanceNoteTypeId", "subfield": ["a"],
         "rules": [{"conditions": [{"type": "set_instance_note_type_id"}]}]}
    ]}],
    "650": [{"target": "subjects.value", "subfield": ["a", "x", "z"],
             "subFieldDelimiter": [{"value": "--", "subfields": ["a", "x", "z"]}]}],
    "856": [{"entity": [
        {"target": "electronicAccess.uri", "subfield": ["u"]},
        {"target": "electronicAccess.publicNote", "subfield": ["z"]},
        {"target": "electronicAccess.relationshipId", "subfield": ["u"],
         "rules": [{"conditions": [{"type": "set_electronic_access_relations_id"}]}]}
    ]}]
}"#;

fn tables() -> MappingParameters {
    MappingParameters::new()
        .with_table(IDENTIFIER_TYPES, vec![ReferenceEntry::new("type-isbn", "ISBN", None)])
        .with_table(ISSUANCE_MODES, vec![ReferenceEntry::new("mode-single", "single unit", None)])
        .with_table(
            INSTANCE_NOTE_TYPES,
            vec![ReferenceEntry::new("note-general", "General note", None)],
        )
        .with_table(
            ELECTRONIC_ACCESS_RELATIONSHIPS,
            vec![ReferenceEntry::new("rel-resource", "Resource", None)],
        )
}

fn map_instance(record: &Record) -> serde_json::Value {
    let rules = RuleDocument::from_json(INSTANCE_RULES).unwrap();
    RecordMapper::default()
        .map(record, &rules, &tables(), &shapes::INSTANCE)
        .unwrap()
        .to_json()
        .unwrap()
}

#[test]
fn test_map_realistic_instance() {
    let out = map_instance(&create_realistic_record());

    assert_eq!(out["hrid"], "in00000012");
    assert_eq!(out["languages"], json!(["eng"]));
    assert_eq!(out["modeOfIssuanceId"], "mode-single");
    assert_eq!(out["title"], "Dune / Frank Herbert.");
    assert_eq!(
        out["identifiers"],
        json!([
            {"identifierTypeId": "type-isbn", "value": "9780441013593 (pbk.)"},
            {"identifierTypeId": "type-isbn", "value": "0441013597"}
        ])
    );
    assert_eq!(
        out["contributors"],
        json!([{"name": "Herbert, Frank 1920-1986", "primary": true}])
    );
    assert_eq!(
        out["notes"],
        json!([{"note": "First edition.", "instanceNoteTypeId": "note-general"}])
    );
    assert_eq!(
        out["subjects"],
        json!([{"value": "Science fiction--History"}, {"value": "Deserts--Arrakis"}])
    );
    assert_eq!(
        out["electronicAccess"],
        json!([{
            "uri": "http://example.org/dune",
            "publicNote": "Online access",
            "relationshipId": "rel-resource"
        }])
    );
}

#[test]
fn test_mapping_is_idempotent() {
    let record = create_realistic_record();
    assert_eq!(map_instance(&record), map_instance(&record));
}

#[test]
fn test_leader_only_record_maps_leader_rules() {
    let rules = RuleDocument::from_json(
        r#"{
            "LDR": [{"target": "instanceTypeId", "subfield": [],
                     "rules": [{"conditions": [
                         {"type": "char_select", "parameter": {"from": 6}}
                     ]}]}],
            "100": [{"target": "contributors.name", "subfield": ["a"]}]
        }"#,
    )
    .unwrap();
    let record = Record::new(create_test_leader());

    let entity = RecordMapper::default()
        .map(&record, &rules, &MappingParameters::new(), &shapes::INSTANCE)
        .unwrap();
    assert_eq!(entity.to_json().unwrap(), json!({"instanceTypeId": "a"}));
}

#[test]
fn test_unmapped_tags_contribute_nothing() {
    let rules =
        RuleDocument::from_json(r#"{"245": [{"target": "title", "subfield": ["a"]}]}"#).unwrap();
    let mut record = Record::new(create_test_leader());
    record.add_field(field("500", ' ', ' ', &[('a', "Unmapped")]));
    record.add_field(field("245", '0', '0', &[('a', "Mapped")]));

    let out = RecordMapper::default()
        .map(&record, &rules, &MappingParameters::new(), &shapes::INSTANCE)
        .unwrap()
        .to_json()
        .unwrap();
    assert_eq!(out, json!({"title": "Mapped"}));
}

#[test]
fn test_authority_record_expansion() {
    let rules = RuleDocument::from_json(
        r#"{
            "150": [{"target": "topicalTerm", "subfield": ["a", "x"]}],
            "550": [{"target": "saftTopicalTerm", "subfield": ["a", "i"]}]
        }"#,
    )
    .unwrap();
    let mut record = Record::new(create_authority_leader());
    record.add_field(field("150", ' ', ' ', &[('a', "Arts"), ('x', "History")]));
    record.add_field(field(
        "550",
        ' ',
        ' ',
        &[('w', "g"), ('i', "Broader term:"), ('a', "Humanities")],
    ));

    let out = RecordMapper::default()
        .map(&record, &rules, &MappingParameters::new(), &shapes::AUTHORITY)
        .unwrap()
        .to_json()
        .unwrap();

    assert_eq!(out["topicalTerm"], "Arts--History");
    assert_eq!(out["saftTopicalTerm"], json!(["Broader term: Humanities"]));
    assert_eq!(out["saftTopicalTermTrunc"], json!(["Humanities"]));
    assert_eq!(
        out["broaderTerm"],
        json!([{"headingRef": "Broader term: Humanities", "headingType": "topicalTerm"}])
    );
}

#[test]
fn test_custom_script_with_parameters() {
    let rules = RuleDocument::from_json(
        r#"{"245": [{"target": "indexTitle", "subfield": ["a"], "rules": [{"conditions": [
            {"type": "custom", "parameter": {"prefix": "IDX:"}, "value": "params.prefix + value"}
        ]}]}]}"#,
    )
    .unwrap();
    let mut record = Record::new(create_test_leader());
    record.add_field(field("245", '0', '0', &[('a', "Dune")]));

    let entity = RecordMapper::default()
        .map(&record, &rules, &MappingParameters::new(), &shapes::INSTANCE)
        .unwrap();
    assert_eq!(entity.get_text("indexTitle"), Some("IDX:Dune"));
}

#[derive(Debug)]
struct Reverse;

impl ValueTransform for Reverse {
    fn evaluate(
        &self,
        _source: &str,
        value: &str,
        _params: &marc_rules::mapping::Parameters,
    ) -> marc_rules::Result<ScriptValue> {
        Ok(ScriptValue::Text(value.chars().rev().collect()))
    }
}

#[test]
fn test_pluggable_transform_and_function() {
    fn shout(value: &str, _: &FunctionContext<'_>) -> marc_rules::Result<String> {
        Ok(format!("{value}!"))
    }

    let mut functions = FunctionLibrary::new();
    functions.register("shout", shout);
    let mapper = RecordMapper::new(MapperConfig::default())
        .with_transform(Reverse)
        .with_functions(functions);

    let rules = RuleDocument::from_json(
        r#"{"245": [
            {"target": "title", "subfield": ["a"],
             "rules": [{"conditions": [{"type": "custom", "value": "ignored"}]}]},
            {"target": "indexTitle", "subfield": ["a"],
             "rules": [{"conditions": [{"type": "shout"}]}]}
        ]}"#,
    )
    .unwrap();
    let mut record = Record::new(create_test_leader());
    record.add_field(field("245", '0', '0', &[('a', "abc")]));

    let entity = mapper
        .map(&record, &rules, &MappingParameters::new(), &shapes::INSTANCE)
        .unwrap();
    assert_eq!(entity.get_text("title"), Some("cba"));
    assert_eq!(entity.get_text("indexTitle"), Some("abc!"));
}

#[test]
fn test_malformed_rule_skipped_rest_still_maps() {
    common::init_logging();
    let rules = RuleDocument::from_json(
        r#"{
            "245": [{"target": "title", "subfield": ["a"]}],
            "500": [{"subfield": ["a"]}]
        }"#,
    )
    .unwrap();

    let out = RecordMapper::default()
        .map(&create_realistic_record(), &rules, &MappingParameters::new(), &shapes::INSTANCE)
        .unwrap()
        .to_json()
        .unwrap();
    assert_eq!(out, json!({"title": "Dune /"}));
}

#[test]
fn test_unparseable_rule_document_is_rejected() {
    let err = RuleDocument::from_json(r#"{"245": {"target": "title"}}"#).unwrap_err();
    assert!(matches!(err, MarcError::Json(_)));
    assert!(!err.is_configuration());
}
