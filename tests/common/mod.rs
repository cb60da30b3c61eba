//! Common test helpers and utilities shared across test suite.

#![allow(dead_code)]

use marc_rules::{Field, Leader, Record};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness.
///
/// Honors `RUST_LOG`; defaults to `warn` so refused edits and dropped rules
/// show up next to a failing test. Safe to call from every test.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Creates a default leader for test records.
///
/// Bibliographic, monograph, with structural positions zeroed.
pub fn create_test_leader() -> Leader {
    Leader {
        record_length: 0,
        record_status: 'n',
        record_type: 'a',
        bibliographic_level: 'm',
        control_record_type: ' ',
        character_coding: 'a',
        indicator_count: 2,
        subfield_code_count: 2,
        data_base_address: 0,
        encoding_level: ' ',
        cataloging_form: 'a',
        multipart_level: ' ',
        reserved: "4500".to_string(),
    }
}

/// Creates an authority leader (type `z`).
pub fn create_authority_leader() -> Leader {
    Leader {
        record_type: 'z',
        bibliographic_level: ' ',
        ..create_test_leader()
    }
}

/// Builds a data field from `(code, value)` pairs.
pub fn field(tag: &str, ind1: char, ind2: char, subfields: &[(char, &str)]) -> Field {
    let mut field = Field::new(tag.to_string(), ind1, ind2);
    for &(code, value) in subfields {
        field.add_subfield_str(code, value);
    }
    field
}

/// Creates a realistic bibliographic record.
///
/// Includes identifiers, a main entry, title, imprint, notes, subjects and
/// an electronic location.
pub fn create_realistic_record() -> Record {
    let mut record = Record::new(create_test_leader());
    record.add_control_field_str("001", "in00000012");
    record.add_control_field_str("003", "DLC");
    let fixed = format!("840622s1965    nyu{}eng d", " ".repeat(17));
    record.add_control_field_str("008", &fixed);

    record.add_field(field("020", ' ', ' ', &[('a', "9780441013593"), ('q', "(pbk.)")]));
    record.add_field(field("020", ' ', ' ', &[('a', "0441013597")]));
    record.add_field(field(
        "100",
        '1',
        ' ',
        &[
            ('a', "Herbert, Frank,"),
            ('d', "1920-1986."),
            ('0', "http://id.loc.gov/authorities/names/n79093009"),
            ('9', "auth-herbert"),
        ],
    ));
    record.add_field(field(
        "245",
        '1',
        '0',
        &[('a', "Dune /"), ('c', "Frank Herbert.")],
    ));
    record.add_field(field(
        "264",
        ' ',
        '1',
        &[('a', "New York :"), ('b', "Ace Books,"), ('c', "1965.")],
    ));
    record.add_field(field("500", ' ', ' ', &[('a', "First edition.")]));
    record.add_field(field("650", ' ', '0', &[('a', "Science fiction"), ('x', "History")]));
    record.add_field(field("650", ' ', '0', &[('a', "Deserts"), ('z', "Arrakis")]));
    record.add_field(field(
        "856",
        '4',
        '0',
        &[('u', "http://example.org/dune"), ('z', "Online access")],
    ));
    record
}

/// Tags of the data fields in record order.
pub fn tags(record: &Record) -> Vec<String> {
    record.fields.iter().map(|f| f.tag.clone()).collect()
}
