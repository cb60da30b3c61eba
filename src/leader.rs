//! MARC record leader parsing and manipulation.
//!
//! The MARC leader is a 24-character fixed-length field at the start of every MARC record.
//! It contains metadata describing the record's structure, content type, and encoding.
//!
//! # Structure
//!
//! - Positions 0-4: Record length (5 digits)
//! - Position 5: Record status
//! - Position 6: Record type (a = language material, z = authority, u/v/x/y = holdings)
//! - Position 7: Bibliographic level (m = monograph, s = serial, etc.)
//! - Position 8: Control record type
//! - Position 9: Character coding (space = MARC-8, a = UTF-8)
//! - Position 10: Indicator count (usually 2)
//! - Position 11: Subfield code count (usually 2)
//! - Positions 12-16: Base address of data (5 digits)
//! - Positions 17-19: Encoding level, cataloging form, multipart level
//! - Positions 20-23: Entry map (usually "4500")
//!
//! Positions 0-4 and 12-16 are structural: they are computed by the record codec
//! and must never be edited by hand. See [`Leader::overlaps_reserved`].

use crate::error::{MarcError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Length of a MARC leader in characters.
pub const LEADER_LEN: usize = 24;

/// Leader positions holding the record length.
pub const RECORD_LENGTH_ZONE: RangeInclusive<usize> = 0..=4;

/// Leader positions holding the base address of data.
pub const BASE_ADDRESS_ZONE: RangeInclusive<usize> = 12..=16;

/// MARC Leader - 24 characters at the start of every MARC record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    /// Record length (5 digits) - positions 0-4
    pub record_length: u32,
    /// Record status (1 char) - position 5
    pub record_status: char,
    /// Type of record (1 char) - position 6
    pub record_type: char,
    /// Bibliographic level (1 char) - position 7
    pub bibliographic_level: char,
    /// Type of control record (1 char) - position 8
    pub control_record_type: char,
    /// Character coding scheme (1 char) - position 9
    pub character_coding: char,
    /// Indicator count (1 digit) - position 10 (usually 2)
    pub indicator_count: u8,
    /// Subfield code count (1 digit) - position 11 (usually 2)
    pub subfield_code_count: u8,
    /// Base address of data (5 digits) - positions 12-16
    pub data_base_address: u32,
    /// Encoding level (1 char) - position 17
    pub encoding_level: char,
    /// Cataloging form (1 char) - position 18
    pub cataloging_form: char,
    /// Multipart resource record level (1 char) - position 19
    pub multipart_level: char,
    /// Entry map (4 chars) - positions 20-23
    pub reserved: String,
}

impl Default for Leader {
    fn default() -> Self {
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
}

impl Leader {
    /// Parse a leader from its 24-character text form.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not exactly 24 ASCII characters or the
    /// numeric positions do not hold digits.
    pub fn parse(text: &str) -> Result<Self> {
        if !text.is_ascii() {
            return Err(MarcError::InvalidLeader(format!(
                "Leader must be ASCII, got '{text}'"
            )));
        }
        let bytes = text.as_bytes();
        if bytes.len() != LEADER_LEN {
            return Err(MarcError::InvalidLeader(format!(
                "Leader must be {LEADER_LEN} characters, got {}",
                bytes.len()
            )));
        }

        let record_length = parse_digits(&bytes[0..5])?;
        let indicator_count = parse_count(bytes[10], 10)?;
        let subfield_code_count = parse_count(bytes[11], 11)?;
        let data_base_address = parse_digits(&bytes[12..17])?;

        Ok(Leader {
            record_length,
            record_status: bytes[5] as char,
            record_type: bytes[6] as char,
            bibliographic_level: bytes[7] as char,
            control_record_type: bytes[8] as char,
            character_coding: bytes[9] as char,
            indicator_count,
            subfield_code_count,
            data_base_address,
            encoding_level: bytes[17] as char,
            cataloging_form: bytes[18] as char,
            multipart_level: bytes[19] as char,
            reserved: text[20..24].to_string(),
        })
    }

    /// Render the leader to its 24-character text form.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric value does not fit its positions or the
    /// entry map is not 4 characters.
    pub fn render(&self) -> Result<String> {
        if self.record_length > 99_999 || self.data_base_address > 99_999 {
            return Err(MarcError::InvalidLeader(
                "Record length and base address must fit in 5 digits".to_string(),
            ));
        }
        if self.indicator_count > 9 || self.subfield_code_count > 9 {
            return Err(MarcError::InvalidLeader(
                "Indicator and subfield code counts must be single digits".to_string(),
            ));
        }
        if self.reserved.chars().count() != 4 {
            return Err(MarcError::InvalidLeader(format!(
                "Reserved field must be 4 characters, got {}",
                self.reserved.chars().count()
            )));
        }

        let mut text = String::with_capacity(LEADER_LEN);
        text.push_str(&format!("{:05}", self.record_length));
        text.push(self.record_status);
        text.push(self.record_type);
        text.push(self.bibliographic_level);
        text.push(self.control_record_type);
        text.push(self.character_coding);
        text.push(char::from(b'0' + self.indicator_count));
        text.push(char::from(b'0' + self.subfield_code_count));
        text.push_str(&format!("{:05}", self.data_base_address));
        text.push(self.encoding_level);
        text.push(self.cataloging_form);
        text.push(self.multipart_level);
        text.push_str(&self.reserved);

        if text.len() != LEADER_LEN {
            return Err(MarcError::InvalidLeader(format!(
                "Rendered leader has {} characters",
                text.len()
            )));
        }
        Ok(text)
    }

    /// Check whether an inclusive position range touches a structural zone
    /// (record length or base address of data).
    #[must_use]
    pub fn overlaps_reserved(start: usize, end: usize) -> bool {
        let overlaps = |zone: &RangeInclusive<usize>| start <= *zone.end() && end >= *zone.start();
        overlaps(&RECORD_LENGTH_ZONE) || overlaps(&BASE_ADDRESS_ZONE)
    }
}

/// Parse 5-digit ASCII number from bytes
fn parse_digits(bytes: &[u8]) -> Result<u32> {
    let s = String::from_utf8_lossy(bytes);
    s.parse::<u32>()
        .map_err(|_| MarcError::InvalidLeader(format!("Invalid numeric field: '{s}'")))
}

fn parse_count(byte: u8, position: usize) -> Result<u8> {
    (byte as char)
        .to_digit(10)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| {
            MarcError::InvalidLeader(format!(
                "Invalid count at position {position}: {}",
                byte as char
            ))
        })
}
