//! Built-in value transforms addressable by name from rule conditions.
//!
//! Every function receives the working value and a [`FunctionContext`] and
//! returns the new value. Functions are pure: they read the field, the
//! leader and the reference tables but never change them.
//!
//! Reference lookups (`set_*_id`) return an empty string when the table has
//! no matching entry, so the owning rule produces nothing.
//!
//! `custom` is not in this table; the engine routes it to its
//! [`ValueTransform`](super::script::ValueTransform).

use super::parameters::{
    MappingParameters, CLASSIFICATION_TYPES, CONTRIBUTOR_NAME_TYPES, CONTRIBUTOR_TYPES,
    ELECTRONIC_ACCESS_RELATIONSHIPS, HOLDINGS_TYPES, IDENTIFIER_TYPES, INSTANCE_NOTE_TYPES,
    INSTANCE_TYPES, ISSUANCE_MODES,
};
use super::rules::Parameters;
use crate::error::{MarcError, Result};
use crate::record::Field;
use lazy_static::lazy_static;
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Everything a function may read besides the working value.
#[derive(Debug, Clone, Copy)]
pub struct FunctionContext<'a> {
    /// The data field being mapped, if any
    pub field: Option<&'a Field>,
    /// The rendered 24-character leader
    pub leader: &'a str,
    /// Parameters of the calling condition
    pub parameters: &'a Parameters,
    /// Reference tables
    pub tables: &'a MappingParameters,
}

impl<'a> FunctionContext<'a> {
    fn indicator1(&self) -> Option<char> {
        self.field.map(|f| f.indicator1)
    }

    fn indicator2(&self) -> Option<char> {
        self.field.map(|f| f.indicator2)
    }

    fn leader_char(&self, position: usize) -> Option<char> {
        self.leader.chars().nth(position)
    }

    fn text_parameter(&self, function: &str, key: &str) -> Result<&'a str> {
        self.parameters
            .get(key)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| MarcError::Function {
                name: function.to_string(),
                reason: format!("missing string parameter '{key}'"),
            })
    }

    fn index_parameter(&self, key: &str) -> Option<usize> {
        match self.parameters.get(key)? {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Signature shared by every built-in.
pub type BuiltinFn = fn(&str, &FunctionContext<'_>) -> Result<String>;

lazy_static! {
    static ref BUILTINS: HashMap<&'static str, BuiltinFn> = {
        let mut m: HashMap<&'static str, BuiltinFn> = HashMap::new();
        m.insert("trim", trim);
        m.insert("trim_period", trim_period);
        m.insert("remove_ending_punc", remove_ending_punc);
        m.insert("capitalize", capitalize);
        m.insert("to_upper_case", to_upper_case);
        m.insert("to_lower_case", to_lower_case);
        m.insert("remove_substring", remove_substring);
        m.insert("char_select", char_select);
        m.insert("normalize_unicode", normalize_unicode);
        m.insert("remove_prefix_by_indicator", remove_prefix_by_indicator);
        m.insert("set_note_staff_only_via_indicator", set_note_staff_only_via_indicator);
        m.insert("set_instance_type_id", set_instance_type_id);
        m.insert("set_identifier_type_id_by_name", set_identifier_type_id_by_name);
        m.insert("set_contributor_type_id", set_contributor_type_id);
        m.insert("set_contributor_type_text", set_contributor_type_text);
        m.insert("set_contributor_name_type_id", set_contributor_name_type_id);
        m.insert("set_classification_type_id", set_classification_type_id);
        m.insert("set_instance_note_type_id", set_instance_note_type_id);
        m.insert("set_issuance_mode_id", set_issuance_mode_id);
        m.insert("set_holdings_type_id", set_holdings_type_id);
        m.insert("set_electronic_access_relations_id", set_electronic_access_relations_id);
        m.insert("set_heading_type_by_name", set_heading_type_by_name);
        m
    };
}

/// Named function table.
#[derive(Clone)]
pub struct FunctionLibrary {
    functions: HashMap<&'static str, BuiltinFn>,
}

impl std::fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("FunctionLibrary").field("functions", &names).finish()
    }
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        FunctionLibrary {
            functions: BUILTINS.clone(),
        }
    }
}

impl FunctionLibrary {
    /// Library holding every built-in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a function.
    pub fn register(&mut self, name: &'static str, function: BuiltinFn) {
        self.functions.insert(name, function);
    }

    /// Whether a function is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Apply a function by name.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Function`] for unknown names or when the function
    /// rejects its parameters.
    pub fn call(&self, name: &str, value: &str, context: &FunctionContext<'_>) -> Result<String> {
        let function = self.functions.get(name).ok_or_else(|| MarcError::Function {
            name: name.to_string(),
            reason: "unknown function".to_string(),
        })?;
        function(value, context)
    }
}

/// Unescape and tidy a produced value.
///
/// `\\` becomes `\` and `\"` becomes `"`; one trailing backslash is dropped
/// unless `keep_trailing_backslash`; surrounding whitespace is trimmed.
#[must_use]
pub fn normalize_value(value: &str, keep_trailing_backslash: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '"' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    let trimmed = out.trim_end();
    let trimmed = if keep_trailing_backslash {
        trimmed
    } else {
        trimmed.strip_suffix('\\').unwrap_or(trimmed)
    };
    trimmed.trim().to_string()
}

const ENDING_PUNCTUATION: &[char] = &[';', ':', ',', '/', '+', '=', ' '];

fn trim(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    Ok(value.trim().to_string())
}

fn trim_period(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    let trimmed = value.trim_end();
    Ok(trimmed.strip_suffix('.').unwrap_or(trimmed).to_string())
}

fn remove_ending_punc(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    Ok(value.trim_end_matches(ENDING_PUNCTUATION).to_string())
}

fn capitalize(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    let mut chars = value.chars();
    Ok(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    })
}

fn to_upper_case(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    Ok(value.to_uppercase())
}

fn to_lower_case(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    Ok(value.to_lowercase())
}

fn remove_substring(value: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let substring = ctx.text_parameter("remove_substring", "substring")?;
    if substring.is_empty() {
        return Ok(value.to_string());
    }
    Ok(value.replace(substring, ""))
}

/// Characters `from..to` (end exclusive); `to` defaults to `from + 1`.
fn char_select(value: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let from = ctx.index_parameter("from").ok_or_else(|| MarcError::Function {
        name: "char_select".to_string(),
        reason: "missing numeric parameter 'from'".to_string(),
    })?;
    let to = ctx
        .index_parameter("to")
        .unwrap_or_else(|| from.saturating_add(1));
    Ok(value
        .chars()
        .skip(from)
        .take(to.saturating_sub(from))
        .collect())
}

fn normalize_unicode(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    Ok(value.nfc().collect())
}

/// Drop the non-filing characters counted by indicator 2.
fn remove_prefix_by_indicator(value: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let skip = ctx
        .indicator2()
        .and_then(|c| c.to_digit(10))
        .map_or(0, |n| n as usize);
    Ok(value.chars().skip(skip).collect())
}

fn set_note_staff_only_via_indicator(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    Ok((ctx.indicator1() == Some('0')).to_string())
}

fn id_or_empty(entry: Option<&super::parameters::ReferenceEntry>) -> String {
    entry.map(|e| e.id.clone()).unwrap_or_default()
}

fn set_instance_type_id(value: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    Ok(id_or_empty(ctx.tables.by_code(INSTANCE_TYPES, value.trim())))
}

fn set_identifier_type_id_by_name(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = ctx.text_parameter("set_identifier_type_id_by_name", "name")?;
    Ok(id_or_empty(ctx.tables.by_name(IDENTIFIER_TYPES, name)))
}

/// Relator code first, then relator term.
fn set_contributor_type_id(value: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let key = value.trim().trim_end_matches(ENDING_PUNCTUATION).trim_end_matches('.');
    let entry = ctx
        .tables
        .by_code(CONTRIBUTOR_TYPES, key)
        .or_else(|| ctx.tables.by_name(CONTRIBUTOR_TYPES, key));
    Ok(id_or_empty(entry))
}

fn set_contributor_type_text(value: &str, _: &FunctionContext<'_>) -> Result<String> {
    Ok(value.trim().trim_end_matches(ENDING_PUNCTUATION).to_string())
}

fn set_contributor_name_type_id(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = ctx.text_parameter("set_contributor_name_type_id", "name")?;
    Ok(id_or_empty(ctx.tables.by_name(CONTRIBUTOR_NAME_TYPES, name)))
}

fn set_classification_type_id(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = ctx.text_parameter("set_classification_type_id", "name")?;
    Ok(id_or_empty(ctx.tables.by_name(CLASSIFICATION_TYPES, name)))
}

fn set_instance_note_type_id(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = ctx
        .parameters
        .get("name")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("General note");
    Ok(id_or_empty(ctx.tables.by_name(INSTANCE_NOTE_TYPES, name)))
}

/// Mode of issuance from leader/07.
fn set_issuance_mode_id(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = match ctx.leader_char(7) {
        Some('a' | 'c' | 'd' | 'm') => "single unit",
        Some('b' | 's') => "serial",
        Some('i') => "integrating resource",
        _ => "unspecified",
    };
    Ok(id_or_empty(ctx.tables.by_name(ISSUANCE_MODES, name)))
}

/// Holdings type from leader/06.
fn set_holdings_type_id(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = match ctx.leader_char(6) {
        Some('v') => "Multi-part monograph",
        Some('x') => "Monograph",
        Some('y') => "Serial",
        _ => "Unknown",
    };
    Ok(id_or_empty(ctx.tables.by_name(HOLDINGS_TYPES, name)))
}

/// Relationship of an 856 link from its indicator 2.
fn set_electronic_access_relations_id(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = match ctx.indicator2() {
        Some('0') => "Resource",
        Some('1') => "Version of resource",
        Some('2') => "Related resource",
        Some('8') => "No display",
        _ => "No information provided",
    };
    Ok(id_or_empty(ctx.tables.by_name(ELECTRONIC_ACCESS_RELATIONSHIPS, name)))
}

/// Heading type named after a target field: `saftTopicalTerm` becomes `topicalTerm`.
fn set_heading_type_by_name(_: &str, ctx: &FunctionContext<'_>) -> Result<String> {
    let name = ctx.text_parameter("set_heading_type_by_name", "name")?;
    let base = name.rsplit('.').next().unwrap_or(name);
    let base = base.strip_suffix("Trunc").unwrap_or(base);
    let base = base
        .strip_prefix("saft")
        .or_else(|| base.strip_prefix("sft"))
        .unwrap_or(base);

    let mut chars = base.chars();
    Ok(match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    })
}
