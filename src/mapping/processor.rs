//! The rule mapping engine.
//!
//! [`RecordMapper::map`] walks a record in order (leader, control fields,
//! data fields), picks the rules the document declares for each tag and
//! assigns the values they produce into a fresh [`Entity`].
//!
//! Per-record problems never escape: a rule whose target does not resolve,
//! whose value does not convert, or whose function fails is logged and
//! skipped. Only a leader that cannot be rendered makes the whole record
//! yield `None`.
//!
//! # Examples
//!
//! ```
//! use marc_rules::mapping::{shapes, MappingParameters, RecordMapper, RuleDocument};
//! use marc_rules::{Field, Leader, Record};
//!
//! let rules = RuleDocument::from_json(r#"{
//!     "245": [{ "target": "title", "subfield": ["a", "b"],
//!               "rules": [{ "conditions": [{ "type": "remove_ending_punc" }] }] }]
//! }"#).unwrap();
//!
//! let record = Record::builder(Leader::default())
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Dune /")
//!             .subfield_str('c', "Frank Herbert.")
//!             .build(),
//!     )
//!     .build();
//!
//! let entity = RecordMapper::default()
//!     .map(&record, &rules, &MappingParameters::new(), &shapes::INSTANCE)
//!     .unwrap();
//! assert_eq!(entity.get_text("title"), Some("Dune"));
//! ```

use super::authority;
use super::config::MapperConfig;
use super::delimiters::DelimiterBuckets;
use super::entity::{Entity, EntityShape, InstanceCursor};
use super::functions::{normalize_value, FunctionContext, FunctionLibrary};
use super::parameters::MappingParameters;
use super::path::TargetPath;
use super::rules::{
    Condition, FieldRule, Parameters, RuleDocument, SplitSpec, CUSTOM_FUNCTION, LEADER_KEY,
};
use super::script::{RhaiTransform, ValueTransform};
use crate::error::{MarcError, Result};
use crate::record::{Field, Record, Subfield};
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Split type cutting a value into fixed-length chunks.
pub const SPLIT_EVERY: &str = "split_every";

/// Interprets rule documents against records.
///
/// A mapper holds no per-record state and can be shared across threads; the
/// only thing that grows over its lifetime is the compiled-script cache of
/// its [`ValueTransform`].
pub struct RecordMapper {
    config: MapperConfig,
    functions: FunctionLibrary,
    transform: Box<dyn ValueTransform>,
}

impl std::fmt::Debug for RecordMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordMapper")
            .field("config", &self.config)
            .field("functions", &self.functions)
            .finish_non_exhaustive()
    }
}

impl Default for RecordMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl RecordMapper {
    /// Mapper with the built-in functions and a `rhai` scripting hook.
    #[must_use]
    pub fn new(config: MapperConfig) -> Self {
        let transform = Box::new(RhaiTransform::new(&config));
        RecordMapper {
            config,
            functions: FunctionLibrary::new(),
            transform,
        }
    }

    /// Replace the scripting hook.
    #[must_use]
    pub fn with_transform(mut self, transform: impl ValueTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    /// Replace the function library.
    #[must_use]
    pub fn with_functions(mut self, functions: FunctionLibrary) -> Self {
        self.functions = functions;
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Map one record onto a new entity of `shape`.
    ///
    /// Returns `None` only when the record cannot be mapped at all.
    #[must_use]
    pub fn map(
        &self,
        record: &Record,
        document: &RuleDocument,
        tables: &MappingParameters,
        shape: &'static EntityShape,
    ) -> Option<Entity> {
        let leader = match record.leader.render() {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "leader cannot be rendered, record not mapped");
                return None;
            },
        };

        let mut session = Session {
            mapper: self,
            leader,
            tables,
            shape,
            entity: Entity::new(shape),
            cursor: InstanceCursor::new(),
            seen_rules: HashSet::new(),
        };

        if let Some(rules) = document.field_rules(LEADER_KEY) {
            let text = session.leader.clone();
            session.map_control(LEADER_KEY, &text, rules);
        }

        for control in &record.control_fields {
            if let Some(rules) = document.field_rules(&control.tag) {
                session.map_control(&control.tag, &control.value, rules);
            }
        }

        for field in &record.fields {
            let Some(rules) = document.field_rules(&field.tag) else {
                continue;
            };
            session.map_data_field(field, rules);
        }

        Some(session.entity)
    }
}

/// Rules applying to a field after indicator filtering.
///
/// Rules without an indicator filter always apply. Among rules declaring
/// one, only those matching the field with the highest specificity apply.
/// If some rule declares a filter and none matches, the field is skipped.
fn select_by_indicators<'r>(rules: &'r [FieldRule], field: &Field) -> Vec<(usize, &'r FieldRule)> {
    let declared = rules.iter().any(|rule| rule.indicators.is_some());
    if !declared {
        return rules.iter().enumerate().collect();
    }

    let best = rules
        .iter()
        .filter_map(|rule| rule.indicators.filter(|f| f.matches(field)))
        .map(|f| f.specificity())
        .max();
    let Some(best) = best else {
        return Vec::new();
    };

    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| match rule.indicators {
            None => true,
            Some(filter) => filter.matches(field) && filter.specificity() == best,
        })
        .collect()
}

/// Cut subfields into one slice per repetition of the grouped codes.
fn repetition_chunks(subfields: &[Subfield], grouped: &[char]) -> Vec<Vec<Subfield>> {
    let mut chunks = Vec::new();
    let mut current: Vec<Subfield> = Vec::new();
    let mut seen: Vec<char> = Vec::new();

    for subfield in subfields.iter().filter(|sf| grouped.contains(&sf.code)) {
        if seen.contains(&subfield.code) {
            chunks.push(std::mem::take(&mut current));
            seen.clear();
        }
        seen.push(subfield.code);
        current.push(subfield.clone());
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

enum ConditionOutcome {
    Value(String),
    Compared(bool),
}

struct Session<'m, 'a> {
    mapper: &'m RecordMapper,
    leader: String,
    tables: &'a MappingParameters,
    shape: &'static EntityShape,
    entity: Entity,
    cursor: InstanceCursor,
    seen_rules: HashSet<(String, usize)>,
}

impl Session<'_, '_> {
    fn map_control(&mut self, tag: &str, text: &str, rules: &[FieldRule]) {
        self.cursor.new_instance();
        for rule in rules {
            if rule.is_group() {
                let ambient = std::mem::take(&mut self.cursor);
                for inner in &rule.entity {
                    self.map_control_rule(tag, text, inner);
                }
                self.cursor = ambient;
            } else {
                self.map_control_rule(tag, text, rule);
            }
        }
    }

    fn map_control_rule(&mut self, tag: &str, text: &str, rule: &FieldRule) -> bool {
        let value = self.run_rules(rule, text, None, tag);
        let value = normalize_value(&value, rule.keep_trailing_backslash);
        if value.is_empty() {
            return match rule.alternative_mapping {
                Some(ref alternative) => self.map_control_rule(tag, text, alternative),
                None => false,
            };
        }
        self.assign(tag, rule, &value)
    }

    fn map_data_field(&mut self, field: &Field, rules: &[FieldRule]) {
        let mut selected = select_by_indicators(rules, field);
        if selected.is_empty() {
            debug!(tag = %field.tag, "no rule matches the field indicators");
            return;
        }

        selected.retain(|(index, rule)| {
            !rule.ignore_subsequent_fields || self.seen_rules.insert((field.tag.clone(), *index))
        });

        self.cursor.new_instance();
        let rules: Vec<&FieldRule> = selected.into_iter().map(|(_, rule)| rule).collect();

        if self.shape.is_authority() {
            let expanded = authority::expand_rules(field, &rules);
            for rule in &expanded {
                self.map_field_rule(field, rule);
            }
        } else {
            for rule in rules {
                self.map_field_rule(field, rule);
            }
        }
    }

    fn map_field_rule(&mut self, field: &Field, rule: &FieldRule) {
        if rule.is_group() {
            self.map_group(field, rule);
        } else {
            self.map_rule(field, &field.subfields, rule);
        }
    }

    fn map_group(&mut self, field: &Field, group: &FieldRule) {
        if !group.accepts_codes(|code| field.has_subfield(code)) {
            debug!(tag = %field.tag, "entity group skipped by required/exclusive subfields");
            return;
        }

        let grouped: Vec<char> = group
            .entity
            .iter()
            .flat_map(|rule| rule.subfield.iter().copied())
            .collect();
        let subfields = self.split_subfields(&field.tag, group, &grouped, &field.subfields);

        let ambient = std::mem::take(&mut self.cursor);
        if group.entity_per_repeated_subfield {
            for chunk in repetition_chunks(&subfields, &grouped) {
                self.cursor.new_instance();
                for rule in &group.entity {
                    self.map_rule(field, &chunk, rule);
                }
            }
        } else {
            for rule in &group.entity {
                self.map_rule(field, &subfields, rule);
            }
        }
        self.cursor = ambient;
    }

    fn map_rule(&mut self, field: &Field, subfields: &[Subfield], rule: &FieldRule) -> bool {
        if !rule.accepts_codes(|code| subfields.iter().any(|sf| sf.code == code)) {
            return false;
        }

        let subfields = self.split_subfields(&field.tag, rule, &rule.subfield, subfields);
        let value = self.build_value(field, &subfields, rule);
        if value.is_empty() {
            return match rule.alternative_mapping {
                Some(ref alternative) => self.map_rule(field, &subfields, alternative),
                None => false,
            };
        }
        self.assign(&field.tag, rule, &value)
    }

    fn build_value(&self, field: &Field, subfields: &[Subfield], rule: &FieldRule) -> String {
        if rule.subfield.is_empty() {
            let value = self.run_rules(rule, "", Some(field), &field.tag);
            return normalize_value(&value, rule.keep_trailing_backslash);
        }

        let mut buckets =
            DelimiterBuckets::new(&rule.sub_field_delimiter, &self.mapper.config.default_delimiter);
        let mut seen_codes: Vec<char> = Vec::new();

        for subfield in subfields.iter().filter(|sf| rule.subfield.contains(&sf.code)) {
            if rule.ignore_subsequent_subfields {
                if seen_codes.contains(&subfield.code) {
                    continue;
                }
                seen_codes.push(subfield.code);
            }
            let value = if rule.apply_rules_on_concatenated_data {
                subfield.value.clone()
            } else {
                self.run_rules(rule, &subfield.value, Some(field), &field.tag)
            };
            buckets.push(subfield.code, value);
        }

        if buckets.is_empty() {
            return String::new();
        }
        let joined = buckets.join();
        let value = if rule.apply_rules_on_concatenated_data {
            self.run_rules(rule, &joined, Some(field), &field.tag)
        } else {
            joined
        };
        normalize_value(&value, rule.keep_trailing_backslash)
    }

    /// Run a rule's transformation rules over one input value.
    fn run_rules(&self, rule: &FieldRule, input: &str, field: Option<&Field>, tag: &str) -> String {
        let mut value = input.to_string();

        for mapping_rule in &rule.rules {
            let before = value.clone();
            let mut met = true;

            for condition in &mapping_rule.conditions {
                match self.apply_condition(condition, &value, field) {
                    Ok(ConditionOutcome::Value(next)) => value = next,
                    Ok(ConditionOutcome::Compared(true)) => {},
                    Ok(ConditionOutcome::Compared(false)) => {
                        met = false;
                        break;
                    },
                    Err(e) => {
                        warn!(
                            tag,
                            function = %condition.kind,
                            error = %e,
                            "condition failed, value reverted"
                        );
                        met = false;
                        break;
                    },
                }
            }

            if !met {
                value = before;
                continue;
            }
            if let Some(ref literal) = mapping_rule.value {
                if !mapping_rule.uses_script() {
                    return literal.clone();
                }
            }
        }
        value
    }

    fn apply_condition(
        &self,
        condition: &Condition,
        value: &str,
        field: Option<&Field>,
    ) -> Result<ConditionOutcome> {
        let mut current = if condition.ldr {
            self.leader.clone()
        } else {
            value.to_string()
        };

        for name in condition.functions() {
            current = if name == CUSTOM_FUNCTION {
                let source = condition.value.as_deref().ok_or_else(|| MarcError::Function {
                    name: CUSTOM_FUNCTION.to_string(),
                    reason: "no script in condition value".to_string(),
                })?;
                self.mapper
                    .transform
                    .evaluate(source, &current, &condition.parameter)?
                    .into_text()
            } else {
                let context = FunctionContext {
                    field,
                    leader: &self.leader,
                    parameters: &condition.parameter,
                    tables: self.tables,
                };
                self.mapper.functions.call(name, &current, &context)?
            };
        }

        match condition.value {
            Some(ref literal) if !condition.is_custom() => {
                Ok(ConditionOutcome::Compared(current == *literal))
            },
            _ => Ok(ConditionOutcome::Value(current)),
        }
    }

    /// Expand subfields with `codes` through the rule's split setting.
    fn split_subfields<'s>(
        &self,
        tag: &str,
        rule: &FieldRule,
        codes: &[char],
        subfields: &'s [Subfield],
    ) -> Cow<'s, [Subfield]> {
        let Some(ref spec) = rule.sub_field_split else {
            return Cow::Borrowed(subfields);
        };

        let mut expanded = Vec::with_capacity(subfields.len());
        for subfield in subfields {
            if !codes.contains(&subfield.code) {
                expanded.push(subfield.clone());
                continue;
            }
            match self.split_value(spec, &subfield.value) {
                Ok(parts) => expanded.extend(
                    parts
                        .into_iter()
                        .filter(|part| !part.is_empty())
                        .map(|part| Subfield::new(subfield.code, part)),
                ),
                Err(e) => {
                    warn!(tag, error = %e, "subfield split failed, value kept whole");
                    expanded.push(subfield.clone());
                },
            }
        }
        Cow::Owned(expanded)
    }

    fn split_value(&self, spec: &SplitSpec, value: &str) -> Result<Vec<String>> {
        match spec.kind.as_str() {
            SPLIT_EVERY => {
                let size: usize = spec.value.trim().parse().map_err(|_| MarcError::Function {
                    name: SPLIT_EVERY.to_string(),
                    reason: format!("'{}' is not a chunk length", spec.value),
                })?;
                if size == 0 {
                    return Err(MarcError::Function {
                        name: SPLIT_EVERY.to_string(),
                        reason: "chunk length must be positive".to_string(),
                    });
                }
                let chars: Vec<char> = value.chars().collect();
                Ok(chars.chunks(size).map(|chunk| chunk.iter().collect()).collect())
            },
            CUSTOM_FUNCTION => Ok(self
                .mapper
                .transform
                .evaluate(&spec.value, value, &Parameters::new())?
                .into_list()),
            other => Err(MarcError::Function {
                name: other.to_string(),
                reason: "unknown split type".to_string(),
            }),
        }
    }

    fn assign(&mut self, tag: &str, rule: &FieldRule, value: &str) -> bool {
        let Some(ref target) = rule.target else {
            warn!(tag, "rule without target skipped");
            return false;
        };
        let result = TargetPath::resolve(self.shape, target)
            .and_then(|path| self.entity.assign(&path, value, &mut self.cursor));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(tag, target = %target, error = %e, "rule skipped");
                false
            },
        }
    }
}
