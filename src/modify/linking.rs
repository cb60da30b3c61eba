//! Authority link preservation for bibliographic merges.
//!
//! A bibliographic field linked to an authority record carries the
//! authority identifier in `$0` and the link marker in `$9`. When such a
//! field is merged, the link is kept only if `$0` is unchanged and still
//! ends with the stored natural id. A kept link leaves `$9` and the
//! authority-controlled subfields alone; a broken one loses `$9` on both
//! sides.

use super::directives::{EditDirective, FieldSpec};
use super::merge::MergePolicy;
use super::RecordModifier;
use crate::error::{MarcError, Result};
use crate::record::{Field, Record, RecordKind, Subfield};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

/// Subfield holding the authority identifier.
pub const AUTHORITY_ID_CODE: char = '0';
/// Subfield marking a controlled field.
pub const LINK_MARKER_CODE: char = '9';

/// Which subfields of a bibliographic tag an authority controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkingRule {
    /// Bibliographic tag
    pub bib_field: String,
    /// Subfield codes taken from the authority record
    #[serde(default)]
    pub authority_subfields: Vec<char>,
}

/// A stored link between a bibliographic field and an authority record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Bibliographic tag
    pub bib_record_tag: String,
    /// Controlled subfield codes recorded with the link
    #[serde(default)]
    pub bib_record_subfields: Vec<char>,
    /// Authority record identifier
    pub authority_id: String,
    /// Natural identifier the `$0` value ends with
    pub authority_natural_id: String,
}

/// [`MergePolicy`] that keeps valid authority links intact.
#[derive(Debug, Clone, Default)]
pub struct LinkPreservation {
    rules: Vec<LinkingRule>,
    links: Vec<Link>,
    kept: Vec<Link>,
}

impl LinkPreservation {
    /// Create a policy for one merge.
    #[must_use]
    pub fn new(rules: Vec<LinkingRule>, links: Vec<Link>) -> Self {
        LinkPreservation {
            rules,
            links,
            kept: Vec::new(),
        }
    }

    /// Links confirmed so far.
    #[must_use]
    pub fn kept_links(&self) -> &[Link] {
        &self.kept
    }

    fn controlled_codes(&self, link: &Link) -> Vec<char> {
        self.rules
            .iter()
            .find(|rule| rule.bib_field == link.bib_record_tag)
            .map_or_else(
                || link.bib_record_subfields.clone(),
                |rule| rule.authority_subfields.clone(),
            )
    }

    /// `incoming` keeps the existing controlled subfields and `$9`; the rest
    /// comes from `incoming`.
    fn fold(existing: &Field, incoming: &mut Field, controlled: &[char]) {
        let mut merged: SmallVec<[Subfield; 4]> = existing
            .subfields
            .iter()
            .filter(|sf| controlled.contains(&sf.code))
            .cloned()
            .collect();
        merged.extend(
            incoming
                .subfields
                .iter()
                .filter(|sf| !controlled.contains(&sf.code) && sf.code != LINK_MARKER_CODE)
                .cloned(),
        );
        merged.extend(
            existing
                .subfields
                .iter()
                .filter(|sf| sf.code == LINK_MARKER_CODE)
                .cloned(),
        );
        incoming.subfields = merged;
    }
}

impl MergePolicy for LinkPreservation {
    fn reconcile(&mut self, existing: Option<&mut Field>, incoming: &mut Field) {
        let Some(incoming_id) = incoming.get_subfield(AUTHORITY_ID_CODE).map(str::to_string) else {
            return;
        };
        let link = self
            .links
            .iter()
            .find(|l| {
                l.bib_record_tag == incoming.tag && incoming_id.ends_with(&l.authority_natural_id)
            })
            .cloned();

        match (existing, link) {
            (Some(existing), Some(link))
                if existing.get_subfield(AUTHORITY_ID_CODE) == Some(incoming_id.as_str()) =>
            {
                let controlled = self.controlled_codes(&link);
                Self::fold(existing, incoming, &controlled);
                debug!(
                    tag = %link.bib_record_tag,
                    authority = %link.authority_id,
                    "Authority link kept"
                );
                if !self.kept.contains(&link) {
                    self.kept.push(link);
                }
            },
            (existing, _) => {
                incoming.remove_subfields(LINK_MARKER_CODE);
                if let Some(existing) = existing {
                    existing.remove_subfields(LINK_MARKER_CODE);
                }
                debug!(
                    tag = %incoming.tag,
                    id = %incoming_id,
                    "Authority link not confirmed; marker removed"
                );
            },
        }
    }

    fn retains(&self, field: &Field) -> bool {
        field.get_subfield(LINK_MARKER_CODE).is_some_and(|marker| {
            self.kept
                .iter()
                .any(|l| l.bib_record_tag == field.tag && l.authority_id == marker)
        })
    }
}

/// [`RecordModifier`] for bibliographic records that preserves authority
/// links during merges.
#[derive(Debug)]
pub struct BibRecordModifier {
    modifier: RecordModifier,
    preservation: Option<LinkPreservation>,
}

impl BibRecordModifier {
    /// Wrap a modifier.
    #[must_use]
    pub fn new(modifier: RecordModifier) -> Self {
        BibRecordModifier {
            modifier,
            preservation: None,
        }
    }

    /// Start work on a bibliographic record with its linking rules and links.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] if the record is not bibliographic.
    pub fn initialize(
        &mut self,
        record: Record,
        rules: Vec<LinkingRule>,
        links: Vec<Link>,
    ) -> Result<()> {
        if record.kind() != RecordKind::Bibliographic {
            return Err(MarcError::Configuration(format!(
                "link preservation needs a bibliographic record, got {:?}",
                record.kind()
            )));
        }
        self.modifier.initialize(record);
        self.preservation = Some(LinkPreservation::new(rules, links));
        Ok(())
    }

    /// Apply edit directives.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn apply(&mut self, directives: &[EditDirective]) -> Result<()> {
        self.modifier.apply(directives)
    }

    /// Merge an incoming record, keeping valid authority links.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn merge(&mut self, incoming: &Record, details: &[FieldSpec]) -> Result<()> {
        let policy = self.preservation.as_mut().ok_or_else(|| {
            MarcError::Configuration("modifier used before initialize".to_string())
        })?;
        self.modifier.merge_with(incoming, details, policy)
    }

    /// Links confirmed by merges since the last [`initialize`](Self::initialize).
    #[must_use]
    pub fn kept_links(&self) -> &[Link] {
        match &self.preservation {
            Some(preservation) => preservation.kept_links(),
            None => &[],
        }
    }

    /// The record being modified.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn record(&self) -> Result<&Record> {
        self.modifier.record()
    }

    /// Hand back the finished record.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::Configuration`] before [`initialize`](Self::initialize).
    pub fn finish(&mut self) -> Result<Record> {
        self.modifier.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::modify::{ModifierConfig, ProtectionSet};

    fn field(tag: &str, subfields: &[(char, &str)]) -> Field {
        let mut f = Field::new(tag.to_string(), '1', ' ');
        for &(code, value) in subfields {
            f.add_subfield_str(code, value);
        }
        f
    }

    fn link() -> Link {
        Link {
            bib_record_tag: "100".to_string(),
            bib_record_subfields: vec!['a', 'd'],
            authority_id: "auth-1".to_string(),
            authority_natural_id: "n79021164".to_string(),
        }
    }

    fn rules() -> Vec<LinkingRule> {
        vec![LinkingRule {
            bib_field: "100".to_string(),
            authority_subfields: vec!['a', 'b', 'c', 'd'],
        }]
    }

    fn existing() -> Record {
        let mut record = Record::new(Leader::default());
        record.add_field(field(
            "100",
            &[
                ('a', "Twain, Mark,"),
                ('d', "1835-1910."),
                ('0', "http://id.loc.gov/authorities/names/n79021164"),
                ('9', "auth-1"),
            ],
        ));
        record
    }

    fn incoming(id: &str) -> Record {
        let mut record = Record::new(Leader::default());
        record.add_field(field(
            "100",
            &[('a', "Clemens, Samuel"), ('e', "author."), ('0', id)],
        ));
        record
    }

    fn modifier() -> BibRecordModifier {
        let inner = RecordModifier::new(ProtectionSet::none(), ModifierConfig::default());
        BibRecordModifier::new(inner)
    }

    #[test]
    fn test_unchanged_id_keeps_link() {
        let mut modifier = modifier();
        modifier.initialize(existing(), rules(), vec![link()]).unwrap();
        modifier
            .merge(&incoming("http://id.loc.gov/authorities/names/n79021164"), &[])
            .unwrap();

        assert_eq!(modifier.kept_links(), &[link()]);
        let record = modifier.finish().unwrap();
        let merged = record.get_field("100").unwrap();
        assert_eq!(merged.get_subfield('9'), Some("auth-1"));
        assert_eq!(merged.get_subfield('a'), Some("Twain, Mark,"));
        assert_eq!(merged.get_subfield('d'), Some("1835-1910."));
        assert_eq!(merged.get_subfield('e'), Some("author."));
    }

    #[test]
    fn test_changed_id_breaks_link() {
        let mut modifier = modifier();
        modifier.initialize(existing(), rules(), vec![link()]).unwrap();
        modifier
            .merge(&incoming("http://id.loc.gov/authorities/names/n00000001"), &[])
            .unwrap();

        assert!(modifier.kept_links().is_empty());
        let record = modifier.finish().unwrap();
        let merged = record.get_field("100").unwrap();
        assert!(!merged.has_subfield('9'));
        assert_eq!(merged.get_subfield('a'), Some("Clemens, Samuel"));
    }

    #[test]
    fn test_incoming_marker_stripped_without_link() {
        let mut policy = LinkPreservation::new(rules(), Vec::new());
        let mut existing = field("100", &[('a', "X"), ('0', "n1"), ('9', "stale")]);
        let mut incoming = field("100", &[('a', "X"), ('0', "n1"), ('9', "stale")]);
        policy.reconcile(Some(&mut existing), &mut incoming);
        assert!(!existing.has_subfield('9'));
        assert!(!incoming.has_subfield('9'));
    }

    #[test]
    fn test_kept_link_vetoes_pruning() {
        let mut policy = LinkPreservation::new(rules(), vec![link()]);
        let mut old = existing().fields[0].clone();
        let mut arriving =
            incoming("http://id.loc.gov/authorities/names/n79021164").fields[0].clone();
        policy.reconcile(Some(&mut old), &mut arriving);
        assert!(policy.retains(&old));
        assert!(!policy.retains(&field("100", &[('a', "X"), ('9', "other")])));
    }

    #[test]
    fn test_authority_record_rejected() {
        let mut leader = Leader::default();
        leader.record_type = 'z';
        let err = modifier()
            .initialize(Record::new(leader), rules(), vec![link()])
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_merge_before_initialize() {
        let err = modifier().merge(&incoming("n1"), &[]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_link_documents_parse() {
        let rule: LinkingRule =
            serde_json::from_str(r#"{"bibField": "600", "authoritySubfields": ["a", "b"]}"#)
                .unwrap();
        assert_eq!(rule.authority_subfields, vec!['a', 'b']);
        let link: Link = serde_json::from_str(
            r#"{"bibRecordTag": "600", "bibRecordSubfields": ["a"],
                "authorityId": "x", "authorityNaturalId": "n1"}"#,
        )
        .unwrap();
        assert_eq!(link.authority_natural_id, "n1");
    }
}
