//! Joining subfield values through delimiter buckets.
//!
//! A rule's `subFieldDelimiter` list partitions subfield codes into buckets.
//! Each bucket joins its own values with its own separator; the non-empty
//! buckets are then joined, in declared order, with the default separator.
//! An entry with no codes sets the default separator. Codes listed nowhere
//! land in a trailing bucket that uses the default separator.
//!
//! ```
//! use marc_rules::mapping::delimiters::DelimiterBuckets;
//! use marc_rules::mapping::DelimiterSpec;
//!
//! let specs = vec![
//!     DelimiterSpec { value: " ".into(), subfields: vec!['a', 'b'] },
//!     DelimiterSpec { value: "--".into(), subfields: vec!['x', 'z'] },
//!     DelimiterSpec { value: "--".into(), subfields: vec![] },
//! ];
//! let mut buckets = DelimiterBuckets::new(&specs, " ");
//! buckets.push('a', "Art,".into());
//! buckets.push('b', "modern".into());
//! buckets.push('x', "History".into());
//! buckets.push('z', "France".into());
//! assert_eq!(buckets.join(), "Art, modern--History--France");
//! ```

use super::rules::DelimiterSpec;

#[derive(Debug)]
struct Bucket<'a> {
    separator: &'a str,
    codes: &'a [char],
    values: Vec<String>,
}

/// Accumulates subfield values into their buckets.
#[derive(Debug)]
pub struct DelimiterBuckets<'a> {
    buckets: Vec<Bucket<'a>>,
    trailing: Vec<String>,
    default_separator: &'a str,
}

impl<'a> DelimiterBuckets<'a> {
    /// Buckets for a rule's delimiter entries. `fallback` is used when no
    /// entry sets the default separator.
    #[must_use]
    pub fn new(specs: &'a [DelimiterSpec], fallback: &'a str) -> Self {
        let default_separator = specs
            .iter()
            .find(|spec| spec.subfields.is_empty())
            .map_or(fallback, |spec| spec.value.as_str());
        let buckets = specs
            .iter()
            .filter(|spec| !spec.subfields.is_empty())
            .map(|spec| Bucket {
                separator: &spec.value,
                codes: &spec.subfields,
                values: Vec::new(),
            })
            .collect();
        DelimiterBuckets {
            buckets,
            trailing: Vec::new(),
            default_separator,
        }
    }

    /// Add a value under its subfield code. Empty values are dropped.
    pub fn push(&mut self, code: char, value: String) {
        if value.is_empty() {
            return;
        }
        match self.buckets.iter_mut().find(|b| b.codes.contains(&code)) {
            Some(bucket) => bucket.values.push(value),
            None => self.trailing.push(value),
        }
    }

    /// Whether no value has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trailing.is_empty() && self.buckets.iter().all(|b| b.values.is_empty())
    }

    /// The final string.
    #[must_use]
    pub fn join(self) -> String {
        let default_separator = self.default_separator;
        let mut parts: Vec<String> = self
            .buckets
            .into_iter()
            .filter(|b| !b.values.is_empty())
            .map(|b| b.values.join(b.separator))
            .collect();
        if !self.trailing.is_empty() {
            parts.push(self.trailing.join(default_separator));
        }
        parts.join(default_separator)
    }
}
