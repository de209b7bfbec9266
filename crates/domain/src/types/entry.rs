//! Directory entries and attributes

use serde::{Deserialize, Serialize};

/// A named, multi-valued attribute.
///
/// Names may carry options (`member;range=0-1499`); comparisons against
/// configured attribute names go through [`Attribute::base_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new<N, I, V>(name: N, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self { name: name.into(), values: values.into_iter().map(Into::into).collect() }
    }

    /// Attribute name without any `;option` suffix.
    #[must_use]
    pub fn base_name(&self) -> &str {
        base_name(&self.name)
    }

    /// Case-insensitive match of the base name against any of `names`.
    #[must_use]
    pub fn matches_any<S: AsRef<str>>(&self, names: &[S]) -> bool {
        name_matches_any(&self.name, names)
    }
}

/// Strip attribute options (`cn;lang-fr` -> `cn`).
#[must_use]
pub fn base_name(name: &str) -> &str {
    name.split_once(';').map_or(name, |(base, _)| base)
}

/// Case-insensitive comparison of an attribute name's base against a list.
#[must_use]
pub fn name_matches_any<S: AsRef<str>>(name: &str, names: &[S]) -> bool {
    let base = base_name(name);
    names.iter().any(|candidate| candidate.as_ref().eq_ignore_ascii_case(base))
}

/// A full snapshot of one directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entry {
    pub dn: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl Entry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self { dn: dn.into(), attributes: Vec::new() }
    }

    /// Builder-style attribute addition.
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    /// Add an attribute, merging values into an existing attribute of the
    /// same name.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        match self.attributes.iter_mut().find(|a| a.name.eq_ignore_ascii_case(&attribute.name)) {
            Some(existing) => {
                for value in attribute.values {
                    if !existing.values.contains(&value) {
                        existing.values.push(value);
                    }
                }
            }
            None => self.attributes.push(attribute),
        }
    }

    /// Look up an attribute by base name, ignoring case.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.base_name().eq_ignore_ascii_case(base_name(name)))
    }

    /// Values of an attribute, empty when the attribute is absent.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.attribute(name).map_or(&[][..], |a| a.values.as_slice())
    }
}
