//! Event - a named, ordered bag of typed attributes
//!
//! Attributes keep their insertion order, and that order round-trips
//! through encode/decode: consumers iterate attributes exactly as the
//! producer wrote them. Duplicate keys are not rejected; lookups return
//! the last occurrence.

use std::fmt;

use crate::value::Value;

/// A single LWES event
///
/// Producers build an event with [`Event::new`] and ordered
/// [`Event::set`] calls, then serialize it with [`Event::encode`].
/// Received events come out of [`Event::decode`] with the attribute
/// order matching the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    name: String,
    attrs: Vec<(String, Value)>,
}

impl Event {
    /// Create an empty event with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Create an empty event with room for `capacity` attributes
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::with_capacity(capacity),
        }
    }

    /// The event name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an attribute, preserving insertion order
    ///
    /// A key may be set more than once; every occurrence is kept and
    /// written to the wire, and [`Event::get`] returns the last one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attrs.push((key.into(), value.into()));
    }

    /// Look up an attribute by key (last occurrence wins)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Number of attributes, duplicates included
    #[inline]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Iterate attributes in insertion (wire) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn push_attr(&mut self, key: String, value: Value) {
        self.attrs.push((key, value));
    }
}

impl fmt::Display for Event {
    /// Debug listing of all attributes in wire order:
    ///
    /// ```text
    /// MonDemand::PerfMsg[13]
    /// {
    ///     id = 0db302ef-4ba1-4d6b-86e3-92793d4b0c9e;
    ///     ...
    /// }
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}[{}]", self.name, self.attrs.len())?;
        writeln!(f, "{{")?;
        for (key, value) in self.iter() {
            writeln!(f, "\t{key} = {value};")?;
        }
        write!(f, "}}")
    }
}
