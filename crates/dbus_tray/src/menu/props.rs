//! Wire-visible properties of menu entries.

use std::collections::HashMap;

use zbus::zvariant::Value;

use super::MenuEntry;

/// A property value. Only turned into a D-Bus variant when it leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Str(String),
    Bool(bool),
    Int(i32),
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Str(s.to_owned())
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<i32> for PropValue {
    fn from(i: i32) -> Self {
        PropValue::Int(i)
    }
}

impl From<PropValue> for Value<'static> {
    fn from(v: PropValue) -> Self {
        match v {
            PropValue::Str(s) => Value::from(s),
            PropValue::Bool(b) => Value::from(b),
            PropValue::Int(i) => Value::from(i),
        }
    }
}

/// Ordered set of properties, in the order the projection rules produce them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(Vec<(&'static str, PropValue)>);

impl Properties {
    fn push(&mut self, name: &'static str, value: impl Into<PropValue>) {
        self.0.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(n, _)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PropValue)> {
        self.0.iter().map(|(n, v)| (*n, v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Keep only the properties named in `filter`. An empty filter keeps everything.
    pub fn retain_named<S: AsRef<str>>(mut self, filter: &[S]) -> Self {
        if !filter.is_empty() {
            self.0.retain(|(n, _)| filter.iter().any(|f| f.as_ref() == *n));
        }
        self
    }

    pub fn into_wire(self) -> HashMap<String, Value<'static>> {
        self.0.into_iter().map(|(n, v)| (n.to_owned(), Value::from(v))).collect()
    }
}

/// Compute the properties of `entry`, restricted to `filter` unless it is empty.
///
/// The root entry is projected like any other entry.
pub fn properties<S: AsRef<str>>(entry: &MenuEntry, filter: &[S]) -> Properties {
    let mut props = Properties::default();
    if entry.is_separator {
        props.push("type", "separator");
        return props.retain_named(filter);
    }

    props.push("label", entry.label.as_str());
    props.push("enabled", entry.enabled);
    props.push("visible", entry.visible);

    if entry.checkable {
        props.push("toggle-type", "checkmark");
        props.push("toggle-state", if entry.checked { 1 } else { 0 });
    }

    if !entry.children.is_empty() {
        props.push("children-display", "submenu");
    }

    props.retain_named(filter)
}
