//! Per-node side table for extension-defined attributes.
//!
//! Attributes are grouped by the name of the extension that declared them,
//! so extensions can tag ordinary nodes without touching [`NodeType`].
//!
//! [`NodeType`]: crate::NodeType

use std::fmt;

/// Value of one extension attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl AttrValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Attributes of one node, keyed by extension name then attribute key.
///
/// Nodes rarely carry more than one extension's table, so a flat vector
/// keeps lookups cheap without a map per node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ExtensionAttributes {
    tables: Vec<(&'static str, Vec<(&'static str, AttrValue)>)>,
}

impl ExtensionAttributes {
    pub(crate) fn get(&self, extension: &str, key: &str) -> Option<&AttrValue> {
        self.table(extension)?
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    pub(crate) fn has_table(&self, extension: &str) -> bool {
        self.table(extension).is_some()
    }

    pub(crate) fn insert(&mut self, extension: &'static str, key: &'static str, value: AttrValue) {
        let table = match self.tables.iter().position(|(name, _)| *name == extension) {
            Some(position) => &mut self.tables[position].1,
            None => {
                self.tables.push((extension, Vec::new()));
                let last = self.tables.len() - 1;
                &mut self.tables[last].1
            }
        };
        match table.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => table.push((key, value)),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str, &AttrValue)> {
        self.tables.iter().flat_map(|(extension, table)| {
            table
                .iter()
                .map(move |(key, value)| (*extension, *key, value))
        })
    }

    fn table(&self, extension: &str) -> Option<&Vec<(&'static str, AttrValue)>> {
        self.tables
            .iter()
            .find(|(name, _)| *name == extension)
            .map(|(_, table)| table)
    }
}
