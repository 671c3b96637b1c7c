use std::collections::BTreeMap;

use crate::core::{MigrateError, Result, Value};

/// One stored record: a bag of named fields.
///
/// A field can be absent, explicitly null, or hold any [`Value`]. Absence
/// and null are different states and several migrations hinge on the
/// difference, so readers must pick the accessor that says what they mean:
/// the `get` family treats bad shape as "not there", the `require` family
/// turns it into a [`MigrateError::DataShape`] failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert, for fixtures and construction sites.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// `None` means the field is absent, which is not the same as null.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// The field must be present; any value shape is accepted.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.fields
            .get(name)
            .ok_or_else(|| MigrateError::DataShape(format!("required field '{}' is missing", name)))
    }

    /// The field must be present and hold text.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| {
            MigrateError::DataShape(format!(
                "field '{}' must be text, found {}",
                name,
                value.type_name()
            ))
        })
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}
