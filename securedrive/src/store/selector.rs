use serde_json::Value;

/// Filter for [`super::AssetStore::query`]: a key prefix plus equality
/// constraints on top-level JSON fields of the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    prefix: String,
    equals: Vec<(String, Value)>,
}

impl Selector {
    /// Matches every entry.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn key_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches_key(&self, key: &str) -> bool {
        key.starts_with(&self.prefix)
    }

    /// Values that are not JSON objects never match a field constraint.
    pub fn matches(&self, key: &str, value: &[u8]) -> bool {
        if !self.matches_key(key) {
            return false;
        }
        if self.equals.is_empty() {
            return true;
        }

        let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(value) else {
            return false;
        };

        self.equals
            .iter()
            .all(|(name, expected)| fields.get(name) == Some(expected))
    }
}
