use serde::{Deserialize, Serialize};

use crate::KeyValue;

/// Environment handed to a supervised process through its start command.
///
/// Serialized as a plain array of `{key, value}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(pub Vec<KeyValue>);

impl Env {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Get the value for a key; the last matching entry wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Render as a space separated list of shell assignments, suitable as a
    /// prefix for `/usr/bin/env`.
    pub fn to_shell_prefix(&self) -> String {
        self.0
            .iter()
            .map(KeyValue::to_assignment)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::Env;

    #[test]
    fn later_entries_override_earlier_ones() {
        let mut env = Env::new();
        env.push("PORT", "8080");
        env.push("HOST", "0.0.0.0");
        env.push("PORT", "9090");

        assert_eq!(env.get("PORT"), Some("9090"));
        assert_eq!(env.get("HOST"), Some("0.0.0.0"));
        assert!(env.get("MISSING").is_none());
    }

    #[test]
    fn shell_prefix_joins_assignments() {
        let mut env = Env::new();
        env.push("A", "1");
        env.push("B", "two words");

        assert_eq!(env.to_shell_prefix(), "A='1' B='two words'");
        assert_eq!(Env::new().to_shell_prefix(), "");
    }

    #[test]
    fn deserializes_from_array() {
        let env: Env = serde_json::from_str(r#"[{"key":"A","value":"1"}]"#).unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("A"), Some("1"));
    }
}
