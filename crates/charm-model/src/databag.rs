use std::collections::BTreeMap;

/// Flat string-keyed storage backing one side of a relation.
///
/// The orchestrator owns the real storage; charms only see it through this
/// trait so the transport can be swapped for an in-memory map in tests.
pub trait Databag: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);

    fn remove(&mut self, key: &str) -> Option<String>;

    fn keys(&self) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    fn clear(&mut self) {
        for key in self.keys() {
            self.remove(&key);
        }
    }

    /// Copy every entry out of the bag
    fn to_map(&self) -> BTreeMap<String, String> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(&key).map(|value| (key, value)))
            .collect()
    }

    fn extend(&mut self, entries: BTreeMap<String, String>) {
        for (key, value) in entries {
            self.set(&key, value);
        }
    }
}

/// Databag kept in process memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDatabag {
    entries: BTreeMap<String, String>,
}

impl MemoryDatabag {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<BTreeMap<String, String>> for MemoryDatabag {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MemoryDatabag {
    fn from(entries: [(&str, &str); N]) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Databag for MemoryDatabag {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    // Juju drops keys that are set to an empty string.
    fn set(&mut self, key: &str, value: String) {
        if value.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_string(), value);
        }
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_removes_key() {
        let mut bag = MemoryDatabag::from([("port", "8080")]);
        bag.set("port", String::new());
        assert!(bag.is_empty());
    }

    #[test]
    fn test_clear_and_extend() {
        let mut bag = MemoryDatabag::from([("a", "1"), ("b", "2")]);
        bag.clear();
        assert!(bag.keys().is_empty());

        let mut entries = BTreeMap::new();
        entries.insert("c".to_string(), "3".to_string());
        bag.extend(entries);
        assert_eq!(bag.get("c").as_deref(), Some("3"));
        assert!(bag.contains("c"));
        assert!(!bag.contains("a"));
    }
}
