use super::PersistResult;
use std::collections::HashMap;

/// Durable string key-value storage used for store snapshots.
pub trait KeyValueBackend {
    /// Returns the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> PersistResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> PersistResult<()>;
}

/// Process-local backend. Counts writes so callers can observe them.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls served since construction.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Raw stored value, for inspection.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}
