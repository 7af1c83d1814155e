use std::path::PathBuf;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Named text values, read and written synchronously.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }
}

/// Mapping-backed store for exercising the ledger without touching disk.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per collection inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&staging, value)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        std::fs::rename(&staging, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// Typed access to the JSON collections held in a [`KeyValueStore`].
///
/// Reads never fail: an absent or malformed collection is treated as empty.
/// Writes report failure through the return value and a log line, never as
/// an error, so callers carry on with the in-memory state for this turn.
pub struct Collections<S> {
    store: S,
}

impl<S: KeyValueStore> Collections<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.store.get(key), Ok(Some(_)))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let body = match self.store.get(key) {
            Ok(Some(body)) => body,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read collection; using empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&body) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(key, error = %err, "malformed collection; using empty");
                Vec::new()
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, records: &[T]) -> bool {
        let body = match serde_json::to_string(records) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(key, error = %err, "failed to serialize collection");
                return false;
            }
        };

        match self.store.set(key, &body) {
            Ok(()) => {
                tracing::debug!(key, records = records.len(), "collection written");
                true
            }
            Err(err) => {
                tracing::error!(key, error = %err, "failed to write collection");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::{Deal, DealStatus, Kpi, SalesPerson, DEALS_KEY, SALES_PEOPLE_KEY};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("storage unavailable")
        }

        fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }
    }

    fn sample_person() -> SalesPerson {
        SalesPerson {
            id: "1".to_string(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            target: Kpi { meetings: 20, deals: 10 },
            current: Kpi { meetings: 3, deals: 1 },
        }
    }

    #[test]
    fn absent_collection_reads_as_empty() {
        let collections = Collections::new(MemoryStore::new());
        let people: Vec<SalesPerson> = collections.get(SALES_PEOPLE_KEY);
        assert!(people.is_empty());
        assert!(!collections.contains(SALES_PEOPLE_KEY));
    }

    #[test]
    fn malformed_collection_reads_as_empty() {
        let store = MemoryStore::new().with_value(SALES_PEOPLE_KEY, "{not json");
        let collections = Collections::new(store);
        let people: Vec<SalesPerson> = collections.get(SALES_PEOPLE_KEY);
        assert!(people.is_empty());
    }

    #[test]
    fn written_collection_reads_back_equal() {
        let mut collections = Collections::new(MemoryStore::new());
        let deals = vec![Deal {
            id: "deal-1".to_string(),
            sales_person_id: "1".to_string(),
            client_name: "Initech".to_string(),
            value: 1200,
            closed_date: NaiveDate::from_ymd_opt(2024, 6, 11).unwrap(),
            status: DealStatus::Lost,
        }];
        assert!(collections.set(DEALS_KEY, &deals));
        let read: Vec<Deal> = collections.get(DEALS_KEY);
        assert_eq!(read, deals);
    }

    #[test]
    fn store_failures_are_absorbed() {
        let mut collections = Collections::new(BrokenStore);
        let people: Vec<SalesPerson> = collections.get(SALES_PEOPLE_KEY);
        assert!(people.is_empty());
        assert!(!collections.set(SALES_PEOPLE_KEY, &[sample_person()]));
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut collections = Collections::new(FileStore::new(dir.path().join("data")));
        let people = vec![sample_person()];
        assert!(collections.set(SALES_PEOPLE_KEY, &people));

        let reopened = Collections::new(FileStore::new(dir.path().join("data")));
        let read: Vec<SalesPerson> = reopened.get(SALES_PEOPLE_KEY);
        assert_eq!(read, people);
        assert!(dir.path().join("data").join("salesPeople.json").exists());
    }
}
