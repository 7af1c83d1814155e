use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};

use crate::db::PgStore;
use crate::schedule::parse_meeting_date;
use crate::store::{FileStore, KeyValueStore};

pub const DEFAULT_DATA_DIR: &str = ".sales-tracker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSettings {
    Files { dir: PathBuf },
    Postgres { url: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageSettings,
    pub today: NaiveDate,
}

impl Settings {
    /// A database URL wins over the data directory; without either the
    /// collections live under [`DEFAULT_DATA_DIR`].
    pub fn resolve(
        database_url: Option<String>,
        data_dir: Option<PathBuf>,
        today: Option<&str>,
    ) -> anyhow::Result<Self> {
        let storage = match database_url.filter(|url| !url.trim().is_empty()) {
            Some(url) => StorageSettings::Postgres { url },
            None => StorageSettings::Files {
                dir: data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            },
        };

        let today = match today {
            Some(raw) => parse_meeting_date(raw)
                .with_context(|| format!("--today must be YYYY-MM-DD, got {raw:?}"))?,
            None => Local::now().date_naive(),
        };

        Ok(Self { storage, today })
    }

    pub fn open_store(&self) -> anyhow::Result<Box<dyn KeyValueStore>> {
        match &self.storage {
            StorageSettings::Files { dir } => {
                tracing::debug!(dir = %dir.display(), "using file store");
                Ok(Box::new(FileStore::new(dir.clone())))
            }
            StorageSettings::Postgres { url } => {
                tracing::debug!("using Postgres store");
                Ok(Box::new(PgStore::connect(url)?))
            }
        }
    }
}
