use crate::results::ListingRecord;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the result store, relative to the working directory
pub const DEFAULT_STORE_PATH: &str = "results.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid store content in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Listing records keyed by identifier, backed by a single JSON file.
///
/// The whole mapping is kept in memory and written back wholesale on `save`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    path: PathBuf,
    records: BTreeMap<String, ListingRecord>,
}

impl ResultStore {
    /// Create an empty store for `path` without touching the filesystem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Load the store at `path`; a missing file gives an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                ::log::debug!("No store at {}, starting empty", path.display());
                return Ok(Self::new(path));
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let records = match serde_json::from_str(&contents) {
            Ok(records) => records,
            Err(source) => return Err(StoreError::Json { path, source }),
        };
        Ok(Self { path, records })
    }

    /// Write the full mapping to the backing file, replacing prior content.
    ///
    /// Keys are sorted at every level and indented by four spaces. Non-ASCII
    /// text is written as-is.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        // Going through `Value` sorts the nested objects as well.
        let value = serde_json::to_value(&self.records).map_err(|source| self.json_error(source))?;

        let file = File::create(&self.path).map_err(|source| self.io_error(source))?;
        let mut writer = BufWriter::new(file);
        write_pretty(&mut writer, &value).map_err(|source| self.json_error(source))?;
        writer.flush().map_err(|source| self.io_error(source))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ListingRecord> {
        self.records.get(id)
    }

    /// Insert or replace the record stored under `id`
    pub fn insert(&mut self, id: impl Into<String>, record: ListingRecord) -> Option<ListingRecord> {
        self.records.insert(id.into(), record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ListingRecord)> {
        self.records.iter()
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json {
            path: self.path.clone(),
            source,
        }
    }
}

/// Pretty-print `value` with the store's four-space indentation
pub fn write_pretty<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
) -> Result<(), serde_json::Error> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)
}
