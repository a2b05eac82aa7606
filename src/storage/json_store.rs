//! Filesystem-backed JSON persistence, one file per collection.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{EngineError, Result};
use crate::storage::CollectionStore;

const COLLECTION_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Stores each collection as a pretty-printed JSON array in its own file.
///
/// Writes are staged to a temporary file and renamed into place so a crashed
/// save never leaves a half-written collection behind.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir
            .join(format!("{collection}.{COLLECTION_EXTENSION}"))
    }
}

impl CollectionStore for JsonStore {
    fn load<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|err| {
            EngineError::Serde(format!("collection `{collection}` is corrupt: {err}"))
        })
    }

    fn save<T: Serialize>(&self, collection: &str, records: &[T]) -> Result<()> {
        let path = self.collection_path(collection);
        let json = serde_json::to_string_pretty(records)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
