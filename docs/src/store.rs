use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use wsdl_docs_wsdl::{
    error::StoreError,
    reconcile::{OperationRecord, OperationStore},
};

type Contents = BTreeMap<String, Vec<OperationRecord>>;

/// Operation records of every source in one pretty-printed JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_owned(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<Contents, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Contents::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Contents::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, contents: &Contents) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(contents)?;
        fs::write(&self.path, text)?;
        Ok(())
    }

    fn modify<F>(&self, source: &str, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<OperationRecord>),
    {
        let _guard = self.lock.lock();
        let mut contents = self.read()?;
        change(contents.entry(source.to_owned()).or_default());
        self.write(&contents)
    }
}

impl OperationStore for JsonFileStore {
    fn list_existing(&self, source: &str) -> Result<Vec<OperationRecord>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read()?.remove(source).unwrap_or_default())
    }

    fn upsert(&self, source: &str, record: &OperationRecord) -> Result<(), StoreError> {
        self.modify(source, |records| {
            match records.iter_mut().find(|existing| existing.name == record.name) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
        })
    }

    fn delete(&self, source: &str, name: &str) -> Result<(), StoreError> {
        self.modify(source, |records| records.retain(|record| record.name != name))
    }
}
