use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{PatientRecord, RecordStore, StoreError};

/// File-backed record store: one JSON document per patient under
/// `<base>/records/<key>.json`.
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(base_path.join("records"))
            .map_err(|e| StoreError::Io(format!("Failed to create store directory: {}", e)))?;
        Ok(FileStore { base_path })
    }

    fn record_path(&self, key: i64) -> PathBuf {
        self.base_path.join("records").join(format!("{}.json", key))
    }
}

impl RecordStore for FileStore {
    fn find(&self, key: i64) -> Result<Option<PatientRecord>, StoreError> {
        let path = self.record_path(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(format!("Failed to read record file: {}", e))),
        };
        let record = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::Corrupt(format!("Failed to deserialize record {}: {}", key, e)))?;
        Ok(Some(record))
    }

    fn persist(&self, record: &PatientRecord) -> Result<(), StoreError> {
        let path = self.record_path(record.medical_record_number);
        let serialized = serde_json::to_vec(record)
            .map_err(|e| StoreError::Corrupt(format!("Serialization failed: {}", e)))?;

        // Write to a temporary file first, then rename (atomic on most
        // filesystems) so readers never observe a partial record.
        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)
            .map_err(|e| StoreError::Io(format!("Failed to create file: {}", e)))?;
        file.write_all(&serialized)
            .map_err(|e| StoreError::Io(format!("Failed to write data: {}", e)))?;
        file.sync_all()
            .map_err(|e| StoreError::Io(format!("Failed to sync data: {}", e)))?;
        fs::rename(&temp_path, &path)
            .map_err(|e| StoreError::Io(format!("Failed to rename file: {}", e)))?;

        Ok(())
    }

    fn enumerate(&self) -> Result<Vec<PatientRecord>, StoreError> {
        let records_dir = self.base_path.join("records");
        let mut records = Vec::new();

        for entry in fs::read_dir(&records_dir)
            .map_err(|e| StoreError::Io(format!("Failed to read records directory: {}", e)))?
        {
            let entry =
                entry.map_err(|e| StoreError::Io(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();

            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Ok(key) = stem.parse::<i64>() {
                        if let Some(record) = self.find(key)? {
                            records.push(record);
                        }
                    }
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn persist_find_enumerate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let mut record = store.create(118);
        record.name = Some("TS".to_string());
        record.push_ecg("b64".to_string(), 90, "2021-10-28 02:39:00".to_string());
        store.persist(&record).unwrap();
        store.persist(&store.create(2)).unwrap();

        assert_eq!(store.find(118).unwrap().unwrap(), record);
        assert!(store.find(999).unwrap().is_none());

        let mut keys: Vec<i64> = store
            .enumerate()
            .unwrap()
            .into_iter()
            .map(|r| r.medical_record_number)
            .collect();
        keys.sort();
        assert_eq!(keys, vec![2, 118]);
    }

    #[test]
    fn persist_overwrites_previous_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let mut record = store.create(1);
        store.persist(&record).unwrap();
        record.name = Some("Tony Stark".to_string());
        store.persist(&record).unwrap();

        let found = store.find(1).unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Tony Stark"));
        assert_eq!(store.enumerate().unwrap().len(), 1);
    }
}
