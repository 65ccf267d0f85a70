use std::collections::HashMap;
use std::sync::RwLock;

use super::{PatientRecord, RecordStore, StoreError};

/// In-memory record store, used by tests and as a fallback backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<i64, PatientRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes a record directly. Test cleanup only; the reconciliation
    /// protocol never deletes.
    pub fn remove(&self, key: i64) -> Option<PatientRecord> {
        self.records.write().unwrap().remove(&key)
    }
}

impl RecordStore for MemoryStore {
    fn find(&self, key: i64) -> Result<Option<PatientRecord>, StoreError> {
        Ok(self.records.read().unwrap().get(&key).cloned())
    }

    fn persist(&self, record: &PatientRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap()
            .insert(record.medical_record_number, record.clone());
        Ok(())
    }

    fn enumerate(&self) -> Result<Vec<PatientRecord>, StoreError> {
        Ok(self.records.read().unwrap().values().cloned().collect())
    }
}
