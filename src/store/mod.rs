//! Patient record storage
//!
//! Defines the record shape shared by every collaborator (server routes,
//! client, tests) and the `RecordStore` capability the reconciliation
//! protocol consumes. Two stores are provided: an in-memory map and a
//! JSON-file-per-record store for the server binary.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{Serialize, Deserialize};
use std::fmt;

/// One patient's persisted record.
///
/// `ecg_images`, `heart_rates` and `timestamps` are paired histories: one
/// entry of each per ECG upload, always the same length. They are only ever
/// extended through [`PatientRecord::push_ecg`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub medical_record_number: i64,
    pub name: Option<String>,
    pub medical_images: Vec<String>,  // b64-encoded blobs, opaque to the server
    pub ecg_images: Vec<String>,
    pub heart_rates: Vec<i64>,
    pub timestamps: Vec<String>,
}

impl PatientRecord {
    pub fn new(medical_record_number: i64) -> Self {
        PatientRecord {
            medical_record_number,
            name: None,
            medical_images: Vec::new(),
            ecg_images: Vec::new(),
            heart_rates: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    /// Appends one ECG observation as an atomic triple, keeping the three
    /// paired histories in lockstep.
    pub fn push_ecg(&mut self, ecg_image: String, heart_rate: i64, timestamp: String) {
        self.ecg_images.push(ecg_image);
        self.heart_rates.push(heart_rate);
        self.timestamps.push(timestamp);
    }

    /// True when the three paired histories have equal length.
    pub fn histories_in_lockstep(&self) -> bool {
        self.ecg_images.len() == self.heart_rates.len()
            && self.heart_rates.len() == self.timestamps.len()
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(String),
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "Store I/O error: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "Corrupt record: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Keyed persistent collection of patient records.
///
/// "Not found" is not an error on `find`: the protocol treats an absent key
/// as its create branch.
pub trait RecordStore: Send + Sync {
    fn find(&self, key: i64) -> Result<Option<PatientRecord>, StoreError>;

    fn persist(&self, record: &PatientRecord) -> Result<(), StoreError>;

    fn enumerate(&self) -> Result<Vec<PatientRecord>, StoreError>;

    /// Returns a fresh, unsaved record handle for `key`. Nothing is written
    /// until `persist` is called.
    fn create(&self, key: i64) -> PatientRecord {
        PatientRecord::new(key)
    }
}
