//! Patient record reconciliation
//!
//! Decides, per inbound payload, whether to create a new record, append new
//! observations to an existing one, or report that there is nothing to
//! update. All record mutation routes through [`Reconciler::apply`] so the
//! paired-history invariant is enforced at a single choke point.

use chrono::Local;
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::store::{RecordStore, StoreError};

/// Inbound payload for patient registration and uploads.
///
/// Empty strings are "absent" sentinels: an empty `name` means "no change",
/// an empty image field means no upload of that kind. `hr` is only
/// meaningful when `ecg_image` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub name: String,
    pub medical_record_number: RecordNumber,
    #[serde(default)]
    pub medical_image: String,
    #[serde(default)]
    pub ecg_image: String,
    #[serde(default)]
    pub hr: i64,
}

/// A medical record number as submitted: either a JSON integer or a string
/// that still has to be coerced to one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordNumber {
    Number(i64),
    Text(String),
}

impl RecordNumber {
    fn is_missing(&self) -> bool {
        matches!(self, RecordNumber::Text(s) if s.is_empty())
    }

    fn coerce(&self) -> Result<i64, ProtocolError> {
        match self {
            RecordNumber::Number(n) => Ok(*n),
            RecordNumber::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                ProtocolError::Validation(format!(
                    "The input {} cannot be converted into integer",
                    s
                ))
            }),
        }
    }
}

impl From<i64> for RecordNumber {
    fn from(n: i64) -> Self {
        RecordNumber::Number(n)
    }
}

impl From<&str> for RecordNumber {
    fn from(s: &str) -> Self {
        RecordNumber::Text(s.to_string())
    }
}

/// What a successful `apply` call did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A record with a previously-unseen key was created.
    Registered,
    /// An existing record gained a name and/or history entries.
    Updated,
    /// The payload added nothing new; the store was not touched.
    NoChange,
}

#[derive(Debug)]
pub enum ProtocolError {
    /// Malformed or missing identifying input. Raised before any store
    /// access.
    Validation(String),
    /// Lookup by key yielded nothing on a read-only retrieval path.
    NotFound(String),
    Store(StoreError),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Validation(msg) => write!(f, "{}", msg),
            ProtocolError::NotFound(msg) => write!(f, "{}", msg),
            ProtocolError::Store(err) => write!(f, "Store error: {}", err),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<StoreError> for ProtocolError {
    fn from(error: StoreError) -> Self {
        ProtocolError::Store(error)
    }
}

/// Applies update requests against a record store.
///
/// Holds a per-key lock across the whole lookup-mutate-persist sequence so
/// concurrent updates to the same record never interleave destructively.
/// Different keys proceed in parallel.
pub struct Reconciler {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Reconciler {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn key_lock(&self, key: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))))
    }

    /// Reconciles one request against the store.
    ///
    /// Validation failures (missing or non-integer record number) return
    /// before any store access. Otherwise the call either creates a complete
    /// new record, appends a complete unit to an existing one, or leaves the
    /// store untouched; a record is never partially written. The returned
    /// message is what the transport hands back to the caller verbatim.
    pub fn apply(
        &self,
        request: &UpdateRequest,
        store: &dyn RecordStore,
    ) -> Result<(String, Outcome), ProtocolError> {
        if request.medical_record_number.is_missing() {
            return Err(ProtocolError::Validation(
                "Make sure to enter the patient id".to_string(),
            ));
        }
        let key = request.medical_record_number.coerce()?;

        let guard = self.key_lock(key);
        let _held = guard.lock().unwrap();

        let existing = store.find(key)?;
        let mut record = match existing {
            None => {
                let mut record = store.create(key);
                if !request.name.is_empty() {
                    record.name = Some(request.name.clone());
                }
                if !request.medical_image.is_empty() {
                    record.medical_images.push(request.medical_image.clone());
                }
                if !request.ecg_image.is_empty() {
                    record.push_ecg(request.ecg_image.clone(), request.hr, ecg_timestamp());
                }
                store.persist(&record)?;
                return Ok((
                    format!("New patient ID {} is registered", key),
                    Outcome::Registered,
                ));
            }
            Some(record) => record,
        };

        // An empty request name is "don't care" here, not "clear the name":
        // there is no way to unset a name through this protocol.
        let name_adds_nothing =
            request.name.is_empty() || record.name.as_deref() == Some(request.name.as_str());
        if request.medical_image.is_empty() && request.ecg_image.is_empty() && name_adds_nothing {
            return Ok((
                format!("No further updates for Patient ID {}", key),
                Outcome::NoChange,
            ));
        }

        if !request.name.is_empty() {
            record.name = Some(request.name.clone());
        }
        if !request.medical_image.is_empty() {
            record.medical_images.push(request.medical_image.clone());
        }
        if !request.ecg_image.is_empty() {
            // The only path that advances heart_rates/timestamps.
            record.push_ecg(request.ecg_image.clone(), request.hr, ecg_timestamp());
        }
        store.persist(&record)?;
        Ok((
            format!("Patient ID {}'s data has been updated", key),
            Outcome::Updated,
        ))
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Reconciler::new()
    }
}

/// Current local time as a `YYYY-MM-DD HH:MM:SS` display token. Never parsed
/// back by the server.
fn ecg_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Enumerates every stored medical record number, in store iteration order.
pub fn list_keys(store: &dyn RecordStore) -> Result<Vec<i64>, ProtocolError> {
    let keys = store
        .enumerate()?
        .into_iter()
        .map(|record| record.medical_record_number)
        .collect();
    Ok(keys)
}

/// One patient's record rendered for the read surface, with the wire field
/// names the monitor side expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientReport {
    pub name: String,
    pub id: i64,
    pub ecg_image: Vec<String>,
    pub heart_rate: Vec<i64>,
    pub timestamp: Vec<String>,
    pub medical_image: Vec<String>,
}

/// Looks up one patient by the id string from the request path.
pub fn get_patient(id: &str, store: &dyn RecordStore) -> Result<PatientReport, ProtocolError> {
    let key = RecordNumber::from(id).coerce().map_err(|_| {
        ProtocolError::Validation(format!("{} cannot be converted into integer", id))
    })?;
    let record = store
        .find(key)?
        .ok_or_else(|| {
            ProtocolError::NotFound(format!("{} does not exist in the current database", key))
        })?;
    Ok(PatientReport {
        name: record.name.unwrap_or_else(|| "Not Specified".to_string()),
        id: record.medical_record_number,
        ecg_image: record.ecg_images,
        heart_rate: record.heart_rates,
        timestamp: record.timestamps,
        medical_image: record.medical_images,
    })
}
