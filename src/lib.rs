//! PulseDB: a patient record server with ECG heart-rate estimation
//!
//! PulseDB stores patient metadata, uploaded medical images, and ECG traces
//! behind a small HTTP API. All record mutation flows through the
//! reconciliation protocol in [`protocol`], which keeps the ECG image,
//! heart rate, and timestamp histories of every record in lockstep. The
//! [`ecg`] module estimates an average heart rate from a raw ECG trace, and
//! [`client`] wraps the HTTP calls for the upload and monitor sides.

pub mod api;
pub mod client;
pub mod config;
pub mod ecg;
pub mod error;
pub mod protocol;
pub mod store;
