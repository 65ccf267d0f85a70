//! HTTP surface of the record server.

pub mod rest;
