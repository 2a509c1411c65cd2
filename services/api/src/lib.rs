//! services/api/src/lib.rs
//!
//! The HTTP service around `reading_tracker_core`: storage and credential
//! adapters, configuration, error mapping and the axum router.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
