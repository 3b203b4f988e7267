//! WMRH card database exporter
//!
//! Converts the KRCG VTES card feed into the WMRH XML card database, a
//! JSON document and a compact MessagePack document (optionally
//! compressed), all carrying the same normalized records.

pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod loader;
pub mod pipeline;
pub mod profile;

pub use error::{ExportError, Result};
