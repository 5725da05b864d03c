//! Core modules for docgate's verification engine.
//!
//! Extraction, validation and reporting live here; `lib.rs` only wires them
//! to the command line.

pub mod assets;
pub mod config;
pub mod conformance;
pub mod corpus;
pub mod error;
pub mod finding;
pub mod lifecycle;
pub mod markdown;
pub mod metadata;
pub mod output;
pub mod report;
pub mod schema;
pub mod time;
pub mod validate;
