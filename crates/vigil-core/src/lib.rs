//! vigil-core — domain types for the Vigil status daemon.
//!
//! Defines the config document, the probe contract, and the section
//! report types that make up a status [`Snapshot`].
//!
//! # Architecture
//!
//! ```text
//! Config (vigil.json, read once at startup)
//!   └── one opaque block per probe category
//! Probe (dyn trait, fixed registry for process lifetime)
//!   └── collect() → SectionResult (one tagged variant per category)
//! Snapshot
//!   └── timestamp + registration-ordered map of sections
//! ```
//!
//! A `SectionResult` is always JSON-serializable; a failed probe reduces
//! to its category's degraded shape (empty list, zeroed counters, or a
//! `{status: "error", note}` record), never to an absent key.

pub mod config;
pub mod error;
pub mod probe;
pub mod types;
pub mod uptime;

pub use config::Config;
pub use error::ConfigError;
pub use probe::Probe;
pub use types::*;
pub use uptime::format_uptime;
