//! vigil-snapshot — the background-refresh caching core.
//!
//! Orchestrates many independent, failure-prone, variable-latency
//! probes and guarantees the HTTP endpoint never blocks on them.
//!
//! # Architecture
//!
//! ```text
//! Refresher (periodic tick, at-most-one-in-flight gate)
//!   └── Aggregator.run()
//!         ├── run_probe(p) × N   (concurrent fan-out, join semantics)
//!         ├── session classification + services summary
//!         └── Snapshot
//!               └── SnapshotCache.store()  ←  HTTP handlers load()
//! ```
//!
//! # Failure isolation
//!
//! A probe that errors, panics, or never settles is reduced to its
//! category's fallback section by the runner. The aggregation itself can
//! only fail if the assembly task dies; the scheduler logs that and keeps
//! serving the previous snapshot. The cache is replaced wholesale by an
//! atomic pointer swap, so readers always see either no snapshot or a
//! complete, internally-consistent one.

pub mod aggregator;
pub mod cache;
pub mod runner;
pub mod scheduler;

pub use aggregator::Aggregator;
pub use cache::SnapshotCache;
pub use runner::run_probe;
pub use scheduler::Refresher;
