//! vigil-probes — built-in probes for the Vigil status daemon.
//!
//! Each probe measures one signal source behind the uniform
//! [`Probe`](vigil_core::Probe) contract: agent heartbeat, mail
//! accounts, scheduled jobs, the session registry, service
//! reachability, containers, dev servers, host metrics, and installed
//! skills.
//!
//! Probes are constructed once from their config block by
//! [`registry`]; the resulting set is fixed for the process lifetime.
//! Every probe is read-only on the systems it observes and reports a
//! degraded section instead of failing when a backend is missing or
//! unreachable.

pub mod agent;
pub mod client;
pub mod containers;
pub mod dev_servers;
pub mod jobs;
pub mod mail;
pub mod registry;
pub mod services;
pub mod sessions;
mod shell;
pub mod skills;
pub mod system;

pub use registry::registry;
