//! # homemonitor-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DocumentStore`: schema-less document persistence with field queries
//! - Define **driving/inbound ports** as use-case structs:
//!   - `EntityPersister`: typed get/save/remove/query over any `Document`
//!   - `DeviceService`: list, save, delete devices
//!   - `ReportService`: list, save, delete temperature and page speed reports
//! - Provide **in-process infrastructure** that doesn't need IO (`ListCache`)
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `homemonitor-domain` only (plus `tokio::sync`/`tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod list_cache;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
