//! # homemonitor-domain
//!
//! Pure domain model for the homemonitor backend.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (sensors owned by a user, with capability tags)
//! - Define **Reports** (time-series readings attached to a device or a web page)
//! - Define **Documents** (how an entity is named, identified and keyed in a store)
//! - Define **Charts** (column-oriented tables for charting clients)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod chart;
pub mod device;
pub mod document;
pub mod page_speed;
pub mod report;
