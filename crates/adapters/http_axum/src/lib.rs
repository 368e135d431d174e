//! # homemonitor-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the JSON resources `/device`, `/devicereport` and
//!   `/pagespeedreport`, plus `/health`
//! - Read request parameters from the path first and the query string second
//! - Map application results into JSON responses, either as flat lists or
//!   as chart tables when `graph=true`
//! - Map every failure into the uniform error envelope
//!
//! ## Dependency rule
//! Depends on `homemonitor-app` (for the store port and services) and
//! `homemonitor-domain` (for the records used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod params;
pub mod router;
pub mod state;
