//! Electroshop Core - Shared catalog types.
//!
//! This crate provides the domain model used by every Electroshop component:
//! - `catalog` - Canonical dataset, sync engine and fallback read gateway
//! - `storefront` - Public JSON read API
//! - `cli` - Command-line sync and migration tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and lets both the remote
//! read path and the canonical fallback path share exactly the same filtering,
//! matching and aggregation logic.
//!
//! # Modules
//!
//! - [`types`] - Product, category taxonomy, provenance and validation
//! - [`stats`] - Source-agnostic aggregate counts over a record list
//! - [`search`] - Case-insensitive substring matching over product text fields

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod search;
pub mod stats;
pub mod types;

pub use stats::CatalogStats;
pub use types::*;
