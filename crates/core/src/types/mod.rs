//! Core types for Electroshop.
//!
//! This module provides type-safe wrappers for the catalog domain.

pub mod category;
pub mod id;
pub mod product;
pub mod provenance;

pub use category::{Category, CategoryFilter, CategoryParseError};
pub use id::ProductId;
pub use product::{Product, SpecValue, Specifications, ValidationError};
pub use provenance::{DataSource, Provenance, StoredProduct};
