//! Error type definitions for the router-sync control plane.
//!
//! This module defines the hierarchical error system used throughout the
//! application. Each layer (repository, data source, generator, normalizer,
//! web) gets its own error enum; `AppError` composes them so the Admin API
//! boundary can map error *kind* to HTTP status without inspecting strings.

mod types;

pub use types::*;
