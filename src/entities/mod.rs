//! SeaORM entity definitions for the five tables in spec §6: `middlewares`,
//! `services`, `resources`, `resource_middlewares`, `resource_services`.
//!
//! These mirror the table-per-module layout the teacher generates under
//! `entities/` (one module per table plus a `prelude` re-exporting the
//! `Entity` type aliases repositories consume).

pub mod middlewares;
pub mod prelude;
pub mod resource_middlewares;
pub mod resource_services;
pub mod resources;
pub mod services;
