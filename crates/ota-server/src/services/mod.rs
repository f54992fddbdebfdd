//! Core services: update-client identification, catalog listing,
//! firmware loading and catalog path resolution.

pub mod catalog;
pub mod firmware;
pub mod identity;
pub mod paths;
