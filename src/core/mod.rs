//! Core domain models for the workflow generator
//!
//! This module defines the configuration the generator reads, the package
//! listing it scans and the workflow tree it assembles.

pub mod config;
pub mod error;
pub mod packages;
pub mod workflow;

pub use config::{GeneratorConfig, PackageManager};
pub use error::GeneratorError;
pub use packages::{Package, PackageSet};
pub use workflow::*;
