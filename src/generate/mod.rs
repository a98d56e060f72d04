//! Workflow assembly
//!
//! Reads the package listing, composes the job catalogue and checks its
//! shape. Rendering lives in `crate::render`.

pub mod cache;
pub mod jobs;
pub mod steps;
pub mod validate;

pub use jobs::build_workflow;
pub use validate::{check, validate, ValidationReport};

use crate::core::config::GeneratorConfig;
use crate::core::error::Result;
use crate::core::packages::PackageSet;
use crate::core::workflow::Workflow;
use std::path::Path;
use tracing::info;

/// Discover packages under `root`, then assemble and validate the workflow
pub fn generate(config: &GeneratorConfig, root: &Path) -> Result<Workflow> {
    let packages = PackageSet::discover(root, &config.packages_dir)?;
    info!(
        "Discovered {} packages in {}",
        packages.len(),
        config.packages_dir
    );
    generate_for(config, &packages)
}

/// Assemble and validate the workflow for an already-known package set
pub fn generate_for(config: &GeneratorConfig, packages: &PackageSet) -> Result<Workflow> {
    let workflow = build_workflow(config, packages)?;
    validate(&workflow)?;
    Ok(workflow)
}
