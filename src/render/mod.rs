//! Workflow emitters
//!
//! An emitter turns the assembled tree into the text the CI provider reads.
//! Output depends only on the tree, so rendering the same inputs twice gives
//! identical bytes.

use crate::core::error::Result;
use crate::core::workflow::Workflow;
use std::path::Path;
use tracing::{debug, info};

/// Command printed in the generated-file header
pub const REGENERATE_COMMAND: &str = "workflow-gen generate";

/// Renders a workflow into a provider-readable document
pub trait WorkflowEmitter {
    fn emit(&self, workflow: &Workflow) -> Result<String>;
}

/// YAML emitter for the CI provider's workflow format
#[derive(Debug, Clone)]
pub struct YamlEmitter {
    header: bool,
}

impl Default for YamlEmitter {
    fn default() -> Self {
        Self { header: true }
    }
}

impl YamlEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit the generated-file banner
    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }

    fn banner() -> String {
        format!(
            "# This file is generated. Do not edit it by hand.\n# Regenerate with: {}\n\n",
            REGENERATE_COMMAND
        )
    }
}

impl WorkflowEmitter for YamlEmitter {
    fn emit(&self, workflow: &Workflow) -> Result<String> {
        let body = serde_yaml::to_string(workflow)?;
        if self.header {
            Ok(format!("{}{}", Self::banner(), body))
        } else {
            Ok(body)
        }
    }
}

/// Pretty JSON dump of the tree, for inspection
#[derive(Debug, Clone, Default)]
pub struct JsonEmitter;

impl WorkflowEmitter for JsonEmitter {
    fn emit(&self, workflow: &Workflow) -> Result<String> {
        Ok(serde_json::to_string_pretty(workflow)?)
    }
}

/// Write rendered output, creating parent directories
pub fn write_workflow(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    info!("Wrote workflow to {}", path.display());
    Ok(())
}

/// Whether the file at `path` already holds exactly `contents`
pub fn is_up_to_date(path: &Path, contents: &str) -> Result<bool> {
    if !path.exists() {
        debug!("{} does not exist yet", path.display());
        return Ok(false);
    }
    let current = std::fs::read_to_string(path)?;
    Ok(current == contents)
}
