//! workflow-gen - declarative generator for the monorepo's CI workflow

pub mod cli;
pub mod core;
pub mod generate;
pub mod render;

// Re-export commonly used types
pub use crate::core::{GeneratorConfig, GeneratorError, Job, Matrix, PackageSet, Step, Workflow};
pub use generate::{generate, generate_for};
pub use render::{JsonEmitter, WorkflowEmitter, YamlEmitter};
