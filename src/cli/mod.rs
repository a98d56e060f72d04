//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{CheckCommand, GenerateCommand, MatrixCommand, PrintCommand};
use std::ffi::OsString;

/// Default generator configuration file, relative to the repository root
pub const DEFAULT_CONFIG_FILE: &str = "workflow-gen.yaml";

/// Generates the monorepo's CI workflow file
#[derive(Debug, Parser, Clone)]
#[command(name = "workflow-gen")]
#[command(version)]
#[command(about = "Declarative generator for the monorepo's CI workflow", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to generator configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Repository root holding the packages directory
    #[arg(long, global = true, default_value = ".")]
    pub root: String,

    /// Override the trigger branch
    #[arg(long, global = true)]
    pub branch: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Write the workflow file
    Generate(GenerateCommand),

    /// Fail when the workflow file on disk is out of date
    Check(CheckCommand),

    /// Print the rendered workflow
    Print(PrintCommand),

    /// List the job instances each matrix expands into
    Matrix(MatrixCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
