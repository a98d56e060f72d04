//! CLI command definitions

use clap::Args;

/// Write the workflow file
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Output path (overrides the configured one)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print what would be written without touching the file
    #[arg(long)]
    pub dry_run: bool,
}

/// Compare the workflow file on disk with a fresh rendering
#[derive(Debug, Args, Clone)]
pub struct CheckCommand {
    /// Path to compare (overrides the configured one)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Print the rendered workflow
#[derive(Debug, Args, Clone)]
pub struct PrintCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Leave out the generated-file banner
    #[arg(long)]
    pub no_header: bool,
}

/// List matrix expansions
#[derive(Debug, Args, Clone)]
pub struct MatrixCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
