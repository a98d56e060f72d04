use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use workflow_gen::cli::commands::{CheckCommand, GenerateCommand, MatrixCommand, PrintCommand};
use workflow_gen::cli::output::*;
use workflow_gen::cli::{Cli, Command, DEFAULT_CONFIG_FILE};
use workflow_gen::core::GeneratorConfig;
use workflow_gen::render::{self, JsonEmitter, WorkflowEmitter, YamlEmitter, REGENERATE_COMMAND};
use workflow_gen::{generate, Workflow};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let root = PathBuf::from(&cli.root);
    let config = load_config(&cli, &root)?;

    // Execute command
    match &cli.command {
        Command::Generate(cmd) => generate_workflow(cmd, &config, &root)?,
        Command::Check(cmd) => check_workflow(cmd, &config, &root)?,
        Command::Print(cmd) => print_workflow(cmd, &config, &root)?,
        Command::Matrix(cmd) => show_matrix(cmd, &config, &root)?,
    }

    Ok(())
}

fn load_config(cli: &Cli, root: &Path) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load generator config {}", path))?,
        None => {
            let path = root.join(DEFAULT_CONFIG_FILE);
            if path.exists() {
                GeneratorConfig::from_file(&path)
                    .with_context(|| format!("Failed to load generator config {}", path.display()))?
            } else {
                info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                GeneratorConfig::default()
            }
        }
    };

    if let Some(branch) = &cli.branch {
        config.branch = branch.clone();
        config.validate().context("Invalid branch override")?;
    }

    Ok(config)
}

fn assemble(config: &GeneratorConfig, root: &Path) -> Result<Workflow> {
    generate(config, root).context("Failed to generate workflow")
}

fn output_path(root: &Path, config: &GeneratorConfig, output: &Option<String>) -> PathBuf {
    root.join(output.as_deref().unwrap_or(&config.output))
}

fn generate_workflow(cmd: &GenerateCommand, config: &GeneratorConfig, root: &Path) -> Result<()> {
    let workflow = assemble(config, root)?;
    let rendered = YamlEmitter::new().emit(&workflow)?;

    if cmd.dry_run {
        print!("{}", rendered);
        return Ok(());
    }

    let path = output_path(root, config, &cmd.output);
    render::write_workflow(&path, &rendered)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "{} Generated {} ({} jobs)",
        CHECK,
        style(path.display()).bold(),
        style(workflow.jobs.len()).cyan()
    );
    for line in format_workflow_summary(&workflow) {
        println!("{}", line);
    }

    Ok(())
}

fn check_workflow(cmd: &CheckCommand, config: &GeneratorConfig, root: &Path) -> Result<()> {
    let workflow = assemble(config, root)?;
    let rendered = YamlEmitter::new().emit(&workflow)?;
    let path = output_path(root, config, &cmd.output);

    if render::is_up_to_date(&path, &rendered)? {
        println!("{} {} is up to date", CHECK, style(path.display()).bold());
        Ok(())
    } else {
        println!("{} {} is out of date", CROSS, style(path.display()).bold());
        println!("  Run {} to refresh it", style(REGENERATE_COMMAND).cyan());
        error!("Workflow file differs from generated output");
        std::process::exit(1);
    }
}

fn print_workflow(cmd: &PrintCommand, config: &GeneratorConfig, root: &Path) -> Result<()> {
    let workflow = assemble(config, root)?;

    let rendered = if cmd.json {
        JsonEmitter.emit(&workflow)?
    } else if cmd.no_header {
        YamlEmitter::new().without_header().emit(&workflow)?
    } else {
        YamlEmitter::new().emit(&workflow)?
    };
    print!("{}", rendered);
    if cmd.json {
        println!();
    }

    Ok(())
}

fn show_matrix(cmd: &MatrixCommand, config: &GeneratorConfig, root: &Path) -> Result<()> {
    let workflow = assemble(config, root)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&matrix_json(&workflow))?);
        return Ok(());
    }

    println!("{} Jobs in {}:", INFO, style(&workflow.name).bold());
    for (id, job) in workflow.jobs.iter() {
        println!("  {}", format_job_summary(id, job));
        if let Some(strategy) = &job.strategy {
            if strategy.fail_fast {
                println!("    {} fail-fast enabled", WARN);
            }
            for combo in strategy.matrix.combinations() {
                println!("    {}", style(format_instance(&combo)).dim());
            }
        }
    }

    Ok(())
}
