//! Job catalogue

use crate::core::config::{DatabaseConfig, GeneratorConfig};
use crate::core::error::Result;
use crate::core::packages::PackageSet;
use crate::core::workflow::{Job, Matrix, Step, Strategy, Triggers, Workflow};
use crate::generate::{cache, steps};
use tracing::debug;

pub const BUILD_JOB: &str = "build";
pub const PUBLISH_JOB: &str = "publish-website";
pub const FORMAT_JOB: &str = "format";
pub const LINT_JOB: &str = "lint";
pub const DEPLOY_STEP: &str = "deploy";
pub const RUNTIME_AXIS: &str = "node";

/// Job id of the runtime-only test job
pub fn runtime_test_job_id() -> String {
    format!("test-{}", RUNTIME_AXIS)
}

/// Job id of the test job for a database matrix
pub fn database_test_job_id(db: &DatabaseConfig) -> String {
    format!("test-{}", db.name)
}

fn matrix_expr(axis: &str) -> String {
    format!("${{{{ matrix.{} }}}}", axis)
}

fn secret_expr(secret: &str) -> String {
    format!("${{{{ secrets.{} }}}}", secret)
}

/// Checkout, runtime, dependency cache and install
fn prepare(config: &GeneratorConfig, packages: &PackageSet, runtime: &str) -> Vec<Step> {
    vec![
        steps::checkout(),
        steps::setup_runtime(runtime, config.package_manager),
        cache::dependency_cache_step(config, packages),
        steps::install(config.package_manager, Some(cache::DEPENDENCY_CACHE_ID)),
    ]
}

/// Download the build artifact back into the packages' `dist` directories
fn load_build_output(config: &GeneratorConfig, packages: &PackageSet) -> Step {
    let root = steps::artifact_root(&packages.dist_paths());
    steps::load_artifact(&config.artifact.name, &root)
}

fn build_job(config: &GeneratorConfig, packages: &PackageSet) -> Job {
    let build = steps::run_script("Build packages", config.package_manager, &config.scripts.build)
        .when(format!(
            "steps.{}.outputs.cache-hit != 'true'",
            cache::BUILD_CACHE_ID
        ));

    Job::new("Build", &config.runs_on)
        .with_steps(prepare(config, packages, &config.default_runtime))
        .with_step(cache::build_cache_step(config, packages))
        .with_step(build)
        .with_step(steps::save_artifact(
            &config.artifact.name,
            &packages.dist_paths(),
            config.artifact.retention_days,
        ))
}

fn publish_job(config: &GeneratorConfig, packages: &PackageSet) -> Job {
    let website = &config.website;
    let deploy = Step::command(
        "Deploy website",
        format!("{} --dir {}", website.deploy_command, website.dir),
    )
    .with_id(DEPLOY_STEP)
    .with_env(&website.site_id_secret, secret_expr(&website.site_id_secret))
    .with_env(&website.auth_token_secret, secret_expr(&website.auth_token_secret));

    Job::new("Publish website", &config.runs_on)
        .needs(BUILD_JOB)
        .when(format!(
            "github.event_name == 'push' && github.ref == 'refs/heads/{}'",
            config.branch
        ))
        .with_steps(prepare(config, packages, &config.default_runtime))
        .with_step(load_build_output(config, packages))
        .with_step(steps::run_script(
            "Build website",
            config.package_manager,
            &config.scripts.website,
        ))
        .with_step(deploy)
}

/// A test job over the runtime axis plus an optional database axis
fn test_job(
    config: &GeneratorConfig,
    packages: &PackageSet,
    database: Option<&DatabaseConfig>,
) -> Job {
    let mut matrix = Matrix::new().axis(RUNTIME_AXIS, config.runtime_versions.iter().cloned());
    let runtime = matrix_expr(RUNTIME_AXIS);

    let (name, script) = match database {
        Some(db) => {
            matrix = matrix.axis(&db.name, db.versions.iter().cloned());
            (
                format!("Test {} {} (Node {})", db.name, matrix_expr(&db.name), runtime),
                db.test_script.as_deref().unwrap_or(&config.scripts.test),
            )
        }
        None => (format!("Test (Node {})", runtime), config.scripts.test.as_str()),
    };

    let mut job = Job::new(name, &config.runs_on)
        .needs(BUILD_JOB)
        .with_strategy(Strategy {
            fail_fast: config.fail_fast,
            matrix,
        });

    for (key, value) in &config.test_env {
        job = job.with_env(key, value);
    }
    if let Some(db) = database {
        job = job.with_env(&db.env_var, matrix_expr(&db.name));
    }

    job.with_steps(prepare(config, packages, &runtime))
        .with_step(load_build_output(config, packages))
        .with_step(steps::run_script("Run tests", config.package_manager, script))
}

fn format_job(config: &GeneratorConfig, packages: &PackageSet) -> Job {
    Job::new("Check formatting", &config.runs_on)
        .with_steps(prepare(config, packages, &config.default_runtime))
        .with_step(steps::run_script(
            "Check formatting",
            config.package_manager,
            &config.scripts.format_check,
        ))
}

fn lint_job(config: &GeneratorConfig, packages: &PackageSet) -> Job {
    Job::new("Lint", &config.runs_on)
        .needs(BUILD_JOB)
        .with_steps(prepare(config, packages, &config.default_runtime))
        .with_step(load_build_output(config, packages))
        .with_step(steps::run_script("Lint", config.package_manager, &config.scripts.lint))
}

/// Assemble the whole workflow tree
pub fn build_workflow(config: &GeneratorConfig, packages: &PackageSet) -> Result<Workflow> {
    let mut workflow = Workflow::new(&config.name, Triggers::branch(&config.branch));

    workflow.add_job(BUILD_JOB, build_job(config, packages))?;

    if config.website.enabled {
        workflow.add_job(PUBLISH_JOB, publish_job(config, packages))?;
    }

    workflow.add_job(runtime_test_job_id(), test_job(config, packages, None))?;

    for db in &config.databases {
        if db.versions.is_empty() {
            debug!("Skipping {} tests: no versions configured", db.name);
            continue;
        }
        workflow.add_job(database_test_job_id(db), test_job(config, packages, Some(db)))?;
    }

    workflow.add_job(FORMAT_JOB, format_job(config, packages))?;
    workflow.add_job(LINT_JOB, lint_job(config, packages))?;

    debug!(
        "Assembled {} jobs for {} packages",
        workflow.jobs.len(),
        packages.len()
    );

    Ok(workflow)
}
