//! Shape checks run on the assembled workflow before it is emitted

use crate::core::error::{GeneratorError, Result};
use crate::core::workflow::{Job, Step, Workflow};
use crate::generate::jobs::DEPLOY_STEP;
use crate::generate::steps::{self, DOWNLOAD_ARTIFACT_ACTION, UPLOAD_ARTIFACT_ACTION};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn expression_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\$\{\{(.*?)\}\}").expect("expression pattern is a valid regex")
    })
}

/// The `secrets` context anywhere in an expression, with the name it is
/// indexed by when there is one (`secrets.X`, `secrets['X']`)
fn secrets_context_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?:^|[^.\w])secrets\b(?:\s*\.\s*([A-Za-z_][A-Za-z0-9_]*)|\s*\[\s*['"]([^'"]*)['"]\s*\])?"#,
        )
        .expect("secrets context pattern is a valid regex")
    })
}

/// Names of the secrets referenced in `text`.
///
/// Every `${{ ... }}` expression touching the `secrets` context counts; a
/// use of the whole context (`toJSON(secrets)`) is reported as `secrets`.
pub fn secret_references(text: &str) -> Vec<String> {
    expression_pattern()
        .captures_iter(text)
        .flat_map(|expr| {
            let body = expr.get(1).map_or("", |m| m.as_str());
            secrets_context_pattern()
                .captures_iter(body)
                .map(|c| {
                    c.get(1)
                        .or_else(|| c.get(2))
                        .map_or_else(|| "secrets".to_string(), |m| m.as_str().to_string())
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Every violation found in one pass
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<GeneratorError>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// First violation, if any
    pub fn into_result(self) -> Result<()> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Check the workflow, returning the first violation
pub fn validate(workflow: &Workflow) -> Result<()> {
    let report = check(workflow);
    if !report.is_ok() {
        debug!("Workflow has {} shape violations", report.errors.len());
    }
    report.into_result()
}

/// Collect every shape violation
pub fn check(workflow: &Workflow) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, (id, job)) in workflow.jobs.iter().enumerate() {
        check_needs(&mut report, workflow, index, id, job);
        check_artifacts(&mut report, workflow, id, job);
        check_matrix(&mut report, id, job);
        check_job_secrets(&mut report, id, job);

        for (step_index, step) in job.steps.iter().enumerate() {
            if !step.is_well_formed() {
                report.errors.push(GeneratorError::MalformedStep {
                    job: id.to_string(),
                    index: step_index,
                });
            }
        }
    }

    report
}

fn check_needs(report: &mut ValidationReport, workflow: &Workflow, index: usize, id: &str, job: &Job) {
    for needed in &job.needs {
        let declared_before = workflow
            .jobs
            .position(needed)
            .map_or(false, |pos| pos < index);
        if !declared_before {
            report.errors.push(GeneratorError::UnknownDependency {
                job: id.to_string(),
                needed: needed.clone(),
            });
        }
    }
}

/// `(name, root)` of every artifact the job uploads, the root being where
/// the upload action anchors the stored paths
fn uploaded_artifacts(job: &Job) -> impl Iterator<Item = (&str, String)> {
    job.steps
        .iter()
        .filter(|s| s.action_name() == Some(UPLOAD_ARTIFACT_ACTION))
        .filter_map(|s| {
            let name = s.with.get("name")?;
            let paths: Vec<String> = s
                .with
                .get("path")
                .map(|p| {
                    p.lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            Some((name.as_str(), steps::artifact_root(&paths)))
        })
}

fn download_path<'a>(job: &'a Job, artifact: &str) -> Option<&'a str> {
    job.steps
        .iter()
        .filter(|s| s.action_name() == Some(DOWNLOAD_ARTIFACT_ACTION))
        .find(|s| s.with.get("name").map(String::as_str) == Some(artifact))
        .map(|s| s.with.get("path").map_or(".", String::as_str))
}

fn check_artifacts(report: &mut ValidationReport, workflow: &Workflow, id: &str, job: &Job) {
    for producer in &job.needs {
        let Some(producer_job) = workflow.job(producer) else {
            continue;
        };
        for (artifact, root) in uploaded_artifacts(producer_job) {
            if !job.loads_artifact(artifact) {
                report.errors.push(GeneratorError::MissingArtifact {
                    job: id.to_string(),
                    producer: producer.clone(),
                    artifact: artifact.to_string(),
                });
                continue;
            }
            if let Some(path) = download_path(job, artifact) {
                if path != root {
                    report.errors.push(GeneratorError::MisplacedArtifact {
                        job: id.to_string(),
                        artifact: artifact.to_string(),
                        path: path.to_string(),
                        expected: root,
                    });
                }
            }
        }
    }
}

fn check_matrix(report: &mut ValidationReport, id: &str, job: &Job) {
    let Some(strategy) = &job.strategy else {
        return;
    };
    for (axis, values) in strategy.matrix.axes() {
        if values.is_empty() {
            report.errors.push(GeneratorError::EmptyMatrixAxis {
                job: id.to_string(),
                axis: axis.to_string(),
            });
        }
    }
}

fn check_job_secrets(report: &mut ValidationReport, id: &str, job: &Job) {
    check_secrets(report, id, "name", &job.name, false);
    if let Some(condition) = &job.if_condition {
        check_secrets(report, id, "if", condition, false);
    }
    for (key, value) in job.env.iter() {
        check_secrets(report, id, &format!("env.{}", key), value, false);
    }
    for (index, step) in job.steps.iter().enumerate() {
        check_step_secrets(report, id, index, step);
    }
}

fn check_step_secrets(report: &mut ValidationReport, job: &str, index: usize, step: &Step) {
    let at = |field: &str| format!("steps[{}].{}", index, field);
    let is_deploy = step.id.as_deref() == Some(DEPLOY_STEP);

    check_secrets(report, job, &at("name"), &step.name, false);
    for (field, value) in [
        ("if", step.if_condition.as_deref()),
        ("uses", step.uses.as_deref()),
        ("run", step.run.as_deref()),
    ] {
        if let Some(value) = value {
            check_secrets(report, job, &at(field), value, false);
        }
    }
    for (key, value) in step.with.iter() {
        check_secrets(report, job, &at(&format!("with.{}", key)), value, false);
    }
    for (key, value) in step.env.iter() {
        check_secrets(report, job, &at(&format!("env.{}", key)), value, is_deploy);
    }
}

fn check_secrets(report: &mut ValidationReport, job: &str, location: &str, text: &str, allowed: bool) {
    if allowed {
        return;
    }
    for secret in secret_references(text) {
        report.errors.push(GeneratorError::SecretLeak {
            secret,
            job: job.to_string(),
            location: location.to_string(),
        });
    }
}
