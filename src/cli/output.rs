//! CLI output formatting

use crate::core::workflow::{Job, Workflow};
use console::Emoji;
use std::collections::BTreeMap;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");

/// One line per job: id, dependencies and instance count
pub fn format_job_summary(id: &str, job: &Job) -> String {
    let instances = job
        .strategy
        .as_ref()
        .map_or(1, |s| s.matrix.instance_count());

    let needs = if job.needs.is_empty() {
        String::new()
    } else {
        format!(" ← {}", job.needs.join(", "))
    };

    format!(
        "{}{} ({} {}){}",
        style(id).cyan(),
        style(needs).dim(),
        instances,
        if instances == 1 { "instance" } else { "instances" },
        if job.if_condition.is_some() {
            style(" [conditional]").yellow().to_string()
        } else {
            String::new()
        }
    )
}

/// Render one matrix combination as `axis=value` pairs
pub fn format_instance(combo: &BTreeMap<String, String>) -> String {
    combo
        .iter()
        .map(|(axis, value)| format!("{}={}", axis, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Summary printed after generating
pub fn format_workflow_summary(workflow: &Workflow) -> Vec<String> {
    workflow
        .jobs
        .iter()
        .map(|(id, job)| format!("  {}", format_job_summary(id, job)))
        .collect()
}

/// Matrix expansion of every job, as JSON
pub fn matrix_json(workflow: &Workflow) -> serde_json::Value {
    let jobs: Vec<serde_json::Value> = workflow
        .jobs
        .iter()
        .filter_map(|(id, job)| {
            job.strategy.as_ref().map(|s| {
                serde_json::json!({
                    "job": id,
                    "fail_fast": s.fail_fast,
                    "instances": s.matrix.combinations(),
                })
            })
        })
        .collect();
    serde_json::json!({ "jobs": jobs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workflow::{Matrix, Strategy, Triggers};

    #[test]
    fn test_format_instance() {
        let mut combo = BTreeMap::new();
        combo.insert("postgres".to_string(), "16".to_string());
        combo.insert("node".to_string(), "20".to_string());
        assert_eq!(format_instance(&combo), "node=20 postgres=16");
    }

    #[test]
    fn test_matrix_json_lists_only_matrix_jobs() {
        let mut workflow = Workflow::new("CI", Triggers::branch("main"));
        workflow.add_job("build", Job::new("Build", "ubuntu-latest")).unwrap();
        workflow
            .add_job(
                "test",
                Job::new("Test", "ubuntu-latest").with_strategy(Strategy {
                    fail_fast: false,
                    matrix: Matrix::new().axis("node", ["18", "20"]),
                }),
            )
            .unwrap();

        let json = matrix_json(&workflow);
        let jobs = json["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0]["job"], "test");
        assert_eq!(jobs[0]["instances"].as_array().unwrap().len(), 2);
        assert_eq!(jobs[0]["instances"][1]["node"], "20");
    }
}
