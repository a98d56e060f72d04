//! Test utility functions for workflow-gen
#![allow(dead_code)]

use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use workflow_gen::core::GeneratorConfig;
use workflow_gen::render::{WorkflowEmitter, YamlEmitter};
use workflow_gen::{generate, Workflow};

/// Lay out a monorepo with one package per name and a yarn lock file
pub fn fake_monorepo(names: &[&str]) -> TempDir {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_lockfile(temp.path(), "yarn.lock");
    for name in names {
        let dir = temp.path().join("packages").join(name);
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("package.json"), format!("{{\"name\": \"{}\"}}", name)).unwrap();
        fs::write(dir.join("src/index.ts"), "export {}\n").unwrap();
    }
    temp
}

pub fn write_lockfile(root: &Path, name: &str) {
    fs::write(root.join(name), "# lockfile\n").unwrap();
}

/// Generate and render, returning the tree, the text and the parsed-back document
pub fn render(config: &GeneratorConfig, root: &Path) -> (Workflow, String, Value) {
    let workflow = generate(config, root).expect("generate workflow");
    let yaml = YamlEmitter::new().emit(&workflow).expect("render workflow");
    let value: Value = serde_yaml::from_str(&yaml).expect("rendered YAML parses");
    (workflow, yaml, value)
}

pub fn job<'a>(doc: &'a Value, id: &str) -> &'a Value {
    let job = &doc["jobs"][id];
    assert!(!job.is_null(), "job '{}' missing from rendered workflow", id);
    job
}

pub fn job_ids(doc: &Value) -> Vec<String> {
    doc["jobs"]
        .as_mapping()
        .expect("jobs mapping")
        .keys()
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect()
}

pub fn steps(job: &Value) -> &Vec<Value> {
    job["steps"].as_sequence().expect("steps sequence")
}

/// First step whose `uses` names `action`
pub fn step_using<'a>(job: &'a Value, action: &str) -> Option<&'a Value> {
    let prefix = format!("{}@", action);
    steps(job).iter().find(|s| {
        s["uses"]
            .as_str()
            .map_or(false, |uses| uses.starts_with(&prefix))
    })
}

pub fn needs(job: &Value) -> Vec<String> {
    job["needs"]
        .as_sequence()
        .map(|seq| {
            seq.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn str_list(value: &Value) -> Vec<String> {
    value
        .as_sequence()
        .expect("sequence")
        .iter()
        .map(|v| v.as_str().expect("string item").to_string())
        .collect()
}

/// Every string scalar in the document, with a dotted path to it
pub fn collect_strings(value: &Value, path: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::String(s) => out.push((path.to_string(), s.clone())),
        Value::Sequence(seq) => {
            for (i, item) in seq.iter().enumerate() {
                collect_strings(item, &format!("{}[{}]", path, i), out);
            }
        }
        Value::Mapping(map) => {
            for (k, v) in map {
                let key = k.as_str().unwrap_or("?");
                collect_strings(v, &format!("{}.{}", path, key), out);
            }
        }
        _ => {}
    }
}
