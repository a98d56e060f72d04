//! Step fragments shared by the jobs

use crate::core::config::PackageManager;
use crate::core::workflow::Step;

pub const CHECKOUT_ACTION: &str = "actions/checkout";
pub const SETUP_NODE_ACTION: &str = "actions/setup-node";
pub const CACHE_ACTION: &str = "actions/cache";
pub const UPLOAD_ARTIFACT_ACTION: &str = "actions/upload-artifact";
pub const DOWNLOAD_ARTIFACT_ACTION: &str = "actions/download-artifact";

const CHECKOUT_VERSION: &str = "v4";
const SETUP_NODE_VERSION: &str = "v4";
const CACHE_VERSION: &str = "v4";
const ARTIFACT_VERSION: &str = "v4";

fn pinned(action: &str, version: &str) -> String {
    format!("{}@{}", action, version)
}

pub fn checkout() -> Step {
    Step::action("Checkout", pinned(CHECKOUT_ACTION, CHECKOUT_VERSION))
}

/// Install the runtime; `version` may be a literal or a matrix expression
pub fn setup_runtime(version: &str, package_manager: PackageManager) -> Step {
    Step::action("Setup Node.js", pinned(SETUP_NODE_ACTION, SETUP_NODE_VERSION))
        .with_input("node-version", version)
        .with_input("cache", package_manager.cache_id())
}

/// Install dependencies, skipped when the dependency cache was restored
pub fn install(package_manager: PackageManager, cache_step_id: Option<&str>) -> Step {
    let step = Step::command("Install dependencies", package_manager.frozen_install());
    match cache_step_id {
        Some(id) => step.when(format!("steps.{}.outputs.cache-hit != 'true'", id)),
        None => step,
    }
}

pub fn cache(name: &str, id: &str, paths: &[String], key: String, restore_keys: String) -> Step {
    Step::action(name, pinned(CACHE_ACTION, CACHE_VERSION))
        .with_id(id)
        .with_input("path", paths.join("\n"))
        .with_input("key", key)
        .with_input("restore-keys", restore_keys)
}

/// Upload named directories for dependent jobs
pub fn save_artifact(name: &str, paths: &[String], retention_days: u32) -> Step {
    Step::action(
        format!("Save {} artifact", name),
        pinned(UPLOAD_ARTIFACT_ACTION, ARTIFACT_VERSION),
    )
    .with_input("name", name)
    .with_input("path", paths.join("\n"))
    .with_input("retention-days", retention_days.to_string())
    .with_input("if-no-files-found", "error")
}

/// Directory the upload action roots an artifact at: the deepest directory
/// shared by every path, or the path itself when there is only one
pub fn artifact_root(paths: &[String]) -> String {
    let mut split = paths.iter().map(|p| {
        p.trim_end_matches('/')
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect::<Vec<_>>()
    });

    let Some(mut common) = split.next() else {
        return ".".to_string();
    };
    for components in split {
        let shared = common
            .iter()
            .zip(&components)
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
    }

    if common.is_empty() {
        ".".to_string()
    } else {
        common.join("/")
    }
}

/// Download a named artifact into `path`, normally the `artifact_root` of
/// the uploaded paths so files land where the producer built them
pub fn load_artifact(name: &str, path: &str) -> Step {
    Step::action(
        format!("Load {} artifact", name),
        pinned(DOWNLOAD_ARTIFACT_ACTION, ARTIFACT_VERSION),
    )
    .with_input("name", name)
    .with_input("path", path)
}

pub fn run_script(name: &str, package_manager: PackageManager, script: &str) -> Step {
    Step::command(name, package_manager.run_script(script))
}
