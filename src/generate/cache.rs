//! Cache key composition
//!
//! Keys are provider expressions evaluated at run time; `hashFiles` hashes
//! the matched files in argument order, so the lock file always comes first
//! and package globs follow in name order.

use crate::core::config::GeneratorConfig;
use crate::core::packages::PackageSet;
use crate::core::workflow::Step;
use crate::generate::steps;

pub const DEPENDENCY_CACHE_ID: &str = "deps-cache";
pub const BUILD_CACHE_ID: &str = "build-cache";

fn quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', "''"))
}

fn hash_files<'a>(paths: impl IntoIterator<Item = &'a str>) -> String {
    let args: Vec<String> = paths.into_iter().map(quote).collect();
    format!("hashFiles({})", args.join(", "))
}

/// Fallback prefix used when no exact key exists
pub fn restore_keys(prefix: &str) -> String {
    format!("${{{{ runner.os }}}}-{}-", prefix)
}

pub fn dependency_cache_key(lockfile: &str) -> String {
    format!("{}${{{{ {} }}}}", restore_keys("deps"), hash_files([lockfile]))
}

/// Key covering the lock file and every package's source tree
pub fn build_cache_key(lockfile: &str, packages: &PackageSet) -> String {
    let globs = packages.source_globs();
    let inputs = std::iter::once(lockfile).chain(globs.iter().map(String::as_str));
    format!("{}${{{{ {} }}}}", restore_keys("build"), hash_files(inputs))
}

pub fn dependency_cache_step(config: &GeneratorConfig, packages: &PackageSet) -> Step {
    let modules = config.package_manager.modules_dir();
    let mut paths = vec![modules.to_string()];
    paths.extend(packages.iter().map(|p| format!("{}/{}", p.path, modules)));

    steps::cache(
        "Cache dependencies",
        DEPENDENCY_CACHE_ID,
        &paths,
        dependency_cache_key(config.lockfile()),
        restore_keys("deps"),
    )
}

pub fn build_cache_step(config: &GeneratorConfig, packages: &PackageSet) -> Step {
    steps::cache(
        "Cache build output",
        BUILD_CACHE_ID,
        &packages.dist_paths(),
        build_cache_key(config.lockfile(), packages),
        restore_keys("build"),
    )
}
