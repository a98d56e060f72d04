//! Monorepo package discovery

use crate::core::error::{GeneratorError, Result};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A package directory found under the packages directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Directory name
    pub name: String,

    /// Path relative to the repository root, `/`-separated
    pub path: String,

    pub has_manifest: bool,

    pub has_sources: bool,
}

impl Package {
    /// Glob covering the package's source tree
    pub fn source_glob(&self) -> String {
        format!("{}/src/**", self.path)
    }

    /// Build output directory
    pub fn dist_path(&self) -> String {
        format!("{}/dist", self.path)
    }
}

/// The packages of a monorepo, sorted by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSet {
    packages: Vec<Package>,
}

impl PackageSet {
    /// List the immediate sub-directories of `packages_dir` below `root`
    pub fn discover(root: &Path, packages_dir: &str) -> Result<Self> {
        let dir = root.join(packages_dir);
        if !dir.is_dir() {
            return Err(GeneratorError::PackagesDirMissing(dir));
        }

        let prefix = packages_dir.trim_end_matches('/').replace('\\', "/");
        let mut packages = Vec::new();

        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                GeneratorError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop")
                }))
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let package_dir = entry.path();
            let package = Package {
                path: format!("{}/{}", prefix, name),
                has_manifest: package_dir.join("package.json").is_file(),
                has_sources: package_dir.join("src").is_dir(),
                name,
            };

            if !package.has_manifest {
                warn!("Package '{}' has no package.json", package.name);
            }
            debug!(
                "Found package {} (sources: {})",
                package.path, package.has_sources
            );
            packages.push(package);
        }

        if packages.is_empty() {
            return Err(GeneratorError::NoPackages(dir));
        }

        Ok(Self { packages })
    }

    /// Build a set from names directly, without touching the filesystem
    pub fn from_names<I, S>(packages_dir: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefix = packages_dir.trim_end_matches('/');
        let mut packages: Vec<Package> = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                Package {
                    path: format!("{}/{}", prefix, name),
                    has_manifest: true,
                    has_sources: true,
                    name,
                }
            })
            .collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        packages.dedup_by(|a, b| a.name == b.name);
        Self { packages }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Source globs of every package, in name order
    pub fn source_globs(&self) -> Vec<String> {
        self.packages.iter().map(Package::source_glob).collect()
    }

    /// Build output directories of every package, in name order
    pub fn dist_paths(&self) -> Vec<String> {
        self.packages.iter().map(Package::dist_path).collect()
    }
}
