//! Generator configuration from YAML

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use anyhow::Result;
use regex::Regex;

/// Package manager used by the monorepo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    #[default]
    Yarn,
    Pnpm,
}

impl PackageManager {
    /// Lock file the package manager writes at the repository root
    pub fn lockfile(&self) -> &'static str {
        match self {
            PackageManager::Npm => "package-lock.json",
            PackageManager::Yarn => "yarn.lock",
            PackageManager::Pnpm => "pnpm-lock.yaml",
        }
    }

    /// Value for the runtime setup action's `cache` input
    pub fn cache_id(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    /// Install command that refuses to touch the lock file
    pub fn frozen_install(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm ci",
            PackageManager::Yarn => "yarn install --frozen-lockfile",
            PackageManager::Pnpm => "pnpm install --frozen-lockfile",
        }
    }

    /// Run a package.json script
    pub fn run_script(&self, script: &str) -> String {
        match self {
            PackageManager::Npm => format!("npm run {}", script),
            PackageManager::Yarn => format!("yarn {}", script),
            PackageManager::Pnpm => format!("pnpm run {}", script),
        }
    }

    /// Directory holding installed dependencies
    pub fn modules_dir(&self) -> &'static str {
        "node_modules"
    }
}

/// Top-level generator configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Workflow name shown by the CI provider
    pub name: String,

    /// Branch whose pushes and pull requests trigger the workflow
    pub branch: String,

    /// Runner image for every job
    pub runs_on: String,

    /// Directory listing the monorepo packages, relative to the repository root
    pub packages_dir: String,

    pub package_manager: PackageManager,

    /// Overrides the package manager's default lock file
    pub lockfile: Option<String>,

    /// Runtime versions tested by every test job
    pub runtime_versions: Vec<String>,

    /// Runtime version used by non-matrix jobs
    pub default_runtime: String,

    /// Relational databases to test against, one matrix job each
    pub databases: Vec<DatabaseConfig>,

    /// Passed through as the matrix `fail-fast` flag
    pub fail_fast: bool,

    /// Extra environment for test jobs (e.g. debug switches)
    pub test_env: BTreeMap<String, String>,

    pub scripts: ScriptsConfig,

    pub website: WebsiteConfig,

    pub artifact: ArtifactConfig,

    /// Path of the rendered workflow file, relative to the repository root
    pub output: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            name: "CI".to_string(),
            branch: "main".to_string(),
            runs_on: "ubuntu-latest".to_string(),
            packages_dir: "packages".to_string(),
            package_manager: PackageManager::default(),
            lockfile: None,
            runtime_versions: vec!["18".to_string(), "20".to_string(), "22".to_string()],
            default_runtime: "20".to_string(),
            databases: vec![
                DatabaseConfig::new("postgres", "POSTGRES_IMAGE_TAG", &["13", "14", "15", "16"]),
                DatabaseConfig::new("mysql", "MYSQL_IMAGE_TAG", &["5.7", "8.0"]),
            ],
            fail_fast: false,
            test_env: BTreeMap::new(),
            scripts: ScriptsConfig::default(),
            website: WebsiteConfig::default(),
            artifact: ArtifactConfig::default(),
            output: ".github/workflows/ci.yml".to_string(),
        }
    }
}

/// A database matrix axis
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Axis name, also used in the job id (`test-<name>`)
    pub name: String,

    /// Environment variable receiving the matrix-selected image tag
    pub env_var: String,

    /// Container image tags
    #[serde(default)]
    pub versions: Vec<String>,

    /// Script to run instead of the default test script
    #[serde(default)]
    pub test_script: Option<String>,
}

impl DatabaseConfig {
    pub fn new(name: &str, env_var: &str, versions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            env_var: env_var.to_string(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            test_script: None,
        }
    }
}

/// package.json scripts invoked by the jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub build: String,
    pub test: String,
    pub lint: String,
    pub format_check: String,
    pub website: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            build: "build".to_string(),
            test: "test".to_string(),
            lint: "lint".to_string(),
            format_check: "format:check".to_string(),
            website: "website:build".to_string(),
        }
    }
}

/// Website publishing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteConfig {
    /// Set to false to drop the publish job
    pub enabled: bool,

    /// Built site directory handed to the deploy command
    pub dir: String,

    /// Deploy CLI invocation; `--dir` is appended
    pub deploy_command: String,

    /// Secret holding the hosting site id
    pub site_id_secret: String,

    /// Secret holding the hosting auth token
    pub auth_token_secret: String,
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "website/build".to_string(),
            deploy_command: "npx netlify-cli deploy --prod".to_string(),
            site_id_secret: "NETLIFY_SITE_ID".to_string(),
            auth_token_secret: "NETLIFY_AUTH_TOKEN".to_string(),
        }
    }
}

/// Build output shared between jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub name: String,
    pub retention_days: u32,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            name: "build-output".to_string(),
            retention_days: 1,
        }
    }
}

fn secret_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("secret name pattern is a valid regex")
    })
}

impl GeneratorConfig {
    /// Load generator configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse generator configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null, not as an empty mapping
        let config: GeneratorConfig = if yaml.trim().is_empty() {
            GeneratorConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Effective lock file path
    pub fn lockfile(&self) -> &str {
        self.lockfile
            .as_deref()
            .unwrap_or_else(|| self.package_manager.lockfile())
    }

    /// Validate the generator configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Workflow name must not be empty");
        }
        if self.branch.trim().is_empty() {
            anyhow::bail!("Trigger branch must not be empty");
        }

        if self.runtime_versions.is_empty() {
            anyhow::bail!("At least one runtime version is required");
        }
        if !self.runtime_versions.contains(&self.default_runtime) {
            anyhow::bail!(
                "Default runtime '{}' is not one of the runtime versions {:?}",
                self.default_runtime,
                self.runtime_versions
            );
        }

        let mut seen = HashSet::new();
        for db in &self.databases {
            if db.name.trim().is_empty() {
                anyhow::bail!("Database entries need a name");
            }
            if !seen.insert(&db.name) {
                anyhow::bail!("Duplicate database: {}", db.name);
            }
            if db.name == "node" {
                anyhow::bail!("Database name 'node' collides with the runtime matrix axis");
            }
            if db.env_var.trim().is_empty() {
                anyhow::bail!("Database '{}' has no env_var", db.name);
            }
        }

        let scripts = [
            ("build", &self.scripts.build),
            ("test", &self.scripts.test),
            ("lint", &self.scripts.lint),
            ("format_check", &self.scripts.format_check),
            ("website", &self.scripts.website),
        ];
        for (key, script) in scripts {
            if script.trim().is_empty() {
                anyhow::bail!("Script '{}' must not be empty", key);
            }
        }

        if self.website.enabled {
            if self.website.site_id_secret.trim().is_empty()
                || self.website.auth_token_secret.trim().is_empty()
            {
                anyhow::bail!("Website publishing needs both secret names");
            }
            if self.website.site_id_secret == self.website.auth_token_secret {
                anyhow::bail!("Site id and auth token must be distinct secrets");
            }
            for secret in [&self.website.site_id_secret, &self.website.auth_token_secret] {
                if !secret_name_pattern().is_match(secret) {
                    anyhow::bail!(
                        "Invalid secret name '{}': use letters, digits and underscores, not starting with a digit",
                        secret
                    );
                }
            }
        }

        if self.artifact.name.trim().is_empty() {
            anyhow::bail!("Artifact name must not be empty");
        }
        if !(1..=90).contains(&self.artifact.retention_days) {
            anyhow::bail!(
                "Artifact retention must be between 1 and 90 days, got {}",
                self.artifact.retention_days
            );
        }

        Ok(())
    }
}
