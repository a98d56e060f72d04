//! Generator error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading inputs or checking the assembled workflow
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Packages directory not found: {}", .0.display())]
    PackagesDirMissing(PathBuf),

    #[error("No packages found under {}", .0.display())]
    NoPackages(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Duplicate job id: {0}")]
    DuplicateJob(String),

    #[error("Job '{job}' needs '{needed}', which is not declared before it")]
    UnknownDependency { job: String, needed: String },

    #[error("Job '{job}' depends on '{producer}' but never loads artifact '{artifact}'")]
    MissingArtifact {
        job: String,
        producer: String,
        artifact: String,
    },

    #[error("Job '{job}' loads artifact '{artifact}' into '{path}', but its files are rooted at '{expected}'")]
    MisplacedArtifact {
        job: String,
        artifact: String,
        path: String,
        expected: String,
    },

    #[error("Job '{job}' has an empty matrix axis '{axis}'")]
    EmptyMatrixAxis { job: String, axis: String },

    #[error("Secret '{secret}' referenced outside the deploy step (job '{job}', at {location})")]
    SecretLeak {
        secret: String,
        job: String,
        location: String,
    },

    #[error("Step {index} of job '{job}' must set exactly one of `uses` or `run`")]
    MalformedStep { job: String, index: usize },

    #[error("Failed to render workflow: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("Failed to dump workflow: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = GeneratorError::UnknownDependency {
            job: "lint".to_string(),
            needed: "build".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Job 'lint' needs 'build', which is not declared before it"
        );

        let err = GeneratorError::PackagesDirMissing(PathBuf::from("packages"));
        assert!(err.to_string().contains("packages"));
    }
}
