//! Failure classes of a generation request.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong between receiving a request and returning an artifact.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// A required API key is empty after resolution.
    #[error("Both Firecrawl and OpenAI API keys are required")]
    Credential,

    /// The target URL is not an absolute URL with a host.
    #[error("Invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The scratch output directory could not be prepared.
    #[error("Unable to prepare output directory '{}': {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The generator process could not be started or awaited.
    #[error("Failed to run '{program}': {reason}")]
    Launch { program: String, reason: String },

    /// The generator exceeded its time budget and was terminated.
    #[error("Generation timed out after {}s and the process was terminated", .budget.as_secs())]
    Timeout { budget: Duration },

    /// The generator ran and exited non-zero.
    #[error("Generator failed with code {exit_code}. Error: {stderr}")]
    ProcessFailure { exit_code: i32, stderr: String },

    /// The generator exited zero but the artifact could not be read.
    #[error("Failed to read output file '{}': {source}", .path.display())]
    ArtifactMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    /// Whether the failure was caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Credential | Self::InvalidUrl { .. })
    }
}
