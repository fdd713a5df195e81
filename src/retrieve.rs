//! The retrieve module reads the generated artifact once the job has exited and
//! removes the temporary files afterwards.

use std::io::ErrorKind;
use std::path::Path;

use log::{debug, warn};

use crate::error::GenerateError;
use crate::job::JobResult;
use crate::workspace::ArtifactPaths;

/// Returns the artifact text of a finished job.
///
/// # Errors
///
/// Returns [`GenerateError::ProcessFailure`] with the captured stderr if the job exited
/// non-zero, and [`GenerateError::ArtifactMissing`] if it exited zero without a readable
/// file at `output_path`. Invalid UTF-8 in the artifact is replaced, not rejected.
pub async fn retrieve(result: &JobResult, output_path: &Path) -> Result<String, GenerateError> {
    if !result.success() {
        return Err(GenerateError::ProcessFailure {
            exit_code: result.exit_code,
            stderr: result.stderr.clone(),
        });
    }

    let bytes = tokio::fs::read(output_path)
        .await
        .map_err(|source| GenerateError::ArtifactMissing {
            path: output_path.to_path_buf(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Deletes the artifact and its companion. Failures are logged, never returned.
pub async fn cleanup(paths: &ArtifactPaths) {
    match tokio::fs::remove_file(&paths.artifact).await {
        Ok(()) => debug!("Removed {}", paths.artifact.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to cleanup temp file {}: {e}",
            paths.artifact.display()
        ),
    }

    match tokio::fs::remove_file(&paths.full_artifact).await {
        Ok(()) => debug!("Removed {}", paths.full_artifact.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to cleanup temp file {}: {e}",
            paths.full_artifact.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exited(exit_code: i32, stderr: &str) -> JobResult {
        JobResult {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_owned(),
        }
    }

    #[tokio::test]
    async fn non_zero_exit_wins_over_existing_file() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = scratch.path().join("example.com-llms.txt");
        std::fs::write(&path, "stale").expect("write");

        let result = retrieve(&exited(1, "boom"), &path).await;

        match result {
            Err(GenerateError::ProcessFailure { exit_code, stderr }) => {
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected process failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clean_exit_without_file_is_missing_artifact() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = scratch.path().join("example.com-llms.txt");

        let result = retrieve(&exited(0, ""), &path).await;

        assert!(matches!(result, Err(GenerateError::ArtifactMissing { .. })));
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = scratch.path().join("example.com-llms.txt");
        std::fs::write(&path, b"# Example \xff site").expect("write");

        let content = retrieve(&exited(0, ""), &path).await.expect("artifact read");

        assert_eq!(content, "# Example \u{FFFD} site");
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_files() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let paths = ArtifactPaths {
            output_dir: scratch.path().to_path_buf(),
            artifact: scratch.path().join("example.com-llms.txt"),
            full_artifact: scratch.path().join("example.com-llms-full.txt"),
        };
        std::fs::write(&paths.artifact, "content").expect("write");

        cleanup(&paths).await;
        cleanup(&paths).await;

        assert!(!paths.artifact.exists());
        assert!(!paths.full_artifact.exists());
    }
}
