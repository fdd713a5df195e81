//! The workspace module owns the scratch output directory and the artifact naming
//! contract shared with the generator script.

use std::path::{Path, PathBuf};

use log::debug;
use url::Url;

use crate::constants::{ARTIFACT_SUFFIX, FULL_ARTIFACT_SUFFIX, WWW_PREFIX};
use crate::error::GenerateError;

/// Derives the domain part of artifact filenames: the URL host without any leading `www.`.
///
/// The generator names its output files from the same derivation, so this is the single
/// place where that naming lives.
///
/// Ports are dropped. The bundled generator keeps the port of the URL's authority in its
/// file names, so a target with an explicit port (`http://localhost:3002`) finishes with
/// [`GenerateError::ArtifactMissing`]. Such targets are not supported.
pub fn artifact_domain(url: &Url) -> String {
    let mut host = url.host_str().unwrap_or_default();
    while let Some(stripped) = host.strip_prefix(WWW_PREFIX) {
        host = stripped;
    }
    host.to_owned()
}

/// Filename of the `llms.txt` artifact for a URL.
pub fn artifact_file_name(url: &Url) -> String {
    format!("{}{ARTIFACT_SUFFIX}", artifact_domain(url))
}

/// Filename of the `llms-full.txt` companion the generator may write next to the artifact.
pub fn full_artifact_file_name(url: &Url) -> String {
    format!("{}{FULL_ARTIFACT_SUFFIX}", artifact_domain(url))
}

/// Paths of every file a job for one URL may leave in the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Absolute output directory handed to the generator.
    pub output_dir: PathBuf,
    /// The `llms.txt` file returned to the caller.
    pub artifact: PathBuf,
    /// The `llms-full.txt` companion, removed alongside the artifact.
    pub full_artifact: PathBuf,
}

/// Ensures `output_root` exists and returns where the artifact for `target_url` will land.
/// The returned paths are absolute, since the generator runs in its own working directory.
///
/// # Errors
///
/// Returns [`GenerateError::Workspace`] if the directory cannot be created or resolved.
pub async fn prepare_output_path(
    target_url: &Url,
    output_root: &Path,
) -> Result<ArtifactPaths, GenerateError> {
    let workspace_error = |source| GenerateError::Workspace {
        path: output_root.to_path_buf(),
        source,
    };
    tokio::fs::create_dir_all(output_root)
        .await
        .map_err(workspace_error)?;
    let output_dir = tokio::fs::canonicalize(output_root)
        .await
        .map_err(workspace_error)?;

    let paths = ArtifactPaths {
        artifact: output_dir.join(artifact_file_name(target_url)),
        full_artifact: output_dir.join(full_artifact_file_name(target_url)),
        output_dir,
    };
    debug!("Expecting artifact at {}", paths.artifact.display());

    Ok(paths)
}
