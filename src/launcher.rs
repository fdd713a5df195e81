//! The launcher module turns resolved credentials into a concrete generator invocation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::constants::{
    DEFAULT_OUTPUT_DIR, DEFAULT_SCRIPT_DIR, DEFAULT_SCRIPT_NAME, DEFAULT_TIMEOUT_SECS,
    FALLBACK_INTERPRETER, FIRECRAWL_API_KEY_ENV_NAME, FIRECRAWL_BASE_URL_ENV_NAME,
    GENERATOR_CONFIG_FILE, OPENAI_API_KEY_ENV_NAME,
};
use crate::credentials::ResolvedCredentials;
use crate::job::JobInvocation;

/// Where the generator lives, where it writes, and how long it may run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Directory holding the script; the process runs with it as working directory.
    pub script_dir: PathBuf,
    /// Script file name, relative to `script_dir`.
    pub script_name: String,
    /// Scratch directory the generator writes its artifacts to.
    pub output_dir: PathBuf,
    /// Wall-clock budget of one job.
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from(DEFAULT_SCRIPT_DIR),
            script_name: DEFAULT_SCRIPT_NAME.to_owned(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Interpreter inside the script directory's virtual environment.
pub fn venv_interpreter(script_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        script_dir.join(".venv").join("Scripts").join("python.exe")
    } else {
        script_dir.join(".venv").join("bin").join("python")
    }
}

/// Picks the venv interpreter when it exists, otherwise `python` from `PATH`.
/// A missing interpreter only surfaces later, as a launch failure.
pub fn resolve_interpreter(script_dir: &Path) -> PathBuf {
    let venv = venv_interpreter(script_dir);
    if venv.is_file() {
        venv
    } else {
        PathBuf::from(FALLBACK_INTERPRETER)
    }
}

/// Builds the invocation for one target URL.
///
/// `output_dir` should be absolute: the process runs inside `config.script_dir`.
pub fn build_invocation(
    config: &GeneratorConfig,
    target_url: &Url,
    credentials: &ResolvedCredentials,
    output_dir: &Path,
) -> JobInvocation {
    let mut args = vec![
        config.script_name.clone(),
        target_url.to_string(),
        "--firecrawl-api-key".to_owned(),
        credentials.firecrawl_api_key.clone(),
        "--openai-api-key".to_owned(),
        credentials.openai_api_key.clone(),
        "--output-dir".to_owned(),
        output_dir.display().to_string(),
    ];

    if config.script_dir.join(GENERATOR_CONFIG_FILE).is_file() {
        args.push("--config".to_owned());
        args.push(GENERATOR_CONFIG_FILE.to_owned());
    }

    let env = BTreeMap::from([
        (
            FIRECRAWL_API_KEY_ENV_NAME.to_owned(),
            credentials.firecrawl_api_key.clone(),
        ),
        (
            OPENAI_API_KEY_ENV_NAME.to_owned(),
            credentials.openai_api_key.clone(),
        ),
        (
            FIRECRAWL_BASE_URL_ENV_NAME.to_owned(),
            credentials.firecrawl_base_url.clone(),
        ),
    ]);

    JobInvocation {
        program: resolve_interpreter(&config.script_dir),
        args,
        working_dir: config.script_dir.clone(),
        env,
        timeout: config.timeout,
    }
}
