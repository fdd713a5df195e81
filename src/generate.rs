//! The generate module wires the pipeline together: credentials, workspace, job,
//! retrieval and cleanup for one request.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use url::Url;

use crate::GenerationRequest;
use crate::constants::RUN_DEADLINE_SLACK_MS;
use crate::credentials::{CredentialResolver, ProcessDefaults};
use crate::error::GenerateError;
use crate::job::JobRunner;
use crate::launcher::{GeneratorConfig, build_invocation};
use crate::retrieve::{cleanup, retrieve};
use crate::workspace::prepare_output_path;

/// Orchestrates generator jobs. Holds only read-only state, so one instance serves
/// any number of concurrent requests.
pub struct Generator {
    config: GeneratorConfig,
    resolver: CredentialResolver,
    runner: Arc<dyn JobRunner>,
}

impl Generator {
    pub fn new(
        config: GeneratorConfig,
        defaults: ProcessDefaults,
        runner: Arc<dyn JobRunner>,
    ) -> Self {
        Self {
            config,
            resolver: CredentialResolver::new(defaults),
            runner,
        }
    }

    pub fn defaults(&self) -> &ProcessDefaults {
        self.resolver.defaults()
    }

    /// Produces the `llms.txt` content for the request's URL.
    ///
    /// Credentials are checked before anything touches the filesystem or spawns a
    /// process. Once a job has run, its output files are removed whether or not
    /// retrieval succeeded.
    ///
    /// The job and the artifact read share one deadline: the configured budget plus
    /// [`RUN_DEADLINE_SLACK_MS`]. Past it the job future is dropped, which kills a
    /// still running child.
    ///
    /// # Errors
    ///
    /// Returns the [`GenerateError`] of the first stage that failed.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError> {
        let credentials = self.resolver.resolve(request)?;
        let target_url = parse_target_url(&request.url)?;
        let paths = prepare_output_path(&target_url, &self.config.output_dir).await?;

        info!("Generating llms.txt for {target_url}");
        let invocation =
            build_invocation(&self.config, &target_url, &credentials, &paths.output_dir);

        let budget = self.config.timeout;
        let deadline = budget.saturating_add(Duration::from_millis(RUN_DEADLINE_SLACK_MS));
        let run_and_retrieve = async {
            let result = self.runner.run(invocation).await?;
            retrieve(&result, &paths.artifact).await
        };
        let outcome = match tokio::time::timeout(deadline, run_and_retrieve).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                warn!(
                    "Generation for {target_url} still unfinished {}ms after its budget, abandoning it",
                    RUN_DEADLINE_SLACK_MS
                );
                Err(GenerateError::Timeout { budget })
            }
        };
        cleanup(&paths).await;

        if let Ok(content) = &outcome {
            info!("Generated {} bytes of llms.txt for {target_url}", content.len());
        }
        outcome
    }
}

/// Parses user input into an absolute URL, assuming `https://` when no scheme is given.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidUrl`] if the input does not parse or has no host.
pub fn parse_target_url(raw: &str) -> Result<Url, GenerateError> {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let invalid = |reason: String| GenerateError::InvalidUrl {
        url: raw.to_owned(),
        reason,
    };
    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host".to_owned()));
    }

    Ok(url)
}
