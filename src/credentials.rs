//! The credentials module decides which API keys and Firecrawl endpoint a job runs with.

use log::debug;

use crate::GenerationRequest;
use crate::constants::{
    CONFIG_FIRECRAWL_BASE_URL, DEFAULT_FIRECRAWL_BASE_URL, FIRECRAWL_API_KEY_ENV_NAME,
    FIRECRAWL_API_VERSION_SUFFIX, FIRECRAWL_BASE_URL_ENV_NAME, OPENAI_API_KEY_ENV_NAME,
};
use crate::error::GenerateError;

/// Process-wide credential defaults, captured once at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessDefaults {
    pub firecrawl_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub firecrawl_base_url: Option<String>,
}

impl ProcessDefaults {
    /// Snapshots the credential variables of the current process environment.
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        Self {
            firecrawl_api_key: env_value(FIRECRAWL_API_KEY_ENV_NAME),
            openai_api_key: env_value(OPENAI_API_KEY_ENV_NAME),
            firecrawl_base_url: env_value(FIRECRAWL_BASE_URL_ENV_NAME),
        }
    }

    /// Base URL used when a request does not override it.
    pub fn effective_base_url(&self) -> String {
        normalize_base_url(self.firecrawl_base_url.as_deref())
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Credentials a single job is launched with.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub firecrawl_api_key: String,
    pub openai_api_key: String,
    pub firecrawl_base_url: String,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ResolvedCredentials")
            .field("firecrawl_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("firecrawl_base_url", &self.firecrawl_base_url)
            .finish()
    }
}

/// Merges request-supplied values with the process defaults it was built with.
#[derive(Clone, Debug, Default)]
pub struct CredentialResolver {
    defaults: ProcessDefaults,
}

impl CredentialResolver {
    pub fn new(defaults: ProcessDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &ProcessDefaults {
        &self.defaults
    }

    /// Resolves the effective credentials for a request.
    ///
    /// A non-empty request value wins over the process default. The Firecrawl
    /// base URL additionally falls back to the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Credential`] if either API key is empty after resolution.
    pub fn resolve(
        &self,
        request: &GenerationRequest,
    ) -> Result<ResolvedCredentials, GenerateError> {
        let firecrawl_api_key = pick(
            request.firecrawl_api_key.as_deref(),
            self.defaults.firecrawl_api_key.as_deref(),
        );
        let openai_api_key = pick(
            request.openai_api_key.as_deref(),
            self.defaults.openai_api_key.as_deref(),
        );

        let (Some(firecrawl_api_key), Some(openai_api_key)) = (firecrawl_api_key, openai_api_key)
        else {
            return Err(GenerateError::Credential);
        };

        let requested_base_url = request
            .config
            .get(CONFIG_FIRECRAWL_BASE_URL)
            .and_then(serde_json::Value::as_str);
        let firecrawl_base_url = normalize_base_url(pick(
            requested_base_url,
            self.defaults.firecrawl_base_url.as_deref(),
        ));

        debug!(
            "Using Firecrawl key from {}, OpenAI key from {}, base URL {firecrawl_base_url}",
            origin(request.firecrawl_api_key.as_deref()),
            origin(request.openai_api_key.as_deref()),
        );

        Ok(ResolvedCredentials {
            firecrawl_api_key: firecrawl_api_key.to_owned(),
            openai_api_key: openai_api_key.to_owned(),
            firecrawl_base_url,
        })
    }
}

fn pick<'a>(explicit: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    explicit
        .filter(|value| !value.is_empty())
        .or(fallback.filter(|value| !value.is_empty()))
}

fn origin(explicit: Option<&str>) -> &'static str {
    if explicit.is_some_and(|value| !value.is_empty()) {
        "request"
    } else {
        "environment"
    }
}

/// Brings a Firecrawl base URL to the `.../v1` form the generator expects.
pub fn normalize_base_url(url: Option<&str>) -> String {
    let trimmed = url.map(|url| url.trim().trim_end_matches('/')).unwrap_or_default();
    if trimmed.is_empty() {
        return DEFAULT_FIRECRAWL_BASE_URL.to_owned();
    }
    if trimmed.ends_with(FIRECRAWL_API_VERSION_SUFFIX) {
        trimmed.to_owned()
    } else {
        format!("{trimmed}{FIRECRAWL_API_VERSION_SUFFIX}")
    }
}
