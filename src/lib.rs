//! The llmstxt-gateway library runs an external llms.txt generator for a website and
//! hands back the file it produced.
//!
//! A request flows through credential resolution, output directory preparation, the
//! generator job itself, artifact retrieval and cleanup. The job sits behind the
//! [`job::JobRunner`] trait so the process boundary can be replaced in tests.

pub mod constants;
pub mod credentials;
pub mod error;
pub mod generate;
pub mod job;
pub mod launcher;
pub mod retrieve;
pub mod server;
pub mod workspace;

use serde::{Deserialize, Deserializer};

/// A request to generate `llms.txt` for one website.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Target website. A missing scheme is read as `https://`.
    pub url: String,
    #[serde(default)]
    pub firecrawl_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Generator tunables. Only `firecrawl_base_url` is interpreted here. `null` reads
    /// as an empty map.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config: serde_json::Map<String, serde_json::Value>,
}

fn null_as_empty<'de, D>(
    deserializer: D,
) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("GenerationRequest")
            .field("url", &self.url)
            .field("firecrawl_api_key", &self.firecrawl_api_key.is_some())
            .field("openai_api_key", &self.openai_api_key.is_some())
            .field("config", &self.config)
            .finish()
    }
}

pub use credentials::{CredentialResolver, ProcessDefaults, ResolvedCredentials};
pub use error::GenerateError;
pub use generate::Generator;
pub use job::{JobInvocation, JobResult, JobRunner, ProcessJobRunner};
pub use launcher::GeneratorConfig;
pub use workspace::artifact_domain;
