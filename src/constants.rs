pub const FIRECRAWL_API_KEY_ENV_NAME: &str = "FIRECRAWL_API_KEY";
pub const OPENAI_API_KEY_ENV_NAME: &str = "OPENAI_API_KEY";
pub const FIRECRAWL_BASE_URL_ENV_NAME: &str = "FIRECRAWL_BASE_URL";

pub const DEFAULT_FIRECRAWL_BASE_URL: &str = "https://api.firecrawl.dev/v1";
pub(crate) const FIRECRAWL_API_VERSION_SUFFIX: &str = "/v1";

/// Request `config` entry that overrides the Firecrawl base URL.
pub const CONFIG_FIRECRAWL_BASE_URL: &str = "firecrawl_base_url";

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SCRIPT_DIR: &str = "fc-py";
pub const DEFAULT_SCRIPT_NAME: &str = "generate-llmstxt.py";
pub const DEFAULT_OUTPUT_DIR: &str = "temp";

pub(crate) const GENERATOR_CONFIG_FILE: &str = "config.yaml";
pub(crate) const FALLBACK_INTERPRETER: &str = "python";

pub(crate) const ARTIFACT_SUFFIX: &str = "-llms.txt";
pub(crate) const FULL_ARTIFACT_SUFFIX: &str = "-llms-full.txt";
pub(crate) const WWW_PREFIX: &str = "www.";

/// Grace period for reaping a killed child and draining its pipes.
pub(crate) const KILL_GRACE_PERIOD_MS: u64 = 2000;

/// Slack on top of the job budget for draining pipes and reading the artifact.
/// Covers the worst case of the kill and both stream joins.
pub const RUN_DEADLINE_SLACK_MS: u64 = 3 * KILL_GRACE_PERIOD_MS;
