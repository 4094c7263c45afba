use serde::Deserialize;

/// Main configuration structure for Crawlscope
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Frontier worker and fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent frontier workers
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Per-attempt timeout for page fetches (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Timeout for the accessibility pre-check and robots.txt (seconds)
    #[serde(default = "default_access_check_timeout")]
    pub access_check_timeout_secs: u64,

    /// Total fetch attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts (milliseconds)
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Response bodies are truncated at this many bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Below this many characters the extractor falls back to body text
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fetch_timeout_secs: default_fetch_timeout(),
            access_check_timeout_secs: default_access_check_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            max_body_bytes: default_max_body_bytes(),
            min_content_length: default_min_content_length(),
        }
    }
}

fn default_workers() -> u32 {
    4
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_access_check_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_min_content_length() -> usize {
    50
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Search index backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexConfig {
    /// Base URL of the Elasticsearch-compatible endpoint
    pub base_url: String,

    /// Name of the index documents are written to and searched in
    pub index_name: String,

    /// Pre-shared credential, sent base64-encoded in a Basic auth header
    #[serde(default)]
    pub api_key: String,

    /// Ask the index to refresh after each write
    #[serde(default)]
    pub refresh: bool,

    /// Concurrent indexing submissions
    #[serde(default = "default_submit_workers")]
    pub submit_workers: u32,

    /// Documents that may wait for a submission slot
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_submit_workers() -> u32 {
    4
}

fn default_queue_capacity() -> usize {
    256
}

/// Shared state store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file, or ":memory:" for an in-process store
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./crawlscope.db".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn is_in_memory(&self) -> bool {
        self.database_path == ":memory:"
    }
}
