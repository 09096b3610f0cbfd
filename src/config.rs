use crate::errors::HarvestError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Placeholder substituted with the mirror number in `host_template`
pub const HOST_PLACEHOLDER: &str = "{n}";
/// Placeholder substituted with the page index in `api_path_template`
pub const PAGE_PLACEHOLDER: &str = "{page}";

pub const DEFAULT_RANGE_START: u32 = 45;
pub const DEFAULT_RANGE_END: u32 = 100;
pub const DEFAULT_OUTPUT: &str = "rectv_filmler_guncel.m3u";
pub const DEFAULT_USER_AGENT: &str = "okhttp/4.12.0";
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
pub const DEFAULT_HOST_TEMPLATE: &str = "https://m.prectv{n}.sbs";
pub const DEFAULT_API_PATH_TEMPLATE: &str = "/api/movie/by/filtres/0/created/{page}/4F5A9C3D9A86FA54EACEDDD635185/c3c5bd17-e37b-4b94-a944-8a3688a30452";
pub const DEFAULT_PROXY_BASE: &str = "https://1.nejyoner19.workers.dev/";
pub const DEFAULT_REFERRER: &str = "https://twitter.com";
pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_PAGE_RETRIES: u32 = 1;

/// How the prober decides a mirror is worth paginating
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProbePolicy {
    /// Page 0 must contain at least one playable `.m3u8` source
    #[default]
    FirstUsableLink,
    /// Any 200 response with a JSON body is good enough
    FirstReachable,
}

/// How many entries one catalog item may contribute
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LinkPolicy {
    /// Only the first playable source (one entry per movie)
    #[default]
    FirstPerItem,
    /// Every playable source, e.g. one entry per quality
    AllSources,
}

impl ProbePolicy {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProbePolicy::FirstUsableLink => "first usable link",
            ProbePolicy::FirstReachable => "first reachable",
        }
    }
}

impl LinkPolicy {
    pub fn display_name(&self) -> &'static str {
        match self {
            LinkPolicy::FirstPerItem => "first source per item",
            LinkPolicy::AllSources => "all sources",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HarvestConfig {
    pub range_start: u32,
    pub range_end: u32,
    pub output_filename: String,
    pub user_agent: String,
    /// Per-request timeout, fractions allowed
    pub timeout_seconds: f64,
    pub host_template: String,
    pub api_path_template: String,
    pub proxy_base: String,
    pub referrer: String,
    pub fallback_category: String,
    pub probe_policy: ProbePolicy,
    pub link_policy: LinkPolicy,
    /// Extra attempts per page after a transport failure
    pub page_retries: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            range_start: DEFAULT_RANGE_START,
            range_end: DEFAULT_RANGE_END,
            output_filename: DEFAULT_OUTPUT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            host_template: DEFAULT_HOST_TEMPLATE.to_string(),
            api_path_template: DEFAULT_API_PATH_TEMPLATE.to_string(),
            proxy_base: DEFAULT_PROXY_BASE.to_string(),
            referrer: DEFAULT_REFERRER.to_string(),
            fallback_category: DEFAULT_CATEGORY.to_string(),
            probe_policy: ProbePolicy::default(),
            link_policy: LinkPolicy::default(),
            page_retries: DEFAULT_PAGE_RETRIES,
        }
    }
}

impl HarvestConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `config.json` in the
    /// platform config directory is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, HarvestError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        if let Some(proj_dirs) = ProjectDirs::from("com", "rectv", "rectv-harvest") {
            let config_path = proj_dirs.config_dir().join("config.json");
            if config_path.exists() {
                tracing::debug!("Loading config from {}", config_path.display());
                return Self::from_file(&config_path);
            }
        }
        Ok(HarvestConfig::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, HarvestError> {
        let content = fs::read_to_string(path).map_err(|source| HarvestError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| HarvestError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.range_start > self.range_end {
            return Err(HarvestError::Config(format!(
                "range start {} is greater than range end {}",
                self.range_start, self.range_end
            )));
        }
        if !self.host_template.contains(HOST_PLACEHOLDER) {
            return Err(HarvestError::Config(format!(
                "host template '{}' has no {} placeholder",
                self.host_template, HOST_PLACEHOLDER
            )));
        }
        if !self.api_path_template.contains(PAGE_PLACEHOLDER) {
            return Err(HarvestError::Config(format!(
                "API path template has no {} placeholder",
                PAGE_PLACEHOLDER
            )));
        }
        if !self.timeout_seconds.is_finite()
            || self.timeout_seconds <= 0.0
            || Duration::try_from_secs_f64(self.timeout_seconds).is_err()
        {
            return Err(HarvestError::Config(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout_seconds
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(HarvestError::Config("user agent must not be empty".into()));
        }
        if self.output_filename.trim().is_empty() {
            return Err(HarvestError::Config("output filename must not be empty".into()));
        }
        Ok(())
    }

    /// Request timeout; out-of-range values fall back to the default and
    /// are rejected by `validate` anyway.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// Base URL of mirror number `n`, without trailing slash
    pub fn host_for(&self, n: u32) -> String {
        self.host_template
            .replace(HOST_PLACEHOLDER, &n.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn page_url(&self, host: &str, page: u32) -> String {
        format!(
            "{}{}",
            host,
            self.api_path_template
                .replace(PAGE_PLACEHOLDER, &page.to_string())
        )
    }
}
