use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("cover letter file {0} is empty")]
    EmptyCoverLetter(PathBuf),
}

/// Settings of a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub apply: ApplyConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Stop after this many successful applications
    #[serde(default = "default_max_applies")]
    pub max_applies: usize,

    /// Seen listings older than this are forgotten at startup (0 keeps them forever)
    #[serde(default = "default_seen_ttl_days")]
    pub seen_ttl_days: u32,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: PathBuf,

    #[serde(default = "default_vacancies_csv")]
    pub vacancies_csv: PathBuf,

    #[serde(default = "default_cover_letter_path")]
    pub cover_letter_path: PathBuf,

    #[serde(default)]
    pub verbose: bool,
}

/// What to search for and how far to page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_search_query")]
    pub query: String,

    #[serde(default)]
    pub region_ids: Vec<String>,

    #[serde(default)]
    pub remote_only: bool,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Consecutive result pages without links before the search stops
    #[serde(default = "default_empty_pages_tolerance")]
    pub empty_pages_tolerance: usize,
}

/// Behaviour of the per-listing application workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyConfig {
    /// Fragment of the resume title to select, matched case-insensitively
    #[serde(default = "default_resume_match")]
    pub resume_match: String,

    #[serde(default = "default_true")]
    pub fail_if_resume_not_found: bool,

    #[serde(default = "default_true")]
    pub require_cover_letter: bool,

    #[serde(default)]
    pub timings: Timings,
}

/// Pacing of browser interactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    /// Lower bound of the pause between human-paced actions, in seconds
    #[serde(default = "default_min_sleep")]
    pub min_sleep: f64,

    /// Upper bound of the pause between human-paced actions, in seconds
    #[serde(default = "default_max_sleep")]
    pub max_sleep: f64,

    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
}

/// WebDriver session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Chrome profile directory keeping the logged-in session between runs
    #[serde(default = "default_persist_dir")]
    pub persist_dir: String,

    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Optional per-listing cover letter generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Prompt template containing a `{job_description}` placeholder
    #[serde(default = "default_ai_prompt_path")]
    pub prompt_path: PathBuf,

    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_applies() -> usize {
    200
}

fn default_seen_ttl_days() -> u32 {
    14
}

fn default_db_path() -> PathBuf {
    PathBuf::from("hh_seen.sqlite")
}

fn default_screenshots_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_vacancies_csv() -> PathBuf {
    PathBuf::from("vacancies.csv")
}

fn default_cover_letter_path() -> PathBuf {
    PathBuf::from("cover_letter.txt")
}

fn default_base_url() -> String {
    "https://hh.ru".to_string()
}

fn default_search_query() -> String {
    "python".to_string()
}

fn default_max_pages() -> usize {
    100
}

fn default_empty_pages_tolerance() -> usize {
    3
}

fn default_resume_match() -> String {
    "python разработчик".to_string()
}

fn default_min_sleep() -> f64 {
    3.0
}

fn default_max_sleep() -> f64 {
    7.0
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_persist_dir() -> String {
    ".hh_user".to_string()
}

fn default_window_width() -> u32 {
    1366
}

fn default_window_height() -> u32 {
    900
}

fn default_ai_model() -> String {
    "mistralai/mistral-7b-instruct:free".to_string()
}

fn default_ai_prompt_path() -> PathBuf {
    PathBuf::from("prompt.txt")
}

fn default_ai_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    60
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            query: default_search_query(),
            region_ids: Vec::new(),
            remote_only: false,
            max_pages: default_max_pages(),
            empty_pages_tolerance: default_empty_pages_tolerance(),
        }
    }
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            resume_match: default_resume_match(),
            fail_if_resume_not_found: true,
            require_cover_letter: true,
            timings: Timings::default(),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            min_sleep: default_min_sleep(),
            max_sleep: default_max_sleep(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
        }
    }
}

impl Timings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            persist_dir: default_persist_dir(),
            headless: false,
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: default_ai_model(),
            prompt_path: default_ai_prompt_path(),
            endpoint: default_ai_endpoint(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            apply: ApplyConfig::default(),
            browser: BrowserConfig::default(),
            generator: GeneratorConfig::default(),
            max_applies: default_max_applies(),
            seen_ttl_days: default_seen_ttl_days(),
            db_path: default_db_path(),
            screenshots_dir: default_screenshots_dir(),
            vacancies_csv: default_vacancies_csv(),
            cover_letter_path: default_cover_letter_path(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build configuration from `HH_*` environment variables, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(query) = get("HH_SEARCH_QUERY") {
            cfg.search.query = query.trim().to_string();
        }
        if let Some(regions) = get("HH_REGION_IDS") {
            cfg.search.region_ids = regions
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("HH_REMOTE_ONLY") {
            cfg.search.remote_only = parse_flag(&v);
        }
        if let Some(v) = get("HH_MAX_PAGES") {
            cfg.search.max_pages = parse_value("HH_MAX_PAGES", &v)?;
        }
        if let Some(v) = get("HH_MAX_APPLIES") {
            cfg.max_applies = parse_value("HH_MAX_APPLIES", &v)?;
        }
        if let Some(v) = get("HH_MIN_SLEEP") {
            cfg.apply.timings.min_sleep = parse_value("HH_MIN_SLEEP", &v)?;
        }
        if let Some(v) = get("HH_MAX_SLEEP") {
            cfg.apply.timings.max_sleep = parse_value("HH_MAX_SLEEP", &v)?;
        }
        if let Some(v) = get("HH_PERSIST_DIR") {
            cfg.browser.persist_dir = v;
        }
        if let Some(v) = get("WEBDRIVER_URL") {
            cfg.browser.webdriver_url = v;
        }
        if let Some(v) = get("HH_SCREENSHOTS_DIR") {
            cfg.screenshots_dir = PathBuf::from(v);
        }
        if let Some(v) = get("HH_DB_PATH") {
            cfg.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("HH_SEEN_TTL_DAYS") {
            cfg.seen_ttl_days = parse_value("HH_SEEN_TTL_DAYS", &v)?;
        }
        if let Some(v) = get("HH_RESUME_TITLE_MATCH") {
            cfg.apply.resume_match = v.trim().to_lowercase();
        }
        if let Some(v) = get("HH_FAIL_IF_RESUME_NOT_FOUND") {
            cfg.apply.fail_if_resume_not_found = parse_flag(&v);
        }
        if let Some(v) = get("HH_REQUIRE_COVER_LETTER") {
            cfg.apply.require_cover_letter = parse_flag(&v);
        }
        if let Some(v) = get("HH_VACANCIES_CSV").or_else(|| get("HH_COMPANIES_CSV")) {
            cfg.vacancies_csv = PathBuf::from(v);
        }
        if let Some(v) = get("HH_COVER_LETTER_PATH") {
            cfg.cover_letter_path = PathBuf::from(v);
        }
        if let Some(v) = get("HH_USE_AI_COVER_LETTER") {
            cfg.generator.enabled = parse_flag(&v);
        }
        cfg.generator.api_key = get("OPENROUTER_API_KEY");
        if let Some(v) = get("HH_AI_MODEL") {
            cfg.generator.model = v;
        }
        if let Some(v) = get("HH_AI_PROMPT_PATH") {
            cfg.generator.prompt_path = PathBuf::from(v);
        }

        Ok(cfg)
    }

    /// Reads the static cover letter. A missing or blank file is a configuration error.
    pub fn read_cover_letter(&self) -> Result<String, ConfigError> {
        let text = std::fs::read_to_string(&self.cover_letter_path).map_err(|source| {
            ConfigError::Io {
                path: self.cover_letter_path.clone(),
                source,
            }
        })?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ConfigError::EmptyCoverLetter(self.cover_letter_path.clone()));
        }
        Ok(text.to_string())
    }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
