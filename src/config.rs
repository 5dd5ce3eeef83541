use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use chrono::Duration;
use serde::Deserialize;

use crate::aggregator::{AggregateOptions, DEFAULT_PAGE_SIZE};
use crate::cms::source::{BLOG_POST_FILTER, NEWEST_FIRST};
use crate::view::{ViewDefaults, DEFAULT_CARD_TAG_LIMIT, DEFAULT_EXCERPT_LENGTH, DEFAULT_FALLBACK_MONTH, DEFAULT_FALLBACK_YEAR, DEFAULT_WORDS_PER_MINUTE};

fn default_filter() -> String { BLOG_POST_FILTER.to_string() }
fn default_order_by() -> String { NEWEST_FIRST.to_string() }
fn default_true() -> bool { true }
fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }
fn default_timeout_secs() -> u64 { 30 }
fn default_fallback_year() -> i32 { DEFAULT_FALLBACK_YEAR }
fn default_fallback_month() -> String { DEFAULT_FALLBACK_MONTH.to_string() }
fn default_words_per_minute() -> usize { DEFAULT_WORDS_PER_MINUTE }
fn default_card_tag_limit() -> usize { DEFAULT_CARD_TAG_LIMIT }
fn default_excerpt_length() -> usize { DEFAULT_EXCERPT_LENGTH }
fn default_latest_count() -> usize { 2 }
fn default_cache_secs() -> u64 { 3600 }

#[derive(Deserialize, Debug)]
pub struct Cms {
    pub base_url: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default = "default_true")]
    pub personalize: bool,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub dedupe_by_guid: bool,
}

#[derive(Deserialize, Debug)]
pub struct Defaults {
    #[serde(default = "default_fallback_year")]
    pub fallback_year: i32,
    #[serde(default = "default_fallback_month")]
    pub fallback_month: String,
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: usize,
    #[serde(default = "default_card_tag_limit")]
    pub card_tag_limit: usize,
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,
    #[serde(default = "default_latest_count")]
    pub latest_count: usize,
    /// Freshness window of the aggregated post list. Zero disables caching.
    #[serde(default = "default_cache_secs")]
    pub cache_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            fallback_year: default_fallback_year(),
            fallback_month: default_fallback_month(),
            words_per_minute: default_words_per_minute(),
            card_tag_limit: default_card_tag_limit(),
            excerpt_length: default_excerpt_length(),
            latest_count: default_latest_count(),
            cache_secs: default_cache_secs(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize, Debug)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub cms: Cms,
    #[serde(default)]
    pub defaults: Defaults,
    pub server: Server,
    pub log: Option<Log>,
}

impl Cms {
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            page_size: self.page_size,
            dedupe_by_guid: self.dedupe_by_guid,
        }
    }
}

impl Defaults {
    pub fn view_defaults(&self) -> ViewDefaults {
        ViewDefaults {
            fallback_year: self.fallback_year,
            fallback_month: self.fallback_month.clone(),
            words_per_minute: self.words_per_minute,
            card_tag_limit: self.card_tag_limit,
            excerpt_length: self.excerpt_length,
        }
    }

    /// `cache_secs` as a duration, None when chrono cannot represent it.
    pub fn cache_window(&self) -> Option<Duration> {
        i64::try_from(self.cache_secs).ok().and_then(Duration::try_seconds)
    }
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    let Some(str_path) = path.to_str() else {
        return Ok(path);
    };

    if str_path.starts_with("${exe_dir}") {
        let cur_exe = env::current_exe()?;
        let exe_dir = cur_exe.parent()
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Executable has no parent directory"))?;
        Ok(PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())))
    } else {
        Ok(path)
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    if cfg.cms.base_url.trim().is_empty() {
        return Err(io::Error::new(ErrorKind::InvalidData, "cms.base_url must not be empty"));
    }

    if cfg.defaults.cache_window().is_none() {
        return Err(io::Error::new(
            ErrorKind::InvalidData, format!("defaults.cache_secs is out of range: {}", cfg.defaults.cache_secs)));
    }

    if let Some(ref mut log) = cfg.log {
        if let Some(location) = log.location.take() {
            log.location = Some(parse_path(location)?);
        }
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}
