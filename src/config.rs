// src/config.rs
//! Configuration surface: environment variables first (the deployment
//! contract), with a TOML file fallback for anything not set in the env.
//! File location: $WATCHER_CONFIG_PATH, then config/watcher.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::scheduler::DEFAULT_INTERVAL_SECS;
use crate::source::SourceDescriptor;

const ENV_CONFIG_PATH: &str = "WATCHER_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/watcher.toml";
const DEFAULT_API_URL: &str = "https://gw.yad2.co.il/realestate-feed/rent/map";
const DEFAULT_DB_PATH: &str = "listings.sqlite";

/// Notification recipient. Display fields are only used in log lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct Subscriber {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Subscriber {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => self.id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub api_url: Url,
    pub sources: Vec<SourceDescriptor>,
    pub subscribers: Vec<Subscriber>,
    pub db_path: PathBuf,
    pub interval: Duration,
}

/// On-disk shape; every field optional so the env can fill the gaps.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bot_token: Option<String>,
    api_url: Option<String>,
    database_path: Option<String>,
    interval_secs: Option<u64>,
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    subscribers: Vec<Subscriber>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let file = load_file_config()?;

        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or(file.bot_token)
            .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN is missing"))?;

        let api_url: Url = std::env::var("API_URL")
            .ok()
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .parse()
            .context("API_URL is not a valid URL")?;

        let url_strings = match std::env::var("URLS") {
            Ok(raw) => parse_url_list(&raw)?,
            Err(_) => file.urls,
        };
        if url_strings.is_empty() {
            return Err(anyhow!("no source URLs configured (URLS env or config file)"));
        }
        let sources = url_strings
            .iter()
            .map(|u| SourceDescriptor::parse(u))
            .collect::<Result<Vec<_>>>()?;

        let subscribers = match std::env::var("USER_DATA") {
            Ok(raw) => parse_subscribers(&raw)?,
            Err(_) => file.subscribers,
        };

        let db_path = std::env::var("DATABASE_PATH")
            .ok()
            .or(file.database_path)
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
            .into();

        let interval_secs = match std::env::var("POLL_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("POLL_INTERVAL_SECS must be an integer")?,
            Err(_) => file.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS),
        };
        if interval_secs == 0 {
            return Err(anyhow!("POLL_INTERVAL_SECS must be positive"));
        }

        Ok(Self {
            bot_token,
            api_url,
            sources,
            subscribers,
            db_path,
            interval: Duration::from_secs(interval_secs),
        })
    }
}

fn load_file_config() -> Result<FileConfig> {
    let path = match std::env::var(ENV_CONFIG_PATH) {
        Ok(p) => {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to a non-existent path"));
            }
            pb
        }
        Err(_) => {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !pb.exists() {
                return Ok(FileConfig::default());
            }
            pb
        }
    };
    parse_file_config(&path)
}

fn parse_file_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// URLS is a JSON array of search URL strings.
fn parse_url_list(raw: &str) -> Result<Vec<String>> {
    let urls: Vec<String> = serde_json::from_str(raw).context("URLS must be a JSON array")?;
    Ok(urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect())
}

/// USER_DATA is a JSON array of subscriber objects, or a single object
/// (both layouts exist in deployed .env files).
fn parse_subscribers(raw: &str) -> Result<Vec<Subscriber>> {
    if let Ok(list) = serde_json::from_str::<Vec<Subscriber>>(raw) {
        return Ok(list);
    }
    let one: Subscriber = serde_json::from_str(raw)
        .context("USER_DATA must be a subscriber object or array of them")?;
    Ok(vec![one])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_list_is_trimmed_and_filtered() {
        let v = parse_url_list(r#"[" https://a.test/1 ", "", "https://a.test/2"]"#).unwrap();
        assert_eq!(v, vec!["https://a.test/1".to_string(), "https://a.test/2".into()]);
    }

    #[test]
    fn subscribers_accept_array_and_single_object() {
        let arr = parse_subscribers(r#"[{"id": 11, "first_name": "Dana"}, {"id": 12}]"#).unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0].display_name(), "Dana");
        assert_eq!(arr[1].display_name(), "12");

        let one = parse_subscribers(r#"{"id": 7, "first_name": "Avi", "last_name": "Levi"}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].display_name(), "Avi Levi");
    }

    #[test]
    fn garbage_user_data_is_an_error() {
        assert!(parse_subscribers("not json").is_err());
    }

    #[test]
    fn file_config_parses_full_toml() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("watcher.toml");
        std::fs::write(
            &p,
            r#"
            bot_token = "123:abc"
            database_path = "/tmp/l.sqlite"
            interval_secs = 120
            urls = ["https://www.yad2.co.il/realestate/rent?city=5000"]

            [[subscribers]]
            id = 42
            first_name = "Noa"
            "#,
        )
        .unwrap();
        let fc = parse_file_config(&p).unwrap();
        assert_eq!(fc.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(fc.interval_secs, Some(120));
        assert_eq!(fc.urls.len(), 1);
        assert_eq!(fc.subscribers[0].id, 42);
    }
}
