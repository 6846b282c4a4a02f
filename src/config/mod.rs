use anyhow::{anyhow, Result};
use std::str::FromStr;
use url::Url;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub auth_token: Option<String>,
    pub http_timeout_seconds: u64,
    pub feed_page_size: u32,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let api_base_url = parse_base_url(&env_or_err("API_BASE_URL")?)?;
        let feed_page_size: u32 = env_or_parse("FEED_PAGE_SIZE", "5")?;
        if feed_page_size == 0 {
            return Err(anyhow!("FEED_PAGE_SIZE must be positive"));
        }

        Ok(Self {
            api_base_url,
            auth_token: std::env::var("AUTH_TOKEN").ok(),
            http_timeout_seconds: env_or_parse("HTTP_TIMEOUT_SECONDS", "30")?,
            feed_page_size,
        })
    }
}

// Base URL must end with a slash so endpoint paths join under it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|err| anyhow!("invalid API_BASE_URL: {}", err))
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
