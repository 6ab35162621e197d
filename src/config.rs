use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::service::ReportLocale;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_record_per_min: u32,
    pub rate_query_per_min: u32,

    pub api_prefix: String,
    pub cors_allowed_origins: Vec<String>,
    pub report_locale: ReportLocale,
    pub log_dir: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

/// Comma-separated origin list; blanks are skipped.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,

            rate_record_per_min: parsed_or("RATE_RECORD_PER_MIN", 60)?,
            rate_query_per_min: parsed_or("RATE_QUERY_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            cors_allowed_origins: split_origins(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:4200".to_string()),
            ),
            report_locale: parsed_or("REPORT_LOCALE", ReportLocale::En)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:4200", &["http://localhost:4200"])]
    #[case(" https://a.example , https://b.example,", &["https://a.example", "https://b.example"])]
    #[case("", &[])]
    fn origins_are_split_and_trimmed(#[case] raw: &str, #[case] expected: &[&str]) {
        assert_eq!(split_origins(raw), expected);
    }
}
