use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{env, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";
const DEFAULT_AUTO_STOP_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_AUTO_STOP_TICK_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RATE_LIMIT_USER_MAX_REQUESTS: u32 = 100;
const DEFAULT_RATE_LIMIT_USER_WINDOW_SECONDS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub app_env: String,
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
    pub auto_stop_interval_seconds: u64,
    pub auto_stop_tick_timeout_seconds: u64,
    pub rate_limit_user_max_requests: u32,
    pub rate_limit_user_window_seconds: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so parsing can be
    /// exercised without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("AUTH_JWT_SECRET")?;

        let port = parse_or(lookup("PORT"), DEFAULT_PORT);
        let app_env = lookup("APP_ENV")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "development".to_string());

        let allowed_origins = parse_origins(
            lookup("ALLOWED_ORIGINS")
                .as_deref()
                .unwrap_or(DEFAULT_ALLOWED_ORIGINS),
        );

        Ok(Config {
            database_url,
            port,
            app_env,
            jwt_secret,
            allowed_origins,
            auto_stop_interval_seconds: parse_positive_or(
                lookup("AUTO_STOP_INTERVAL_SECONDS"),
                DEFAULT_AUTO_STOP_INTERVAL_SECONDS,
            ),
            auto_stop_tick_timeout_seconds: parse_positive_or(
                lookup("AUTO_STOP_TICK_TIMEOUT_SECONDS"),
                DEFAULT_AUTO_STOP_TICK_TIMEOUT_SECONDS,
            ),
            rate_limit_user_max_requests: parse_or(
                lookup("RATE_LIMIT_USER_MAX_REQUESTS"),
                DEFAULT_RATE_LIMIT_USER_MAX_REQUESTS,
            ),
            rate_limit_user_window_seconds: parse_positive_or(
                lookup("RATE_LIMIT_USER_WINDOW_SECONDS"),
                DEFAULT_RATE_LIMIT_USER_WINDOW_SECONDS,
            ),
        })
    }

    pub fn auto_stop_interval(&self) -> Duration {
        Duration::from_secs(self.auto_stop_interval_seconds)
    }

    pub fn auto_stop_tick_timeout(&self) -> Duration {
        Duration::from_secs(self.auto_stop_tick_timeout_seconds)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_user_window_seconds)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_positive_or(raw: Option<String>, default: u64) -> u64 {
    match parse_or(raw, default) {
        0 => default,
        value => value,
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Masks a secret for logging, keeping only a short prefix.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}****", prefix)
}
