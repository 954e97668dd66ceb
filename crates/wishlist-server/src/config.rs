use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use wishlist_api::mail::HttpMailConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
    "secret",
];

#[derive(Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// `None` means codes are logged rather than mailed.
    pub mail: Option<HttpMailConfig>,
    pub strict_interest: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("WISHLIST_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("WISHLIST_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let port = match var("WISHLIST_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("WISHLIST_PORT is not a port number: {}", raw))?,
            None => 3000,
        };

        let strict_interest = match var("WISHLIST_STRICT_INTEREST").as_deref() {
            None | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => bail!("WISHLIST_STRICT_INTEREST must be true or false, got {}", other),
        };

        let mail = match (
            var("WISHLIST_MAIL_ENDPOINT"),
            var("WISHLIST_MAIL_API_KEY"),
            var("WISHLIST_MAIL_SENDER"),
        ) {
            (Some(endpoint), Some(api_key), Some(sender)) => Some(HttpMailConfig {
                endpoint,
                api_key,
                sender,
            }),
            (None, None, None) => None,
            _ => bail!(
                "WISHLIST_MAIL_ENDPOINT, WISHLIST_MAIL_API_KEY and WISHLIST_MAIL_SENDER must be set together"
            ),
        };

        Ok(Self {
            jwt_secret,
            db_path: var("WISHLIST_DB_PATH")
                .unwrap_or_else(|| "wishlist.db".into())
                .into(),
            host: var("WISHLIST_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            mail,
            strict_interest,
        })
    }
}
