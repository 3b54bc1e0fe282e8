use serde::Deserialize;

/// Public sandbox host of the ledger provider.
pub const DEFAULT_LEDGER_BASE_URL: &str = "https://api.sandbox.cuentamono.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Ledger provider API key. Optional at startup: every gateway request
    /// fails with a configuration error while it is absent.
    pub mono_api_key: Option<String>,
    pub mono_base_url: String,
    /// Requests per second allowed per client IP.
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8888".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            mono_api_key: std::env::var("MONO_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            mono_base_url: std::env::var("MONO_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("MONO_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_LEDGER_BASE_URL.to_string()),
            rate_limit_per_second: std::env::var("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_PER_SECOND must be a positive number"))?,
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RATE_LIMIT_BURST must be a positive number"))?,
        };

        // Never log the key itself
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Ledger Base URL: {}", config.mono_base_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.mono_api_key.is_none() {
            tracing::warn!("MONO_API_KEY is not set; every gateway action will fail with 500");
        }

        Ok(config)
    }

    /// Configuration pointing at an arbitrary ledger host, used by tests and
    /// embedding binaries.
    pub fn for_ledger(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            port: 0,
            mono_api_key: api_key,
            mono_base_url: base_url.into(),
            rate_limit_per_second: 10,
            rate_limit_burst: 20,
        }
    }
}
