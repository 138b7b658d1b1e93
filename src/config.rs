//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::CliOptions;
use crate::constants::DEBUG_CORS_ORIGINS;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("sqlx", LevelFilter::Warn)
            .with_module_level("sea_orm", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Problems turning CLI options into a usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A provider base URL didn't parse.
    #[error("invalid {name}: {source}")]
    InvalidUrl {
        /// Which option was wrong
        name: &'static str,
        /// Parser error
        source: url::ParseError,
    },
    /// A numeric option must be greater than zero.
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
}

/// Free tier settings.
#[derive(Clone, Debug)]
pub struct FreeTierConfig {
    /// Whether the free tier is offered at all
    pub enabled: bool,
    /// Generations per caller per UTC day
    pub daily_limit: u32,
}

/// Per caller, per route request window.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub requests: u32,
    /// Window length
    pub window: Duration,
}

/// Where and how the external generation providers are reached.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Shared Anthropic key for the free tier
    pub anthropic_api_key: Option<String>,
    /// Shared OpenAI key for the free tier
    pub openai_api_key: Option<String>,
    /// Anthropic API base
    pub anthropic_base_url: Url,
    /// OpenAI API base
    pub openai_base_url: Url,
    /// Model used for copy
    pub text_model: String,
    /// Model used for images
    pub image_model: String,
    /// Per request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "***"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("anthropic_base_url", &self.anthropic_base_url.as_str())
            .field("openai_base_url", &self.openai_base_url.as_str())
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Process-wide configuration, built once at startup and handed to the router.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Expose internal error detail and allow localhost origins
    pub debug: bool,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Let paid routes fall back to the shared keys
    pub use_server_keys: bool,
    /// Free tier settings
    pub free_tier: FreeTierConfig,
    /// Request rate limiting
    pub rate_limit: RateLimitConfig,
    /// Provider endpoints and credentials
    pub providers: ProviderConfig,
}

impl AppConfig {
    /// Validates the parsed CLI options and builds the configuration.
    pub fn from_cli(cli: &CliOptions) -> Result<Self, ConfigError> {
        if cli.rate_limit_requests == 0 {
            return Err(ConfigError::NotPositive("rate_limit_requests"));
        }
        if cli.rate_limit_window_seconds == 0 {
            return Err(ConfigError::NotPositive("rate_limit_window_seconds"));
        }
        if cli.provider_timeout_seconds == 0 {
            return Err(ConfigError::NotPositive("provider_timeout_seconds"));
        }

        let anthropic_base_url =
            Url::parse(&cli.anthropic_base_url).map_err(|source| ConfigError::InvalidUrl {
                name: "anthropic_base_url",
                source,
            })?;
        let openai_base_url =
            Url::parse(&cli.openai_base_url).map_err(|source| ConfigError::InvalidUrl {
                name: "openai_base_url",
                source,
            })?;

        Ok(Self {
            debug: cli.debug,
            cors_origins: cors_origins(&cli.frontend_url, cli.debug),
            use_server_keys: cli.use_server_keys,
            free_tier: FreeTierConfig {
                enabled: cli.free_tier_enabled,
                daily_limit: cli.free_tier_daily_limit,
            },
            rate_limit: RateLimitConfig {
                requests: cli.rate_limit_requests,
                window: Duration::from_secs(cli.rate_limit_window_seconds),
            },
            providers: ProviderConfig {
                anthropic_api_key: non_empty(cli.anthropic_api_key.as_deref()),
                openai_api_key: non_empty(cli.openai_api_key.as_deref()),
                anthropic_base_url,
                openai_base_url,
                text_model: cli.text_model.clone(),
                image_model: cli.image_model.clone(),
                timeout: Duration::from_secs(cli.provider_timeout_seconds),
            },
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Splits the comma separated origin list; debug mode adds the local dev servers.
fn cors_origins(frontend_url: &str, debug: bool) -> Vec<String> {
    let mut origins: Vec<String> = frontend_url
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect();
    if debug {
        for origin in DEBUG_CORS_ORIGINS {
            if !origins.iter().any(|existing| existing == origin) {
                origins.push(origin.to_string());
            }
        }
    }
    origins
}
