//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "SOCIALMARKET_DEBUG")]
    /// Enable debug logging and expose internal error detail to callers.
    /// Env: SOCIALMARKET_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "8000", env = "SOCIALMARKET_PORT")]
    /// http listener, defaults to `8000`.
    /// Env: SOCIALMARKET_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "SOCIALMARKET_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: SOCIALMARKET_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(
        long,
        default_value = "socialmarket.sqlite",
        env = "SOCIALMARKET_DATABASE_PATH"
    )]
    /// Path to the database file, eg `/data/socialmarket.sqlite`.
    /// Env: SOCIALMARKET_DATABASE_PATH
    pub database_path: String,

    #[clap(
        long,
        default_value = "http://localhost:5173",
        env = "SOCIALMARKET_FRONTEND_URL"
    )]
    /// Comma separated list of origins allowed by CORS.
    /// Env: SOCIALMARKET_FRONTEND_URL
    pub frontend_url: String,

    #[clap(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    /// Shared Anthropic key used by the free tier.
    pub anthropic_api_key: Option<String>,

    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// Shared OpenAI key used by the free tier.
    pub openai_api_key: Option<String>,

    #[clap(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "SOCIALMARKET_FREE_TIER_ENABLED"
    )]
    /// Whether the shared-key free tier is offered at all.
    /// Env: SOCIALMARKET_FREE_TIER_ENABLED
    pub free_tier_enabled: bool,

    #[clap(long, default_value = "5", env = "SOCIALMARKET_FREE_TIER_DAILY_LIMIT")]
    /// Free generations per caller per UTC day.
    /// Env: SOCIALMARKET_FREE_TIER_DAILY_LIMIT
    pub free_tier_daily_limit: u32,

    #[clap(long, default_value = "10", env = "SOCIALMARKET_RATE_LIMIT_REQUESTS")]
    /// Requests allowed per caller per route in one window.
    /// Env: SOCIALMARKET_RATE_LIMIT_REQUESTS
    pub rate_limit_requests: u32,

    #[clap(
        long,
        default_value = "60",
        env = "SOCIALMARKET_RATE_LIMIT_WINDOW_SECONDS"
    )]
    /// Length of the rate limit window.
    /// Env: SOCIALMARKET_RATE_LIMIT_WINDOW_SECONDS
    pub rate_limit_window_seconds: u64,

    #[clap(long, env = "SOCIALMARKET_USE_SERVER_KEYS")]
    /// Fall back to the shared keys when a paid route gets no key header.
    /// Env: SOCIALMARKET_USE_SERVER_KEYS
    pub use_server_keys: bool,

    #[clap(
        long,
        default_value = "https://api.anthropic.com/",
        env = "SOCIALMARKET_ANTHROPIC_BASE_URL"
    )]
    /// Base URL of the Anthropic API.
    pub anthropic_base_url: String,

    #[clap(
        long,
        default_value = "https://api.openai.com/",
        env = "SOCIALMARKET_OPENAI_BASE_URL"
    )]
    /// Base URL of the OpenAI API.
    pub openai_base_url: String,

    #[clap(
        long,
        default_value = crate::constants::DEFAULT_TEXT_MODEL,
        env = "SOCIALMARKET_TEXT_MODEL"
    )]
    /// Text model used for copy generation
    pub text_model: String,

    #[clap(
        long,
        default_value = crate::constants::DEFAULT_IMAGE_MODEL,
        env = "SOCIALMARKET_IMAGE_MODEL"
    )]
    /// Image model
    pub image_model: String,

    #[clap(
        long,
        default_value = "60",
        env = "SOCIALMARKET_PROVIDER_TIMEOUT_SECONDS"
    )]
    /// Timeout for a single provider request.
    pub provider_timeout_seconds: u64,
}
