//! Shared constants/setters for things
//!

/// Header carrying a caller-supplied Anthropic key
pub const X_ANTHROPIC_KEY: &str = "x-anthropic-key";

/// Header carrying a caller-supplied OpenAI key
pub const X_OPENAI_KEY: &str = "x-openai-key";

/// Proxy header used to derive the caller identity.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Default model for copy generation.
pub const DEFAULT_TEXT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Token budget for a single copy generation.
pub const COPY_MAX_TOKENS: u32 = 2048;

/// Character limit used for platforms we don't know about.
pub const DEFAULT_PLATFORM_LIMIT: usize = 500;

/// How much of an unparseable reply is kept as generic copy.
pub const FALLBACK_COPY_CHARS: usize = 500;

/// Platform label used when a brief names no platforms.
pub const GENERAL_PLATFORM: &str = "General";

/// Page size for the campaign list when none is given.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page the campaign list will return.
pub const MAX_PAGE_SIZE: u64 = 50;

/// Tone used when a brief leaves it out.
pub const DEFAULT_TONE: &str = "friendly and professional";

/// Origins always allowed by CORS in debug mode.
pub const DEBUG_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

/// Application name reported by `/`.
pub const APP_NAME: &str = "AI Social Market";

/// Caller identity used when no address can be determined.
pub const UNKNOWN_CALLER: &str = "unknown";

#[cfg(test)]
/// Shared key used in tests
pub const TEST_API_KEY: &str = "sk-test";
