//! Copy generation through the Anthropic Messages API.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use super::{Provider, ProviderError};
use crate::brief::{CampaignBrief, PlatformCopy};
use crate::constants::{
    ANTHROPIC_VERSION, COPY_MAX_TOKENS, DEFAULT_PLATFORM_LIMIT, FALLBACK_COPY_CHARS,
    GENERAL_PLATFORM,
};

const IMAGE_PROMPT_OPEN: &str = "[IMAGE_PROMPT]";
const IMAGE_PROMPT_CLOSE: &str = "[/IMAGE_PROMPT]";
const COPY_OPEN: &str = "[COPY]";
const COPY_CLOSE: &str = "[/COPY]";

/// Character limit the prompt asks for on each platform.
pub fn platform_limit(platform: &str) -> usize {
    match platform {
        "Instagram" => 2200,
        "Facebook" => 500,
        "LinkedIn" => 700,
        "X" => 280,
        "TikTok" => 300,
        _ => DEFAULT_PLATFORM_LIMIT,
    }
}

fn yes_no(flag: bool, yes: &str) -> String {
    if flag {
        format!("Yes - {yes}")
    } else {
        "No".to_string()
    }
}

/// Renders the instruction sent to the text model for `brief`.
pub fn build_prompt(brief: &CampaignBrief) -> String {
    let mut platforms = String::new();
    for platform in &brief.platforms {
        let _ = writeln!(
            platforms,
            "- {platform}: Maximum {} characters",
            platform_limit(platform)
        );
    }

    let seasonal = match brief.seasonal_hook() {
        Some(hook) => format!(
            "\nSeasonal/Event Hook: {hook}\n\
             - Incorporate this seasonal element naturally into the copy\n\
             - Reference relevant UK cultural context if applicable\n"
        ),
        None => String::new(),
    };

    format!(
        r#"You are an expert UK social media marketing copywriter. Generate engaging social media copy for a British small business.

IMPORTANT: You MUST write in British English. Use British spelling (colour, favourite, organise, centre, theatre, behaviour, programme, travelled, catalogue, defence, licence, practise, cheque, grey, tyre, aluminium, jewellery, mum, whilst, amongst).

## Business Details
- Business Name: {business_name}
- Business Type: {business_type}
- Target Audience: {target_audience}

## Campaign Information
- Campaign Goal: {campaign_goal}
- Key Messages: {key_messages}
- Desired Tone: {tone}
{seasonal}
## Content Requirements
- Include hashtags: {hashtags}
- Include emojis: {emoji}

## Platforms and Limits
Generate copy for each platform, respecting character limits:
{platforms}
## Output Format
For each platform, provide:
1. The platform name
2. The complete copy (ready to post)
3. Ensure British spelling throughout

Also provide an image generation prompt that would create an appropriate promotional image for this campaign. The prompt should:
- Describe a professional marketing image
- Match the brand tone
- Be suitable for UK audiences
- NOT include any text in the image (text will be added separately)

Respond in this exact format for each platform:

[PLATFORM: platform_name]
[COPY]
Your generated copy here...
[/COPY]

[IMAGE_PROMPT]
Your image prompt here...
[/IMAGE_PROMPT]
"#,
        business_name = brief.business_name.trim(),
        business_type = brief.business_type.trim(),
        target_audience = brief.target_audience.trim(),
        campaign_goal = brief.campaign_goal.trim(),
        key_messages = brief.key_messages.trim(),
        tone = brief.tone.trim(),
        hashtags = yes_no(brief.include_hashtags, "add relevant UK-focused hashtags"),
        emoji = yes_no(brief.include_emoji, "use sparingly and appropriately"),
    )
}

/// Blocks recovered from a model reply, before fallbacks are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedReply {
    /// Copy blocks for the requested platforms that were found
    pub copies: Vec<PlatformCopy>,
    /// Image prompt, when the reply had a non-empty one
    pub image_prompt: Option<String>,
}

/// Pulls the platform blocks and image prompt out of a reply.
///
/// Platforms whose markers are missing or malformed are skipped.
pub fn parse_reply(reply: &str, platforms: &[String]) -> ParsedReply {
    let image_prompt = reply.find(IMAGE_PROMPT_OPEN).and_then(|open| {
        let start = open + IMAGE_PROMPT_OPEN.len();
        let end = reply.find(IMAGE_PROMPT_CLOSE)?;
        (end > start)
            .then(|| reply[start..end].trim().to_string())
            .filter(|prompt| !prompt.is_empty())
    });

    let copies = platforms
        .iter()
        .filter_map(|platform| {
            let marker = format!("[PLATFORM: {platform}]");
            let section = &reply[reply.find(&marker)?..];
            let start = section.find(COPY_OPEN)? + COPY_OPEN.len();
            let end = section.find(COPY_CLOSE)?;
            (end > start).then(|| PlatformCopy::new(platform.clone(), section[start..end].trim()))
        })
        .collect();

    ParsedReply {
        copies,
        image_prompt,
    }
}

/// Copy blocks plus the prompt for the image step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedCopy {
    /// One block per platform found, never empty
    pub copies: Vec<PlatformCopy>,
    /// Never empty
    pub image_prompt: String,
}

/// Prompt used when the model didn't give us one.
pub fn fallback_image_prompt(brief: &CampaignBrief) -> String {
    format!(
        "Professional marketing photograph for {}, {} style, suitable for UK audience, no text",
        brief.business_type.trim(),
        brief.tone.trim()
    )
}

/// Parses `reply` and fills in whatever is missing so there is always at least
/// one copy block and an image prompt.
pub fn interpret_reply(reply: &str, brief: &CampaignBrief) -> GeneratedCopy {
    let parsed = parse_reply(reply, &brief.platforms);

    let copies = if parsed.copies.is_empty() {
        debug!("no platform blocks in reply, keeping raw text");
        let platform = brief
            .platforms
            .first()
            .map(String::as_str)
            .unwrap_or(GENERAL_PLATFORM);
        let raw: String = reply.chars().take(FALLBACK_COPY_CHARS).collect();
        vec![PlatformCopy::new(platform, raw)]
    } else {
        parsed.copies
    };

    let image_prompt = parsed
        .image_prompt
        .unwrap_or_else(|| fallback_image_prompt(brief));

    GeneratedCopy {
        copies,
        image_prompt,
    }
}

#[derive(Serialize, Debug)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize, Debug)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Talks to the text model.
#[derive(Clone, Debug)]
pub struct CopyGenerator {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl CopyGenerator {
    /// `base_url` is the API root, eg `https://api.anthropic.com/`.
    pub fn new(
        client: reqwest::Client,
        base_url: &Url,
        model: &str,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            endpoint: base_url.join("v1/messages")?,
            model: model.to_string(),
        })
    }

    /// Generates copy for `brief` using `api_key`.
    #[instrument(level = "debug", skip_all, fields(business = %brief.business_name))]
    pub async fn generate(
        &self,
        brief: &CampaignBrief,
        api_key: &str,
    ) -> Result<GeneratedCopy, ProviderError> {
        let prompt = build_prompt(brief);
        let reply = self.complete(&prompt, api_key).await?;
        Ok(interpret_reply(&reply, brief))
    }

    async fn complete(&self, prompt: &str, api_key: &str) -> Result<String, ProviderError> {
        let provider = Provider::Anthropic;
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: COPY_MAX_TOKENS,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| ProviderError::from_transport(provider, &err))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| ProviderError::from_transport(provider, &err))?;
        if !status.is_success() {
            return Err(ProviderError::from_status(provider, status, &bytes));
        }

        let parsed: MessagesResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ProviderError::malformed(provider, err))?;
        parsed
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .ok_or_else(|| ProviderError::malformed(provider, "no text content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::tests::sample_brief;

    fn platforms(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    const WELL_FORMED: &str = "Here you go!\n\n\
        [PLATFORM: Instagram]\n[COPY]\n  Spring has sprung at the bakery 🌸  \n[/COPY]\n\n\
        [PLATFORM: X]\n[COPY]\nAfternoon tea is back. Book now.\n[/COPY]\n\n\
        [IMAGE_PROMPT]\nA sunlit table with scones and tea\n[/IMAGE_PROMPT]\n";

    #[test]
    fn parses_each_requested_platform() {
        let parsed = parse_reply(WELL_FORMED, &platforms(&["Instagram", "X"]));

        assert_eq!(parsed.copies.len(), 2);
        assert_eq!(parsed.copies[0].platform, "Instagram");
        assert_eq!(parsed.copies[0].copy, "Spring has sprung at the bakery 🌸");
        assert_eq!(
            parsed.copies[0].character_count,
            "Spring has sprung at the bakery 🌸".chars().count()
        );
        assert_eq!(parsed.copies[1].platform, "X");
        assert_eq!(parsed.copies[1].character_count, 32);
        assert_eq!(
            parsed.image_prompt.as_deref(),
            Some("A sunlit table with scones and tea")
        );
    }

    #[test]
    fn missing_platforms_are_skipped() {
        let parsed = parse_reply(WELL_FORMED, &platforms(&["LinkedIn", "X"]));
        assert_eq!(parsed.copies.len(), 1);
        assert_eq!(parsed.copies[0].platform, "X");
    }

    #[test]
    fn unclosed_copy_block_is_skipped() {
        let reply = "[PLATFORM: X]\n[COPY]\nnever closed";
        assert!(parse_reply(reply, &platforms(&["X"])).copies.is_empty());
    }

    #[test]
    fn empty_image_prompt_counts_as_missing() {
        let reply = "[IMAGE_PROMPT]   [/IMAGE_PROMPT]";
        assert_eq!(parse_reply(reply, &[]).image_prompt, None);
    }

    #[test]
    fn unmarked_reply_falls_back_to_raw_text() {
        let brief = sample_brief();
        let reply = "a".repeat(800);

        let generated = interpret_reply(&reply, &brief);
        assert_eq!(generated.copies.len(), 1);
        assert_eq!(generated.copies[0].platform, "Facebook");
        assert_eq!(generated.copies[0].character_count, 500);
        assert_eq!(generated.image_prompt, fallback_image_prompt(&brief));
        assert!(!generated.image_prompt.is_empty());
    }

    #[test]
    fn fallback_without_platforms_is_general() {
        let mut brief = sample_brief();
        brief.platforms.clear();
        let generated = interpret_reply("just some words", &brief);
        assert_eq!(generated.copies[0].platform, GENERAL_PLATFORM);
        assert_eq!(generated.copies[0].copy, "just some words");
    }

    #[test]
    fn prompt_mentions_limits_and_flags() {
        let mut brief = sample_brief();
        brief.platforms = platforms(&["X", "Mastodon"]);
        brief.seasonal_hook = Some("Easter".to_string());

        let prompt = build_prompt(&brief);
        assert!(prompt.contains("- X: Maximum 280 characters"));
        assert!(prompt.contains("- Mastodon: Maximum 500 characters"));
        assert!(prompt.contains("Include hashtags: No"));
        assert!(prompt.contains("Include emojis: Yes - use sparingly"));
        assert!(prompt.contains("Seasonal/Event Hook: Easter"));
        assert!(prompt.contains("- Business Name: The Corner Bakery"));
    }

    #[test]
    fn prompt_omits_blank_seasonal_hook() {
        let mut brief = sample_brief();
        brief.seasonal_hook = Some(" ".to_string());
        assert!(!build_prompt(&brief).contains("Seasonal/Event Hook"));
    }

    mod http {
        use super::super::*;
        use super::WELL_FORMED;
        use crate::brief::tests::sample_brief;
        use crate::constants::TEST_API_KEY;
        use crate::providers::mock;
        use axum::http::{HeaderMap, StatusCode};
        use axum::routing::post;
        use axum::{Json, Router};
        use serde_json::Value;
        use std::time::Duration;

        async fn messages(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            let key = headers.get("x-api-key").and_then(|value| value.to_str().ok());
            if key != Some(TEST_API_KEY) {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(mock::provider_error("invalid x-api-key")),
                );
            }
            if headers.get("anthropic-version").is_none()
                || body["max_tokens"] != 2048
                || body["messages"][0]["role"] != "user"
            {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(mock::provider_error("malformed request")),
                );
            }
            (StatusCode::OK, Json(mock::anthropic_reply(WELL_FORMED)))
        }

        async fn generator(base: &url::Url) -> CopyGenerator {
            let client = crate::providers::http_client(Duration::from_secs(5)).expect("client");
            CopyGenerator::new(client, base, "test-model").expect("generator")
        }

        #[tokio::test]
        async fn generates_from_provider_reply() {
            let base = mock::serve(Router::new().route("/v1/messages", post(messages))).await;
            let mut brief = sample_brief();
            brief.platforms = vec!["Instagram".to_string(), "X".to_string()];

            let generated = generator(&base)
                .await
                .generate(&brief, TEST_API_KEY)
                .await
                .expect("generate");
            assert_eq!(generated.copies.len(), 2);
            assert_eq!(generated.image_prompt, "A sunlit table with scones and tea");
        }

        #[tokio::test]
        async fn rejected_key_is_authentication_error() {
            let base = mock::serve(Router::new().route("/v1/messages", post(messages))).await;
            let err = generator(&base)
                .await
                .generate(&sample_brief(), "sk-wrong")
                .await
                .expect_err("should fail");
            assert!(matches!(
                err,
                ProviderError::Authentication {
                    provider: Provider::Anthropic
                }
            ));
        }

        #[tokio::test]
        async fn throttling_and_server_errors_are_classified() {
            let router = Router::new()
                .route(
                    "/throttled/v1/messages",
                    post(|| async {
                        (
                            StatusCode::TOO_MANY_REQUESTS,
                            Json(mock::provider_error("slow down")),
                        )
                    }),
                )
                .route(
                    "/broken/v1/messages",
                    post(|| async {
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(mock::provider_error("Overloaded")),
                        )
                    }),
                );
            let base = mock::serve(router).await;

            let throttled = base.join("throttled/").expect("url");
            let err = generator(&throttled)
                .await
                .generate(&sample_brief(), TEST_API_KEY)
                .await
                .expect_err("should fail");
            assert!(matches!(err, ProviderError::RateLimited { .. }));

            let broken = base.join("broken/").expect("url");
            let err = generator(&broken)
                .await
                .generate(&sample_brief(), TEST_API_KEY)
                .await
                .expect_err("should fail");
            assert!(matches!(err, ProviderError::Api { .. }));
            assert!(err.to_string().contains("Overloaded"));
        }

        #[tokio::test]
        async fn unreachable_provider_is_connectivity_error() {
            let base = mock::closed_port().await;
            let err = generator(&base)
                .await
                .generate(&sample_brief(), TEST_API_KEY)
                .await
                .expect_err("should fail");
            assert!(matches!(err, ProviderError::Unreachable { .. }));
        }
    }

    #[test]
    fn platform_limits_default_to_500() {
        assert_eq!(platform_limit("Instagram"), 2200);
        assert_eq!(platform_limit("LinkedIn"), 700);
        assert_eq!(platform_limit("instagram"), DEFAULT_PLATFORM_LIMIT);
    }
}
