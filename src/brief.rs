//! Campaign briefs and the copy generated for them.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::DEFAULT_TONE;

/// A request to generate social media copy for one business.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CampaignBrief {
    /// Name of the business
    pub business_name: String,
    /// Type of business or industry
    pub business_type: String,
    /// Who the campaign is aimed at
    pub target_audience: String,
    /// What the campaign should achieve
    pub campaign_goal: String,
    /// Points the copy has to mention
    pub key_messages: String,
    /// Desired tone of voice
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Platforms to write copy for, in output order, trimmed on the way in
    #[serde(
        default = "default_platforms",
        deserialize_with = "trimmed_platforms"
    )]
    pub platforms: Vec<String>,
    /// Whether to ask for hashtags
    #[serde(default = "default_true")]
    pub include_hashtags: bool,
    /// Whether to ask for emoji
    #[serde(default = "default_true")]
    pub include_emoji: bool,
    /// Optional seasonal or event tie-in
    #[serde(default)]
    pub seasonal_hook: Option<String>,
}

fn default_tone() -> String {
    DEFAULT_TONE.to_string()
}

fn default_platforms() -> Vec<String> {
    vec!["Instagram".to_string(), "Facebook".to_string()]
}

/// Platform names key both the prompt's limit table and the reply markers,
/// so surrounding whitespace is dropped before anything else sees them.
fn trimmed_platforms<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let platforms = Vec::<String>::deserialize(deserializer)?;
    Ok(platforms
        .into_iter()
        .map(|platform| platform.trim().to_string())
        .collect())
}

fn default_true() -> bool {
    true
}

const MAX_PLATFORMS: usize = 10;
const MAX_PLATFORM_NAME: usize = 50;

/// A brief field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {problem}")]
pub struct BriefError {
    /// Offending field
    pub field: &'static str,
    /// What is wrong with it
    pub problem: String,
}

impl BriefError {
    fn new(field: &'static str, problem: impl Into<String>) -> Self {
        Self {
            field,
            problem: problem.into(),
        }
    }
}

fn check_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), BriefError> {
    let len = value.trim().chars().count();
    if len < min {
        return Err(BriefError::new(field, "must not be empty"));
    }
    if len > max {
        return Err(BriefError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

impl CampaignBrief {
    /// Checks field lengths and the platform list.
    pub fn validate(&self) -> Result<(), BriefError> {
        check_len("business_name", &self.business_name, 1, 100)?;
        check_len("business_type", &self.business_type, 1, 100)?;
        check_len("target_audience", &self.target_audience, 1, 500)?;
        check_len("campaign_goal", &self.campaign_goal, 1, 500)?;
        check_len("key_messages", &self.key_messages, 1, 1000)?;
        check_len("tone", &self.tone, 0, 200)?;
        if let Some(hook) = &self.seasonal_hook {
            check_len("seasonal_hook", hook, 0, 200)?;
        }
        if self.platforms.len() > MAX_PLATFORMS {
            return Err(BriefError::new(
                "platforms",
                format!("at most {MAX_PLATFORMS} platforms are supported"),
            ));
        }
        for platform in &self.platforms {
            check_len("platforms", platform, 1, MAX_PLATFORM_NAME)?;
        }
        Ok(())
    }

    /// Seasonal hook with blank values treated as absent.
    pub fn seasonal_hook(&self) -> Option<&str> {
        self.seasonal_hook
            .as_deref()
            .map(str::trim)
            .filter(|hook| !hook.is_empty())
    }
}

/// Generated copy for a single platform.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlatformCopy {
    /// Platform label as requested
    pub platform: String,
    /// Ready to post text
    pub copy: String,
    /// Length of `copy` in characters
    pub character_count: usize,
}

impl PlatformCopy {
    /// Builds a block, counting characters of the given text.
    pub fn new(platform: impl Into<String>, copy: impl Into<String>) -> Self {
        let copy = copy.into();
        Self {
            platform: platform.into(),
            character_count: copy.chars().count(),
            copy,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_brief() -> CampaignBrief {
        CampaignBrief {
            business_name: "The Corner Bakery".to_string(),
            business_type: "Independent bakery".to_string(),
            target_audience: "Local families in Manchester".to_string(),
            campaign_goal: "Promote the new afternoon tea menu".to_string(),
            key_messages: "Locally sourced, book online for 10% off".to_string(),
            tone: "warm".to_string(),
            platforms: vec!["Facebook".to_string()],
            include_hashtags: false,
            include_emoji: true,
            seasonal_hook: None,
        }
    }

    #[test]
    fn platform_names_are_trimmed() {
        let brief: CampaignBrief = serde_json::from_value(serde_json::json!({
            "business_name": "Bakery",
            "business_type": "Bakery",
            "target_audience": "Everyone",
            "campaign_goal": "Sell bread",
            "key_messages": "Fresh bread",
            "platforms": [" Instagram", "X  "]
        }))
        .expect("deserialize brief");
        assert_eq!(brief.platforms, vec!["Instagram", "X"]);
        assert!(brief.validate().is_ok());

        let prompt = crate::providers::copy::build_prompt(&brief);
        assert!(prompt.contains("- Instagram: Maximum 2200 characters"));

        let reply = "[PLATFORM: Instagram]\n[COPY]\nFresh loaves daily\n[/COPY]";
        let generated = crate::providers::copy::interpret_reply(reply, &brief);
        assert_eq!(generated.copies.len(), 1);
        assert_eq!(generated.copies[0].platform, "Instagram");
        assert_eq!(generated.copies[0].copy, "Fresh loaves daily");
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let brief: CampaignBrief = serde_json::from_value(serde_json::json!({
            "business_name": "Bakery",
            "business_type": "Bakery",
            "target_audience": "Everyone",
            "campaign_goal": "Sell bread",
            "key_messages": "Fresh bread"
        }))
        .expect("deserialize brief");
        assert_eq!(brief.tone, DEFAULT_TONE);
        assert_eq!(brief.platforms, vec!["Instagram", "Facebook"]);
        assert!(brief.include_hashtags);
        assert!(brief.include_emoji);
        assert!(brief.seasonal_hook.is_none());
        assert!(brief.validate().is_ok());
    }

    #[test]
    fn rejects_blank_and_oversized_fields() {
        let mut brief = sample_brief();
        brief.business_name = "   ".to_string();
        assert_eq!(brief.validate().map_err(|err| err.field), Err("business_name"));

        let mut brief = sample_brief();
        brief.key_messages = "x".repeat(1001);
        assert_eq!(brief.validate().map_err(|err| err.field), Err("key_messages"));

        let mut brief = sample_brief();
        brief.platforms = vec![String::new()];
        assert_eq!(brief.validate().map_err(|err| err.field), Err("platforms"));
    }

    #[test]
    fn lengths_are_counted_in_characters() {
        let mut brief = sample_brief();
        brief.business_name = "é".repeat(100);
        assert!(brief.validate().is_ok());
    }

    #[test]
    fn blank_seasonal_hook_is_absent() {
        let mut brief = sample_brief();
        brief.seasonal_hook = Some("  ".to_string());
        assert_eq!(brief.seasonal_hook(), None);
        brief.seasonal_hook = Some(" Easter ".to_string());
        assert_eq!(brief.seasonal_hook(), Some("Easter"));
    }

    #[test]
    fn platform_copy_counts_characters() {
        let copy = PlatformCopy::new("X", "Café ☕");
        assert_eq!(copy.character_count, 6);
    }
}
