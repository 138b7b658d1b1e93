//! Request and response bodies for the JSON API.

use axum::extract::{FromRequest, FromRequestParts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::brief::{CampaignBrief, PlatformCopy};
use crate::db::entities::campaigns;
use crate::error::ApiError;
use crate::providers::image::ImageSize;
use crate::quota::FreeTierStatus;

/// JSON body whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct ApiJson<T>(pub(crate) T);

/// Query string whose rejections use the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub(crate) struct ApiQuery<T>(pub(crate) T);

#[derive(Deserialize, Debug)]
pub(crate) struct FullGenerationRequest {
    #[serde(flatten)]
    pub(crate) brief: CampaignBrief,
    #[serde(default)]
    pub(crate) image_size: ImageSize,
}

#[derive(Deserialize, Debug)]
pub(crate) struct FreeGenerationRequest {
    #[serde(flatten)]
    pub(crate) brief: CampaignBrief,
    #[serde(default)]
    pub(crate) generate_image: bool,
    #[serde(default)]
    pub(crate) image_size: ImageSize,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ImageGenerationRequest {
    pub(crate) prompt: String,
    #[serde(default)]
    pub(crate) size: ImageSize,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct ListParams {
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
}

#[derive(Serialize, Debug)]
pub(crate) struct ServiceInfo {
    pub(crate) name: &'static str,
    pub(crate) version: &'static str,
    pub(crate) status: &'static str,
}

#[derive(Serialize, Debug)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) version: &'static str,
}

#[derive(Serialize, Debug)]
pub(crate) struct CopyGenerationResponse {
    pub(crate) success: bool,
    pub(crate) campaign_id: i32,
    pub(crate) business_name: String,
    pub(crate) copies: Vec<PlatformCopy>,
    pub(crate) image_prompt: String,
    pub(crate) message: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct CampaignFullResponse {
    pub(crate) success: bool,
    pub(crate) campaign_id: i32,
    pub(crate) business_name: String,
    pub(crate) copies: Vec<PlatformCopy>,
    pub(crate) image_prompt: String,
    pub(crate) image_url: Option<String>,
    pub(crate) revised_image_prompt: Option<String>,
    pub(crate) message: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct FreeGenerationResponse {
    #[serde(flatten)]
    pub(crate) campaign: CampaignFullResponse,
    pub(crate) remaining_today: u32,
    pub(crate) daily_limit: u32,
}

#[derive(Serialize, Debug)]
pub(crate) struct FreeTierStatusResponse {
    pub(crate) success: bool,
    #[serde(flatten)]
    pub(crate) status: FreeTierStatus,
}

#[derive(Serialize, Debug)]
pub(crate) struct ImageGenerationResponse {
    pub(crate) success: bool,
    pub(crate) image_url: String,
    pub(crate) revised_prompt: Option<String>,
}

/// A stored campaign as the API shows it.
#[derive(Serialize, Debug)]
pub(crate) struct CampaignRecord {
    pub(crate) id: i32,
    pub(crate) business_name: String,
    pub(crate) business_type: String,
    pub(crate) target_audience: String,
    pub(crate) campaign_goal: String,
    pub(crate) key_messages: String,
    pub(crate) tone: String,
    pub(crate) platforms: Vec<String>,
    pub(crate) include_hashtags: bool,
    pub(crate) include_emoji: bool,
    pub(crate) seasonal_hook: Option<String>,
    pub(crate) generated_copies: Vec<PlatformCopy>,
    pub(crate) image_prompt: String,
    pub(crate) image_url: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

impl TryFrom<campaigns::Model> for CampaignRecord {
    type Error = serde_json::Error;

    fn try_from(model: campaigns::Model) -> Result<Self, Self::Error> {
        let platforms = model.platform_list()?;
        let generated_copies = model.copies()?;
        Ok(Self {
            id: model.id,
            business_name: model.business_name,
            business_type: model.business_type,
            target_audience: model.target_audience,
            campaign_goal: model.campaign_goal,
            key_messages: model.key_messages,
            tone: model.tone,
            platforms,
            include_hashtags: model.include_hashtags,
            include_emoji: model.include_emoji,
            seasonal_hook: model.seasonal_hook,
            generated_copies,
            image_prompt: model.image_prompt,
            image_url: model.image_url,
            created_at: model.created_at,
        })
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct CampaignListResponse {
    pub(crate) success: bool,
    pub(crate) campaigns: Vec<CampaignRecord>,
    pub(crate) total: u64,
    pub(crate) skip: u64,
    pub(crate) limit: u64,
}
