use super::prelude::*;
use super::schemas::{
    CampaignFullResponse, CampaignListResponse, CampaignRecord, CopyGenerationResponse,
    FreeGenerationRequest, FreeGenerationResponse, FreeTierStatusResponse, FullGenerationRequest,
    HealthResponse, ListParams, ServiceInfo,
};
use crate::constants::{APP_NAME, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::providers::copy::GeneratedCopy;
use crate::quota::{self, Admission, Unavailable};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const COPY_ONLY_MESSAGE: &str = "Copy generated successfully using British English";

/// Result of the image step, which never fails the request.
struct ImageOutcome {
    url: Option<String>,
    revised_prompt: Option<String>,
    failure: Option<String>,
}

impl ImageOutcome {
    fn skipped() -> Self {
        Self {
            url: None,
            revised_prompt: None,
            failure: None,
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            url: None,
            revised_prompt: None,
            failure: Some(reason.into()),
        }
    }

    fn message(&self) -> String {
        match (&self.failure, &self.url) {
            (Some(reason), _) => format!(
                "Copy generated successfully, but image generation failed: {reason}"
            ),
            (None, Some(_)) => "Campaign generated successfully with copy and image".to_string(),
            (None, None) => COPY_ONLY_MESSAGE.to_string(),
        }
    }
}

async fn attempt_image(
    state: &AppState,
    prompt: &str,
    api_key: &str,
    size: ImageSize,
) -> ImageOutcome {
    match state.images.generate(prompt, api_key, size).await {
        Ok(image) => ImageOutcome {
            url: Some(image.url),
            revised_prompt: image.revised_prompt,
            failure: None,
        },
        Err(err) => {
            warn!("Image generation failed, returning copy only: {}", err);
            ImageOutcome::failed(err.to_string())
        }
    }
}

fn full_response(
    campaign_id: i32,
    brief: &CampaignBrief,
    generated: GeneratedCopy,
    image: ImageOutcome,
) -> CampaignFullResponse {
    CampaignFullResponse {
        success: true,
        campaign_id,
        business_name: brief.business_name.trim().to_string(),
        message: image.message(),
        copies: generated.copies,
        image_prompt: generated.image_prompt,
        image_url: image.url,
        revised_image_prompt: image.revised_prompt,
    }
}

/// handles the / GET
pub(crate) async fn root_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: APP_NAME,
        version: VERSION,
        status: "running",
    })
}

pub(crate) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: VERSION,
    })
}

/// Copy only, on the caller's text key.
pub(crate) async fn generate_copy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(brief): ApiJson<CampaignBrief>,
) -> Result<Json<CopyGenerationResponse>, ApiError> {
    brief.validate()?;
    let api_key = state.api_key(&headers, Provider::Anthropic)?;

    let generated = state.copy.generate(&brief, &api_key).await?;
    let saved = campaigns::save(
        &state.db,
        &brief,
        &generated.copies,
        &generated.image_prompt,
        None,
    )
    .await?;
    info!(campaign_id = saved.id, "Generated copy");

    Ok(Json(CopyGenerationResponse {
        success: true,
        campaign_id: saved.id,
        business_name: saved.business_name,
        copies: generated.copies,
        image_prompt: generated.image_prompt,
        message: COPY_ONLY_MESSAGE.to_string(),
    }))
}

/// Copy plus an image, on the caller's keys. A failed image still returns
/// the copy.
pub(crate) async fn generate_full_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<FullGenerationRequest>,
) -> Result<Json<CampaignFullResponse>, ApiError> {
    let brief = request.brief;
    brief.validate()?;
    let text_key = state.api_key(&headers, Provider::Anthropic)?;
    let image_key = state.api_key(&headers, Provider::OpenAi)?;

    let generated = state.copy.generate(&brief, &text_key).await?;
    let image = attempt_image(
        &state,
        &generated.image_prompt,
        &image_key,
        request.image_size,
    )
    .await;

    let saved = campaigns::save(
        &state.db,
        &brief,
        &generated.copies,
        &generated.image_prompt,
        image.url.as_deref(),
    )
    .await?;
    info!(
        campaign_id = saved.id,
        with_image = image.url.is_some(),
        "Generated campaign"
    );

    Ok(Json(full_response(saved.id, &brief, generated, image)))
}

/// Shared-key generation under the daily quota.
pub(crate) async fn generate_free_handler(
    State(state): State<AppState>,
    caller: CallerId,
    ApiJson(request): ApiJson<FreeGenerationRequest>,
) -> Result<Json<FreeGenerationResponse>, ApiError> {
    let brief = request.brief;
    brief.validate()?;
    let today = quota::today();

    match state.quota.check_eligible(caller.as_str(), today).await? {
        Admission::Allow { remaining } => {
            debug!(caller = caller.as_str(), remaining, "Free tier admitted");
        }
        Admission::Deny { remaining, limit } => {
            return Err(ApiError::QuotaExceeded {
                remaining,
                limit,
                resets_at: quota::next_reset(today),
            });
        }
        Admission::Unavailable(Unavailable::Disabled) => {
            return Err(ApiError::FreeTierDisabled);
        }
        Admission::Unavailable(Unavailable::NotConfigured) => {
            return Err(ApiError::FreeTierUnavailable);
        }
    }
    let text_key = state
        .shared_key(Provider::Anthropic)
        .ok_or(ApiError::FreeTierUnavailable)?
        .to_string();

    let generated = state.copy.generate(&brief, &text_key).await?;
    let Some(remaining_today) = state.quota.charge(caller.as_str(), today).await? else {
        return Err(ApiError::QuotaExceeded {
            remaining: 0,
            limit: state.quota.daily_limit(),
            resets_at: quota::next_reset(today),
        });
    };

    let image = if request.generate_image {
        match state.shared_key(Provider::OpenAi).map(str::to_owned) {
            Some(image_key) => {
                attempt_image(
                    &state,
                    &generated.image_prompt,
                    &image_key,
                    request.image_size,
                )
                .await
            }
            None => ImageOutcome::failed("image generation is not configured on this server"),
        }
    } else {
        ImageOutcome::skipped()
    };

    let saved = campaigns::save(
        &state.db,
        &brief,
        &generated.copies,
        &generated.image_prompt,
        image.url.as_deref(),
    )
    .await?;
    info!(
        campaign_id = saved.id,
        caller = caller.as_str(),
        remaining_today,
        "Generated free tier campaign"
    );

    Ok(Json(FreeGenerationResponse {
        campaign: full_response(saved.id, &brief, generated, image),
        remaining_today,
        daily_limit: state.quota.daily_limit(),
    }))
}

pub(crate) async fn free_tier_status_handler(
    State(state): State<AppState>,
    caller: CallerId,
) -> Result<Json<FreeTierStatusResponse>, ApiError> {
    let status = state.quota.status(caller.as_str(), quota::today()).await?;
    Ok(Json(FreeTierStatusResponse {
        success: true,
        status,
    }))
}

/// Newest campaigns first.
pub(crate) async fn list_handler(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<CampaignListResponse>, ApiError> {
    let skip = params.skip.unwrap_or(0);
    if i64::try_from(skip).is_err() {
        return Err(ApiError::Validation(format!(
            "skip must be at most {}",
            i64::MAX
        )));
    }
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 {
        return Err(ApiError::Validation(
            "limit must be greater than zero".to_string(),
        ));
    }
    let limit = limit.min(MAX_PAGE_SIZE);

    let (models, total) = campaigns::list(&state.db, skip, limit).await?;
    let campaigns = models
        .into_iter()
        .map(CampaignRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(CampaignListResponse {
        success: true,
        campaigns,
        total,
        skip,
        limit,
    }))
}

pub(crate) async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CampaignRecord>, ApiError> {
    let not_found = || ApiError::NotFound(format!("Campaign {id} not found"));
    let Ok(campaign_id) = id.parse::<i32>() else {
        return Err(not_found());
    };
    let model = campaigns::get_by_id(&state.db, campaign_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(CampaignRecord::try_from(model)?))
}
