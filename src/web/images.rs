use super::prelude::*;
use super::schemas::{ImageGenerationRequest, ImageGenerationResponse};

const MAX_PROMPT_CHARS: usize = 4000;

/// One image from a caller-supplied prompt.
pub(crate) async fn generate_image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<ImageGenerationRequest>,
) -> Result<Json<ImageGenerationResponse>, ApiError> {
    let prompt = request.prompt.trim();
    let chars = prompt.chars().count();
    if chars == 0 || chars > MAX_PROMPT_CHARS {
        return Err(ApiError::Validation(format!(
            "prompt: must be between 1 and {MAX_PROMPT_CHARS} characters"
        )));
    }
    let api_key = state.api_key(&headers, Provider::OpenAi)?;

    let image = state.images.generate(prompt, &api_key, request.size).await?;
    info!(size = request.size.as_str(), "Generated image");

    Ok(Json(ImageGenerationResponse {
        success: true,
        image_url: image.url,
        revised_prompt: image.revised_prompt,
    }))
}
