//! Image generation through the OpenAI Images API.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::{Provider, ProviderError};

/// Appended to every prompt before it goes to the image model.
pub const PROMPT_SUFFIX: &str = ". Professional marketing photograph, high quality, suitable for social media advertising, no text overlays.";

/// Output sizes the image model supports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ImageSize {
    /// 1024x1024
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    /// 1024x1792
    #[serde(rename = "1024x1792")]
    Portrait,
    /// 1792x1024
    #[serde(rename = "1792x1024")]
    Landscape,
}

impl ImageSize {
    /// Wire value
    pub fn as_str(self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Portrait => "1024x1792",
            ImageSize::Landscape => "1792x1024",
        }
    }
}

/// The prompt as sent, with the house suffix.
pub fn enhance_prompt(prompt: &str) -> String {
    format!("{}{PROMPT_SUFFIX}", prompt.trim())
}

/// Request body for POST /v1/images/generations
#[derive(Serialize, Debug)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize, Debug)]
struct ImagesGenerateResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    url: Option<String>,
    revised_prompt: Option<String>,
}

/// A generated image hosted by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    /// Where the image can be downloaded
    pub url: String,
    /// The provider's rewrite of our prompt
    pub revised_prompt: Option<String>,
}

/// Talks to the image model.
#[derive(Clone, Debug)]
pub struct ImageGenerator {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl ImageGenerator {
    /// `base_url` is the API root, eg `https://api.openai.com/`.
    pub fn new(
        client: reqwest::Client,
        base_url: &Url,
        model: &str,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            endpoint: base_url.join("v1/images/generations")?,
            model: model.to_string(),
        })
    }

    /// Requests one image for `prompt`.
    #[instrument(level = "debug", skip(self, prompt, api_key))]
    pub async fn generate(
        &self,
        prompt: &str,
        api_key: &str,
        size: ImageSize,
    ) -> Result<GeneratedImage, ProviderError> {
        let provider = Provider::OpenAi;
        let prompt = enhance_prompt(prompt);
        let body = ImagesGenerateRequest {
            model: &self.model,
            prompt: &prompt,
            n: 1,
            size: size.as_str(),
            quality: "standard",
        };

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
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

        let parsed: ImagesGenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ProviderError::malformed(provider, err))?;
        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(provider, "no image data returned"))?;
        let url = first
            .url
            .ok_or_else(|| ProviderError::malformed(provider, "image response missing url"))?;

        Ok(GeneratedImage {
            url,
            revised_prompt: first.revised_prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_wire_names() {
        let size: ImageSize = serde_json::from_str("\"1792x1024\"").expect("parse size");
        assert_eq!(size, ImageSize::Landscape);
        assert_eq!(ImageSize::default().as_str(), "1024x1024");
        assert!(serde_json::from_str::<ImageSize>("\"800x600\"").is_err());
    }

    #[tokio::test]
    async fn returns_url_and_revised_prompt() {
        use crate::constants::TEST_API_KEY;
        use crate::providers::mock;
        use axum::http::{HeaderMap, StatusCode};
        use axum::routing::post;
        use axum::{Json, Router};
        use serde_json::Value;

        async fn images(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
            let bearer = format!("Bearer {TEST_API_KEY}");
            let authorized = headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                == Some(bearer.as_str());
            if !authorized {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(mock::provider_error("Incorrect API key provided")),
                );
            }
            let prompt_ok = body["prompt"]
                .as_str()
                .is_some_and(|prompt| prompt.ends_with(PROMPT_SUFFIX));
            if !prompt_ok || body["size"] != "1024x1792" || body["n"] != 1 {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(mock::provider_error("bad request")),
                );
            }
            (
                StatusCode::OK,
                Json(mock::openai_image("https://images.example.org/a.png")),
            )
        }

        let base = mock::serve(Router::new().route("/v1/images/generations", post(images))).await;
        let client = crate::providers::http_client(std::time::Duration::from_secs(5))
            .expect("client");
        let generator = ImageGenerator::new(client, &base, "dall-e-3").expect("generator");

        let image = generator
            .generate("Scones", TEST_API_KEY, ImageSize::Portrait)
            .await
            .expect("generate");
        assert_eq!(image.url, "https://images.example.org/a.png");
        assert_eq!(image.revised_prompt.as_deref(), Some("A revised prompt"));

        let err = generator
            .generate("Scones", "sk-wrong", ImageSize::Portrait)
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            ProviderError::Authentication {
                provider: Provider::OpenAi
            }
        ));
    }

    #[test]
    fn prompt_gets_house_suffix() {
        assert_eq!(
            enhance_prompt(" Scones on a table "),
            "Scones on a table. Professional marketing photograph, high quality, suitable for social media advertising, no text overlays."
        );
    }
}
