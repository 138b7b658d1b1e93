pub(crate) use super::AppState;
pub(crate) use super::middleware::CallerId;
pub(crate) use super::schemas::{ApiJson, ApiQuery};
pub(crate) use crate::brief::CampaignBrief;
pub(crate) use crate::db::entities::campaigns;
pub(crate) use crate::error::ApiError;
pub(crate) use crate::providers::Provider;
pub(crate) use crate::providers::image::ImageSize;
pub(crate) use axum::Json;
pub(crate) use axum::extract::{Path, State};
pub(crate) use axum::http::HeaderMap;
pub(crate) use tracing::{debug, info, warn};
