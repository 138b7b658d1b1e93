//! Append-only store of generated campaigns
use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, QueryOrder, QuerySelect};

use crate::brief::{CampaignBrief, PlatformCopy};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
/// One completed generation, never updated after insert
pub struct Model {
    #[sea_orm(primary_key)]
    /// db id
    pub id: i32,
    /// brief: business name
    pub business_name: String,
    /// brief: business type
    pub business_type: String,
    #[sea_orm(column_type = "Text")]
    /// brief: audience
    pub target_audience: String,
    #[sea_orm(column_type = "Text")]
    /// brief: goal
    pub campaign_goal: String,
    #[sea_orm(column_type = "Text")]
    /// brief: key messages
    pub key_messages: String,
    /// brief: tone
    pub tone: String,
    #[sea_orm(column_type = "Json")]
    /// brief: platforms, a JSON list of strings
    pub platforms: Json,
    /// brief: hashtags requested
    pub include_hashtags: bool,
    /// brief: emoji requested
    pub include_emoji: bool,
    /// brief: seasonal hook
    pub seasonal_hook: Option<String>,
    #[sea_orm(column_type = "Json")]
    /// generated copy, a JSON list of platform blocks
    pub generated_copies: Json,
    #[sea_orm(column_type = "Text")]
    /// prompt used (or usable) for the image
    pub image_prompt: String,
    #[sea_orm(column_type = "Text", nullable)]
    /// generated image, when there is one
    pub image_url: Option<String>,
    /// insert time
    pub created_at: DateTimeUtc,
}

/// campaigns stand alone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Platforms from the stored brief.
    pub fn platform_list(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_value(self.platforms.clone())
    }

    /// Stored copy blocks.
    pub fn copies(&self) -> Result<Vec<PlatformCopy>, serde_json::Error> {
        serde_json::from_value(self.generated_copies.clone())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Json, DbErr> {
    serde_json::to_value(value).map_err(|err| DbErr::Json(err.to_string()))
}

/// Stores a finished generation and returns it with its id and timestamp.
pub async fn save<C>(
    db: &C,
    brief: &CampaignBrief,
    copies: &[PlatformCopy],
    image_prompt: &str,
    image_url: Option<&str>,
) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    ActiveModel {
        business_name: Set(brief.business_name.trim().to_string()),
        business_type: Set(brief.business_type.trim().to_string()),
        target_audience: Set(brief.target_audience.trim().to_string()),
        campaign_goal: Set(brief.campaign_goal.trim().to_string()),
        key_messages: Set(brief.key_messages.trim().to_string()),
        tone: Set(brief.tone.trim().to_string()),
        platforms: Set(to_json(&brief.platforms)?),
        include_hashtags: Set(brief.include_hashtags),
        include_emoji: Set(brief.include_emoji),
        seasonal_hook: Set(brief.seasonal_hook().map(str::to_owned)),
        generated_copies: Set(to_json(&copies)?),
        image_prompt: Set(image_prompt.to_string()),
        image_url: Set(image_url.map(str::to_owned)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// A page of campaigns, newest first, plus the total number stored.
pub async fn list<C>(db: &C, skip: u64, limit: u64) -> Result<(Vec<Model>, u64), DbErr>
where
    C: ConnectionTrait,
{
    let total = Entity::find().count(db).await?;
    let campaigns = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .offset(skip)
        .limit(limit)
        .all(db)
        .await?;
    Ok((campaigns, total))
}

/// Looks up one campaign.
pub async fn get_by_id<C>(db: &C, id: i32) -> Result<Option<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find_by_id(id).one(db).await
}
