use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::BusinessName).string().not_null())
                    .col(ColumnDef::new(Campaigns::BusinessType).string().not_null())
                    .col(ColumnDef::new(Campaigns::TargetAudience).text().not_null())
                    .col(ColumnDef::new(Campaigns::CampaignGoal).text().not_null())
                    .col(ColumnDef::new(Campaigns::KeyMessages).text().not_null())
                    .col(ColumnDef::new(Campaigns::Tone).string().not_null())
                    .col(ColumnDef::new(Campaigns::Platforms).json().not_null())
                    .col(
                        ColumnDef::new(Campaigns::IncludeHashtags)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Campaigns::IncludeEmoji)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Campaigns::SeasonalHook).string().null())
                    .col(ColumnDef::new(Campaigns::GeneratedCopies).json().not_null())
                    .col(ColumnDef::new(Campaigns::ImagePrompt).text().not_null())
                    .col(ColumnDef::new(Campaigns::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaigns_created_at")
                    .table(Campaigns::Table)
                    .col(Campaigns::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    BusinessName,
    BusinessType,
    TargetAudience,
    CampaignGoal,
    KeyMessages,
    Tone,
    Platforms,
    IncludeHashtags,
    IncludeEmoji,
    SeasonalHook,
    GeneratedCopies,
    ImagePrompt,
    ImageUrl,
    CreatedAt,
}
