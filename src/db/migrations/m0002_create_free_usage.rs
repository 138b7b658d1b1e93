use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FreeUsage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FreeUsage::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FreeUsage::CallerId).string().not_null())
                    .col(ColumnDef::new(FreeUsage::UsageDate).date().not_null())
                    .col(
                        ColumnDef::new(FreeUsage::GenerationCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FreeUsage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(FreeUsage::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .index(
                        Index::create()
                            .name("idx_free_usage_caller_date")
                            .table(FreeUsage::Table)
                            .col(FreeUsage::CallerId)
                            .col(FreeUsage::UsageDate)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FreeUsage::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum FreeUsage {
    Table,
    Id,
    CallerId,
    UsageDate,
    GenerationCount,
    CreatedAt,
    UpdatedAt,
}
