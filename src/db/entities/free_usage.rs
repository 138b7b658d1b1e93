//! DB storage for free tier usage, one row per caller per UTC day
use chrono::{NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, OnConflict, Query};
use sea_orm::StatementBuilder;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "free_usage")]
/// Free generations used by a caller on a given date
pub struct Model {
    #[sea_orm(primary_key)]
    /// db id
    pub id: i32,
    /// caller identity, usually the client address
    pub caller_id: String,
    /// UTC date the usage belongs to
    pub usage_date: Date,
    /// generations charged on that date
    pub generation_count: i32,
    /// first charge of the day
    pub created_at: DateTimeUtc,
    /// most recent charge
    pub updated_at: DateTimeUtc,
}

/// free usage rows stand alone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Charges one generation to `caller_id` for `today` and returns the new count.
///
/// This is a single `INSERT .. ON CONFLICT DO UPDATE .. RETURNING` statement, so
/// concurrent charges for the same caller and day serialize in the database and
/// none are lost.
pub async fn record_attempt<C>(db: &C, caller_id: &str, today: NaiveDate) -> Result<u32, DbErr>
where
    C: ConnectionTrait,
{
    upsert_attempt(db, caller_id, today, None)
        .await?
        .ok_or(DbErr::RecordNotInserted)
}

/// Like [`record_attempt`], but only charges while the stored count is below
/// `daily_limit`. Returns `None` when the caller is already at the limit.
///
/// The limit check is part of the upsert's `DO UPDATE .. WHERE`, so two
/// concurrent charges can't both take the last slot.
pub async fn record_attempt_within<C>(
    db: &C,
    caller_id: &str,
    today: NaiveDate,
    daily_limit: u32,
) -> Result<Option<u32>, DbErr>
where
    C: ConnectionTrait,
{
    if daily_limit == 0 {
        return Ok(None);
    }
    upsert_attempt(db, caller_id, today, Some(daily_limit)).await
}

async fn upsert_attempt<C>(
    db: &C,
    caller_id: &str,
    today: NaiveDate,
    cap: Option<u32>,
) -> Result<Option<u32>, DbErr>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut on_conflict = OnConflict::columns([Column::CallerId, Column::UsageDate]);
    on_conflict
        .value(
            Column::GenerationCount,
            Expr::col(Column::GenerationCount).add(1),
        )
        .value(Column::UpdatedAt, now);
    if let Some(cap) = cap {
        let cap = i64::from(cap);
        on_conflict.action_and_where(Expr::col((Entity, Column::GenerationCount)).lt(cap));
    }

    let insert = Query::insert()
        .into_table(Entity)
        .columns([
            Column::CallerId,
            Column::UsageDate,
            Column::GenerationCount,
            Column::CreatedAt,
            Column::UpdatedAt,
        ])
        .values_panic([
            caller_id.into(),
            today.into(),
            1.into(),
            now.into(),
            now.into(),
        ])
        .on_conflict(on_conflict)
        .returning_col(Column::GenerationCount)
        .to_owned();

    let stmt = StatementBuilder::build(&insert, &db.get_database_backend());
    let Some(row) = db.query_one(stmt).await? else {
        return Ok(None);
    };
    let count: i32 = row.try_get("", "generation_count")?;
    Ok(Some(u32::try_from(count).unwrap_or_default()))
}

/// Usage row for a caller on a given day, if any generation was charged.
pub async fn usage_on<C>(db: &C, caller_id: &str, day: NaiveDate) -> Result<Option<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .filter(Column::CallerId.eq(caller_id))
        .filter(Column::UsageDate.eq(day))
        .one(db)
        .await
}

/// Generations left for `caller_id` today, in `[0, daily_limit]`.
pub async fn remaining<C>(
    db: &C,
    caller_id: &str,
    today: NaiveDate,
    daily_limit: u32,
) -> Result<u32, DbErr>
where
    C: ConnectionTrait,
{
    let used = usage_on(db, caller_id, today)
        .await?
        .map(|usage| u32::try_from(usage.generation_count).unwrap_or_default())
        .unwrap_or(0);
    Ok(remaining_after(daily_limit, used))
}

/// `daily_limit - used`, floored at zero.
pub fn remaining_after(daily_limit: u32, used: u32) -> u32 {
    daily_limit.saturating_sub(used)
}
