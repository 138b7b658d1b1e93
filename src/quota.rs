//! Free tier admission, backed by the daily usage ledger.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;

use crate::config::FreeTierConfig;
use crate::db::entities::free_usage;

/// The UTC calendar date quotas are counted against.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Start of the UTC day after `day`, when a caller's quota resets.
pub fn next_reset(day: NaiveDate) -> DateTime<Utc> {
    day.succ_opt()
        .unwrap_or(day)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Why the free tier can't be used at all, as opposed to being used up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unavailable {
    /// Switched off in configuration
    Disabled,
    /// No shared provider key configured
    NotConfigured,
}

/// Outcome of checking a caller against the free tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The caller may generate
    Allow {
        /// generations left before this one is charged
        remaining: u32,
    },
    /// Daily quota used up
    Deny {
        /// always zero, reported for the client
        remaining: u32,
        /// configured daily limit
        limit: u32,
    },
    /// Free tier not offered
    Unavailable(Unavailable),
}

/// What `/free-tier-status` reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FreeTierStatus {
    /// Free tier switched on
    pub enabled: bool,
    /// Enabled and shared keys configured
    pub available: bool,
    /// Generations left today
    pub remaining: u32,
    /// Configured daily limit
    pub daily_limit: u32,
    /// Next quota reset
    pub resets_at: DateTime<Utc>,
}

/// Decides whether callers may use the shared-key free tier.
#[derive(Clone, Debug)]
pub struct QuotaGate {
    db: DatabaseConnection,
    enabled: bool,
    daily_limit: u32,
    shared_key_configured: bool,
}

impl QuotaGate {
    /// Builds the gate. `shared_key_configured` says whether the process has
    /// the text-provider key the free tier runs on.
    pub fn new(
        db: DatabaseConnection,
        config: &FreeTierConfig,
        shared_key_configured: bool,
    ) -> Self {
        Self {
            db,
            enabled: config.enabled,
            daily_limit: config.daily_limit,
            shared_key_configured,
        }
    }

    /// Configured daily limit.
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    fn unavailable(&self) -> Option<Unavailable> {
        if !self.enabled {
            Some(Unavailable::Disabled)
        } else if !self.shared_key_configured {
            Some(Unavailable::NotConfigured)
        } else {
            None
        }
    }

    /// Checks `caller_id` against today's quota without charging anything.
    pub async fn check_eligible(
        &self,
        caller_id: &str,
        today: NaiveDate,
    ) -> Result<Admission, DbErr> {
        if let Some(reason) = self.unavailable() {
            return Ok(Admission::Unavailable(reason));
        }
        let remaining = free_usage::remaining(&self.db, caller_id, today, self.daily_limit).await?;
        if remaining == 0 {
            Ok(Admission::Deny {
                remaining,
                limit: self.daily_limit,
            })
        } else {
            Ok(Admission::Allow { remaining })
        }
    }

    /// Charges one generation and returns what's left for the day, or `None`
    /// when a concurrent request took the last slot since `check_eligible`.
    pub async fn charge(&self, caller_id: &str, today: NaiveDate) -> Result<Option<u32>, DbErr> {
        let used =
            free_usage::record_attempt_within(&self.db, caller_id, today, self.daily_limit).await?;
        Ok(used.map(|used| free_usage::remaining_after(self.daily_limit, used)))
    }

    /// Current quota state for `caller_id`.
    pub async fn status(&self, caller_id: &str, today: NaiveDate) -> Result<FreeTierStatus, DbErr> {
        let remaining = free_usage::remaining(&self.db, caller_id, today, self.daily_limit).await?;
        Ok(FreeTierStatus {
            enabled: self.enabled,
            available: self.unavailable().is_none(),
            remaining,
            daily_limit: self.daily_limit,
            resets_at: next_reset(today),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn gate(limit: u32, enabled: bool, keyed: bool) -> QuotaGate {
        let db = crate::db::migrated_test_db().await;
        QuotaGate::new(
            db,
            &FreeTierConfig {
                enabled,
                daily_limit: limit,
            },
            keyed,
        )
    }

    #[tokio::test]
    async fn allows_until_limit_then_denies() {
        let gate = gate(2, true, true).await;
        let today = today();

        assert_eq!(
            gate.check_eligible("ip", today).await.expect("check"),
            Admission::Allow { remaining: 2 }
        );
        assert_eq!(gate.charge("ip", today).await.expect("charge"), Some(1));
        assert_eq!(
            gate.check_eligible("ip", today).await.expect("check"),
            Admission::Allow { remaining: 1 }
        );
        assert_eq!(gate.charge("ip", today).await.expect("charge"), Some(0));
        assert_eq!(
            gate.check_eligible("ip", today).await.expect("check"),
            Admission::Deny {
                remaining: 0,
                limit: 2
            }
        );
    }

    #[tokio::test]
    async fn denial_matches_status() {
        let gate = gate(1, true, true).await;
        let today = today();
        assert_eq!(gate.charge("ip", today).await.expect("charge"), Some(0));
        assert_eq!(gate.charge("ip", today).await.expect("charge"), None);

        let Admission::Deny { remaining, limit } =
            gate.check_eligible("ip", today).await.expect("check")
        else {
            panic!("expected denial");
        };
        let status = gate.status("ip", today).await.expect("status");
        assert_eq!(status.remaining, remaining);
        assert_eq!(status.daily_limit, limit);
    }

    #[tokio::test]
    async fn unavailable_is_not_exhaustion() {
        let disabled = gate(5, false, true).await;
        assert_eq!(
            disabled.check_eligible("ip", today()).await.expect("check"),
            Admission::Unavailable(Unavailable::Disabled)
        );

        let keyless = gate(5, true, false).await;
        assert_eq!(
            keyless.check_eligible("ip", today()).await.expect("check"),
            Admission::Unavailable(Unavailable::NotConfigured)
        );
        let status = keyless.status("ip", today()).await.expect("status");
        assert!(status.enabled);
        assert!(!status.available);
        assert_eq!(status.remaining, 5);
    }

    #[test]
    fn resets_at_next_utc_midnight() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid date");
        assert_eq!(next_reset(day).to_rfc3339(), "2026-04-01T00:00:00+00:00");
    }
}
