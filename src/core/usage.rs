//! Daily Scan Quota
//!
//! Lazy reset: the counter returns to zero on the first read of a new UTC
//! calendar day. Every read and write goes through `get_stats`, so no
//! timer is needed. Pro status is a one-way upgrade.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::UsageRecord;
use crate::utils::constants::{DAILY_SCAN_LIMIT, USAGE_STATS_KEY};
use crate::utils::storage::KeyValueStore;

/// Source of "today"
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Clone)]
pub struct UsageTracker {
    store: Arc<dyn KeyValueStore>,
    clock: Clock,
    daily_limit: u32,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(utc_today))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self {
            store,
            clock,
            daily_limit: DAILY_SCAN_LIMIT,
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    fn persist(&self, record: &UsageRecord) -> AppResult<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| AppError::storage(format!("Usage record serialize failed: {}", e)))?;
        self.store.set(USAGE_STATS_KEY, &json)
    }

    /// Current record, initialising or resetting it as needed
    pub fn get_stats(&self) -> AppResult<UsageRecord> {
        let today = (self.clock)();

        let stored = match self.store.get(USAGE_STATS_KEY)? {
            Some(raw) => match serde_json::from_str::<UsageRecord>(&raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Stored usage record unreadable, re-initialising");
                    None
                }
            },
            None => None,
        };

        let Some(mut record) = stored else {
            let initial = UsageRecord::fresh(today);
            self.persist(&initial)?;
            debug!("📊 Usage record initialised for {}", today);
            return Ok(initial);
        };

        if record.last_reset_date != today {
            info!(
                previous = %record.last_reset_date,
                scans = record.scans_used_today,
                "📅 New day, resetting scan counter"
            );
            record.scans_used_today = 0;
            record.last_reset_date = today;
            self.persist(&record)?;
        }

        Ok(record)
    }

    /// Quota gate: whether a scan may start, with the record it was decided on
    pub fn check_quota(&self) -> AppResult<(bool, UsageRecord)> {
        let stats = self.get_stats()?;
        let allowed = stats.is_pro || stats.scans_used_today < self.daily_limit;
        Ok((allowed, stats))
    }

    /// True iff Pro or under the daily limit
    pub fn can_scan(&self) -> AppResult<bool> {
        Ok(self.check_quota()?.0)
    }

    /// Scans left today; `None` means unlimited
    pub fn remaining_scans(&self) -> AppResult<Option<u32>> {
        let stats = self.get_stats()?;
        if stats.is_pro {
            return Ok(None);
        }
        Ok(Some(self.daily_limit.saturating_sub(stats.scans_used_today)))
    }

    /// Record one completed scan. Call only after a successful scan.
    pub fn increment_scan(&self) -> AppResult<()> {
        let mut stats = self.get_stats()?;
        if stats.is_pro {
            return Ok(());
        }
        stats.scans_used_today += 1;
        self.persist(&stats)?;
        debug!(scans = stats.scans_used_today, limit = self.daily_limit, "📊 Scan recorded");
        Ok(())
    }

    pub fn upgrade_to_pro(&self) -> AppResult<UsageRecord> {
        let mut stats = self.get_stats()?;
        stats.is_pro = true;
        self.persist(&stats)?;
        info!("⭐ Upgraded to Pro");
        Ok(stats)
    }
}
