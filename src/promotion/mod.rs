// src/promotion/mod.rs

//! Win-forcing and prize-pacing policy for the spin-the-wheel promotion.
//!
//! All state lives in a [`CounterStore`]; the service itself holds nothing
//! between calls, so any number of request workers can share one instance.
//! Operations that touch several keys are not transactional: a backend
//! failure halfway through leaves the earlier writes in place.

pub mod clock;
pub mod keys;
pub mod pacing;

pub use clock::{Clock, FixedClock, SystemClock};

use crate::config::PromotionConfig;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::storage::CounterStore;
use futures_util::future::try_join_all;
use pacing::PACED_PRIZE;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Tunables for the promotion, resolved from [`PromotionConfig`].
#[derive(Debug, Clone)]
pub struct PromotionPolicy {
    pub monthly_limits: BTreeMap<String, u32>,
    pub loss_streak_threshold: i64,
    pub daily_ttl: Duration,
    pub monthly_ttl: Duration,
}

impl PromotionPolicy {
    pub fn monthly_limit(&self, prize_id: &str) -> Option<u32> {
        self.monthly_limits.get(prize_id).copied()
    }
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self::from(&PromotionConfig::default())
    }
}

impl From<&PromotionConfig> for PromotionPolicy {
    fn from(config: &PromotionConfig) -> Self {
        Self {
            monthly_limits: config.monthly_limits.clone(),
            loss_streak_threshold: config.loss_streak_threshold,
            daily_ttl: Duration::from_secs(config.daily_ttl_secs),
            monthly_ttl: Duration::from_secs(config.monthly_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyStatus {
    pub losses: i64,
    pub wins: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    pub consumed: i64,
    pub remaining: i64,
    pub limit: i64,
}

/// Outcome of the pre-spin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinGate {
    /// A forced-win token was consumed; the spin must land on a prize.
    pub must_win: bool,
    /// The paced monthly prize may be among the outcomes.
    #[serde(rename = "allowOff10")]
    pub allow_paced_prize: bool,
}

impl SpinGate {
    /// Returned whenever the check itself fails, so the game stays playable.
    pub const FAIL_OPEN: SpinGate = SpinGate {
        must_win: false,
        allow_paced_prize: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrizeAward {
    pub id: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct PromotionService {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    policy: PromotionPolicy,
}

impl PromotionService {
    pub fn new(
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
        policy: PromotionPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// The caller's day string, or today's when it is absent or blank.
    pub fn resolve_day(&self, day: Option<&str>) -> String {
        day.map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or_else(|| keys::day_key(self.clock.today()), str::to_string)
    }

    /// Month bucket for the monthly prize counters: always the current month.
    pub fn current_month(&self) -> String {
        keys::month_key(self.clock.today())
    }

    /// Missing or non-numeric values count as zero.
    async fn read_counter(&self, key: &str) -> Result<i64> {
        let raw = self.store.get(key).await?;
        Ok(raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0))
    }

    async fn refresh_retention(&self, key: &str, ttl: Duration) -> Result<()> {
        if let Err(e) = self.store.expire(key, ttl).await {
            warn!(key, error = %e, "Failed to refresh counter retention");
            return Err(e);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn daily_status(&self, day: &str) -> Result<DailyStatus> {
        let losses_key = keys::losses_key(day);
        let wins_key = keys::wins_key(day);
        let (losses, wins) = tokio::try_join!(
            self.read_counter(&losses_key),
            self.read_counter(&wins_key),
        )?;
        Ok(DailyStatus { losses, wins })
    }

    #[instrument(skip(self, prize_ids))]
    pub async fn prize_counts(
        &self,
        day: &str,
        prize_ids: &[String],
    ) -> Result<BTreeMap<String, i64>> {
        let ids = keys::unique_prize_ids(prize_ids);
        let counts = try_join_all(
            ids.iter()
                .map(|id| async move { self.read_counter(&keys::daily_prize_key(id, day)).await }),
        )
        .await?;
        Ok(ids.into_iter().zip(counts).collect())
    }

    #[instrument(skip(self, prize_ids))]
    pub async fn monthly_counts(
        &self,
        prize_ids: &[String],
    ) -> Result<BTreeMap<String, MonthlyCount>> {
        let month = self.current_month();
        let ids = keys::unique_prize_ids(prize_ids);
        let consumed = try_join_all(ids.iter().map(|id| {
            let key = keys::monthly_prize_key(id, &month);
            async move { self.read_counter(&key).await }
        }))
        .await?;

        Ok(ids
            .into_iter()
            .zip(consumed)
            .map(|(id, consumed)| {
                let limit = i64::from(self.policy.monthly_limit(&id).unwrap_or(0));
                let count = MonthlyCount {
                    consumed,
                    remaining: (limit - consumed).max(0),
                    limit,
                };
                (id, count)
            })
            .collect())
    }

    /// Consumes the forced-win token and decides whether the paced prize is
    /// on offer. Never fails: backend errors yield [`SpinGate::FAIL_OPEN`].
    #[instrument(skip(self))]
    pub async fn pre_spin(&self, day: &str) -> SpinGate {
        match self.try_pre_spin(day).await {
            Ok(gate) => gate,
            Err(e) => {
                warn!(error = %e, "Pre-spin check failed; failing open");
                metrics::record_fail_open();
                SpinGate::FAIL_OPEN
            }
        }
    }

    async fn try_pre_spin(&self, day: &str) -> Result<SpinGate> {
        let token = self.store.get_del(&keys::force_win_key(day)).await?;
        let must_win = token.is_some_and(|t| !t.is_empty());
        if must_win {
            info!(day, "Forced-win token consumed");
            metrics::record_forced_win();
        }

        // Without a configured limit the prize is not paced at all.
        let allow_paced_prize = match self.policy.monthly_limit(PACED_PRIZE) {
            None => true,
            Some(limit) => {
                let month = self.current_month();
                let consumed = self
                    .read_counter(&keys::monthly_prize_key(PACED_PRIZE, &month))
                    .await?;
                let remaining = i64::from(limit) - consumed;
                pacing::allow_paced_prize(remaining, keys::parse_day(day), &month, day)
            }
        };

        debug!(must_win, allow_paced_prize, "Pre-spin decided");
        Ok(SpinGate {
            must_win,
            allow_paced_prize,
        })
    }

    /// Returns the new consecutive-loss count. Reaching the threshold exactly
    /// arms a forced-win token for the day; later losses do not re-arm it.
    #[instrument(skip(self))]
    pub async fn record_loss(&self, day: &str) -> Result<i64> {
        let losses_key = keys::losses_key(day);
        let losses = self.store.incr(&losses_key).await?;
        self.refresh_retention(&losses_key, self.policy.daily_ttl)
            .await?;
        metrics::record_spin("loss");

        if losses == self.policy.loss_streak_threshold {
            let force_key = keys::force_win_key(day);
            self.store.set(&force_key, "1").await?;
            self.refresh_retention(&force_key, self.policy.daily_ttl)
                .await?;
            info!(day, losses, "Loss streak reached; next spin will win");
        }

        Ok(losses)
    }

    /// Counts a win and resets the consecutive-loss counter.
    #[instrument(skip(self))]
    pub async fn record_win(&self, day: &str) -> Result<()> {
        let wins_key = keys::wins_key(day);
        let losses_key = keys::losses_key(day);

        tokio::try_join!(self.store.incr(&wins_key), self.store.set(&losses_key, "0"))?;
        tokio::try_join!(
            self.refresh_retention(&wins_key, self.policy.daily_ttl),
            self.refresh_retention(&losses_key, self.policy.daily_ttl),
        )?;
        metrics::record_spin("win");
        Ok(())
    }

    /// Counts an awarded prize for the day and, for monthly-limited prizes,
    /// for the month. The monthly increment is skipped once the limit is
    /// reached; the award itself has already happened by then.
    ///
    /// The limit check and the increment are separate store calls, so two
    /// concurrent awards can push the monthly counter slightly past the limit.
    #[instrument(skip(self))]
    pub async fn record_prize_win(&self, day: &str, prize_id: &str) -> Result<PrizeAward> {
        if prize_id.is_empty() {
            return Err(AppError::validation("id", "Missing prize id"));
        }

        let daily_key = keys::daily_prize_key(prize_id, day);
        let count = self.store.incr(&daily_key).await?;
        self.refresh_retention(&daily_key, self.policy.daily_ttl)
            .await?;
        // Ids come from clients; only configured prizes get their own label.
        let label = match self.policy.monthly_limit(prize_id) {
            Some(_) => prize_id,
            None => metrics::OTHER_PRIZE_LABEL,
        };
        metrics::record_prize_award(label);

        if let Some(limit) = self.policy.monthly_limit(prize_id) {
            let monthly_key = keys::monthly_prize_key(prize_id, &self.current_month());
            let consumed = self.read_counter(&monthly_key).await?;
            if consumed < i64::from(limit) {
                self.store.incr(&monthly_key).await?;
                self.refresh_retention(&monthly_key, self.policy.monthly_ttl)
                    .await?;
            } else {
                debug!(prize_id, consumed, limit, "Monthly limit reached; not counting");
            }
        }

        Ok(PrizeAward {
            id: prize_id.to_string(),
            count,
        })
    }
}
