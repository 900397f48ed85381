//! Subscription tier derivation, trial clock, and daily AI chat quota math.
//!
//! Everything here is a pure function of a user's subscription record and
//! an explicit `now`; the wall clock is injected by the caller so the
//! trial/expiry/quota logic is deterministically testable.
//!
//! Stored status and effective tier are distinct concepts: a user whose
//! ACTIVE subscription has lapsed, or whose trial window has ended, is
//! effectively FREE regardless of the stored status.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Stored subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Default: permanent free tier with limited features.
    Free,
    /// Premium trial, explicitly started by the user.
    Trial,
    /// Paid subscriber.
    Active,
    /// Trial ended; reverts to free limitations.
    Expired,
    /// Was a subscriber; reverts to free limitations.
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Trial => "TRIAL",
            Self::Active => "ACTIVE",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Effective tier derived from stored status plus the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// Free tier.
    Free,
    /// Trial within its window.
    Trial,
    /// Paid subscription within its period.
    Active,
}

impl Tier {
    /// Returns the wire representation of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Trial => "TRIAL",
            Self::Active => "ACTIVE",
        }
    }
}

/// Daily AI chat allowances per effective tier.
#[derive(Debug, Clone, Copy)]
pub struct AiChatLimits {
    /// Free tier daily allowance.
    pub free: u32,
    /// Trial daily allowance.
    pub trial: u32,
    /// Paid daily allowance.
    pub active: u32,
}

impl Default for AiChatLimits {
    fn default() -> Self {
        Self {
            free: 3,
            trial: 10,
            active: 50,
        }
    }
}

/// Tunable subscription parameters.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionPolicy {
    /// Trial window length in days.
    pub trial_days: u32,
    /// Daily AI chat allowances.
    pub ai_chat_limits: AiChatLimits,
}

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        Self {
            trial_days: 5,
            ai_chat_limits: AiChatLimits::default(),
        }
    }
}

/// Snapshot of a user's subscription record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Stored lifecycle status.
    pub status: SubscriptionStatus,
    /// When the trial was started, if ever. Set-once: a user whose trial
    /// has started can never start another.
    pub trial_started_at: Option<DateTime<Utc>>,
    /// When the paid subscription lapses.
    pub expires_at: Option<DateTime<Utc>>,
    /// AI chats consumed on `ai_chat_reset_date`.
    pub ai_chats_used_today: u32,
    /// Date the usage counter belongs to.
    pub ai_chat_reset_date: Option<NaiveDate>,
}

impl Subscription {
    /// Returns true if the user currently has premium access.
    ///
    /// ACTIVE with a missing or future expiry grants access; TRIAL grants
    /// access only while within the trial window.
    #[must_use]
    pub fn has_premium_access(&self, policy: &SubscriptionPolicy, now: DateTime<Utc>) -> bool {
        match self.status {
            SubscriptionStatus::Active => self.expires_at.is_none_or(|expiry| now < expiry),
            SubscriptionStatus::Trial => self
                .trial_started_at
                .is_some_and(|started| now < started + Duration::days(i64::from(policy.trial_days))),
            _ => false,
        }
    }

    /// Derives the effective tier from stored status plus the clock.
    ///
    /// EXPIRED, CANCELLED, FREE, a lapsed ACTIVE, and an ended TRIAL all
    /// collapse to FREE.
    #[must_use]
    pub fn effective_tier(&self, policy: &SubscriptionPolicy, now: DateTime<Utc>) -> Tier {
        match self.status {
            SubscriptionStatus::Active if self.has_premium_access(policy, now) => Tier::Active,
            SubscriptionStatus::Trial if self.has_premium_access(policy, now) => Tier::Trial,
            _ => Tier::Free,
        }
    }

    /// Returns whole days remaining in the trial, rounded up and clamped
    /// to `[0, trial_days]`. Zero when not on trial.
    #[must_use]
    pub fn trial_days_remaining(&self, policy: &SubscriptionPolicy, now: DateTime<Utc>) -> i64 {
        if self.status != SubscriptionStatus::Trial {
            return 0;
        }
        let Some(started) = self.trial_started_at else {
            return i64::from(policy.trial_days);
        };
        let expiry = started + Duration::days(i64::from(policy.trial_days));
        let remaining_secs = (expiry - now).num_seconds();
        let div = remaining_secs / 86_400;
        let rem = remaining_secs % 86_400;
        let days = if rem > 0 { div + 1 } else { div };
        days.clamp(0, i64::from(policy.trial_days))
    }

    /// Returns the daily AI chat limit for the user's effective tier.
    #[must_use]
    pub fn daily_ai_chat_limit(&self, policy: &SubscriptionPolicy, now: DateTime<Utc>) -> u32 {
        match self.effective_tier(policy, now) {
            Tier::Active => policy.ai_chat_limits.active,
            Tier::Trial => policy.ai_chat_limits.trial,
            Tier::Free => policy.ai_chat_limits.free,
        }
    }

    /// Returns AI chats remaining today without consuming one.
    ///
    /// A stale reset date means the counter has not rolled over yet, so the
    /// full allowance is available.
    #[must_use]
    pub fn ai_chats_remaining_today(&self, policy: &SubscriptionPolicy, now: DateTime<Utc>) -> u32 {
        let limit = self.daily_ai_chat_limit(policy, now);
        if self.ai_chat_reset_date != Some(now.date_naive()) {
            return limit;
        }
        limit.saturating_sub(self.ai_chats_used_today)
    }

    /// Returns true if the trial has ever been started.
    #[must_use]
    pub const fn trial_already_used(&self) -> bool {
        self.trial_started_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn free() -> Subscription {
        Subscription {
            status: SubscriptionStatus::Free,
            trial_started_at: None,
            expires_at: None,
            ai_chats_used_today: 0,
            ai_chat_reset_date: None,
        }
    }

    fn on_trial(started: DateTime<Utc>) -> Subscription {
        Subscription {
            status: SubscriptionStatus::Trial,
            trial_started_at: Some(started),
            ..free()
        }
    }

    fn active(expires: Option<DateTime<Utc>>) -> Subscription {
        Subscription {
            status: SubscriptionStatus::Active,
            expires_at: expires,
            ..free()
        }
    }

    #[test]
    fn free_user_has_no_premium_access() {
        let policy = SubscriptionPolicy::default();
        let now = at(2026, 6, 1, 12, 0, 0);
        let sub = free();

        assert!(!sub.has_premium_access(&policy, now));
        assert_eq!(sub.effective_tier(&policy, now), Tier::Free);
        assert_eq!(sub.trial_days_remaining(&policy, now), 0);
    }

    #[test]
    fn trial_grants_access_until_window_closes() {
        let policy = SubscriptionPolicy::default();
        let started = at(2026, 6, 1, 12, 0, 0);
        let sub = on_trial(started);

        // One second before the 5-day boundary.
        let just_inside = started + Duration::days(5) - Duration::seconds(1);
        assert!(sub.has_premium_access(&policy, just_inside));
        assert_eq!(sub.effective_tier(&policy, just_inside), Tier::Trial);

        // One second past the boundary.
        let just_outside = started + Duration::days(5) + Duration::seconds(1);
        assert!(!sub.has_premium_access(&policy, just_outside));
        assert_eq!(sub.effective_tier(&policy, just_outside), Tier::Free);
    }

    #[test]
    fn trial_days_remaining_rounds_up_and_clamps() {
        let policy = SubscriptionPolicy::default();
        let started = at(2026, 6, 1, 12, 0, 0);
        let sub = on_trial(started);

        // Immediately after starting: full window.
        assert_eq!(sub.trial_days_remaining(&policy, started), 5);

        // Half a day in: 4.5 days left rounds up to 5.
        let half_day = started + Duration::hours(12);
        assert_eq!(sub.trial_days_remaining(&policy, half_day), 5);

        // 4 days and an hour in: under a day left rounds up to 1.
        let nearly_over = started + Duration::days(4) + Duration::hours(1);
        assert_eq!(sub.trial_days_remaining(&policy, nearly_over), 1);

        // Past the window: clamped to zero.
        let over = started + Duration::days(6);
        assert_eq!(sub.trial_days_remaining(&policy, over), 0);
    }

    #[test]
    fn active_without_expiry_has_access() {
        let policy = SubscriptionPolicy::default();
        let now = at(2026, 6, 1, 0, 0, 0);
        let sub = active(None);

        assert!(sub.has_premium_access(&policy, now));
        assert_eq!(sub.effective_tier(&policy, now), Tier::Active);
    }

    #[test]
    fn lapsed_active_collapses_to_free() {
        let policy = SubscriptionPolicy::default();
        let expiry = at(2026, 6, 1, 0, 0, 0);
        let sub = active(Some(expiry));

        assert!(sub.has_premium_access(&policy, expiry - Duration::seconds(1)));
        assert!(!sub.has_premium_access(&policy, expiry));
        assert_eq!(sub.effective_tier(&policy, expiry), Tier::Free);
    }

    #[test]
    fn expired_and_cancelled_are_free() {
        let policy = SubscriptionPolicy::default();
        let now = at(2026, 6, 1, 0, 0, 0);

        for status in [SubscriptionStatus::Expired, SubscriptionStatus::Cancelled] {
            let sub = Subscription { status, ..free() };
            assert!(!sub.has_premium_access(&policy, now));
            assert_eq!(sub.effective_tier(&policy, now), Tier::Free);
        }
    }

    #[test]
    fn cancelled_user_keeps_nothing_even_with_future_expiry_status_not_active() {
        // Cancellation leaves the stored expiry untouched, but the tier
        // derivation only honors expiry for the ACTIVE status.
        let policy = SubscriptionPolicy::default();
        let now = at(2026, 6, 1, 0, 0, 0);
        let sub = Subscription {
            status: SubscriptionStatus::Cancelled,
            expires_at: Some(now + Duration::days(10)),
            ..free()
        };
        assert_eq!(sub.effective_tier(&policy, now), Tier::Free);
    }

    #[test]
    fn daily_limit_follows_effective_tier() {
        let policy = SubscriptionPolicy::default();
        let now = at(2026, 6, 1, 12, 0, 0);

        assert_eq!(free().daily_ai_chat_limit(&policy, now), 3);
        assert_eq!(on_trial(now).daily_ai_chat_limit(&policy, now), 10);
        assert_eq!(active(None).daily_ai_chat_limit(&policy, now), 50);

        // An ended trial falls back to the free allowance.
        let stale = on_trial(now - Duration::days(6));
        assert_eq!(stale.daily_ai_chat_limit(&policy, now), 3);
    }

    #[test]
    fn remaining_chats_reset_on_a_new_day() {
        let policy = SubscriptionPolicy::default();
        let now = at(2026, 6, 2, 9, 0, 0);
        let sub = Subscription {
            ai_chats_used_today: 3,
            ai_chat_reset_date: Some(at(2026, 6, 1, 0, 0, 0).date_naive()),
            ..free()
        };

        // Yesterday's usage does not count against today.
        assert_eq!(sub.ai_chats_remaining_today(&policy, now), 3);
    }

    #[test]
    fn remaining_chats_floor_at_zero() {
        let policy = SubscriptionPolicy::default();
        let now = at(2026, 6, 1, 9, 0, 0);
        let sub = Subscription {
            ai_chats_used_today: 5,
            ai_chat_reset_date: Some(now.date_naive()),
            ..free()
        };

        assert_eq!(sub.ai_chats_remaining_today(&policy, now), 0);
    }

    #[test]
    fn trial_already_used_tracks_the_stamp() {
        assert!(!free().trial_already_used());
        assert!(on_trial(at(2026, 1, 1, 0, 0, 0)).trial_already_used());

        // Still true after the trial expires and status moves on.
        let sub = Subscription {
            status: SubscriptionStatus::Expired,
            trial_started_at: Some(at(2026, 1, 1, 0, 0, 0)),
            ..free()
        };
        assert!(sub.trial_already_used());
    }
}
