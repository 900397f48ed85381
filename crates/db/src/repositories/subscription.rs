//! Subscription persistence: trial start, paid-plan transitions, and the
//! daily AI chat quota.
//!
//! Pure tier/quota derivations live in `finagent_core::subscription`; this
//! repository applies the resulting state transitions under row-level
//! locks so concurrent requests for the same user serialize.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use thiserror::Error;
use tracing::{info, warn};

use finagent_core::subscription::{Subscription, SubscriptionPolicy};

use crate::entities::{sea_orm_active_enums::SubscriptionStatus, users};
use crate::repositories::user::normalize_email;

/// Errors from subscription operations.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// No user with the given email.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Result of a trial-start attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialStart {
    /// Trial started now.
    Started,
    /// The user has already used their one trial.
    AlreadyUsed,
}

/// Result of consuming one AI chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiChatOutcome {
    /// A chat was consumed; `remaining` is the allowance left today.
    Allowed {
        /// Chats remaining after this one.
        remaining: u32,
    },
    /// The daily allowance is exhausted.
    Exceeded {
        /// The daily limit for the user's tier.
        limit: u32,
    },
}

/// Builds the pure subscription snapshot from a user row.
#[must_use]
pub fn subscription_of(user: &users::Model) -> Subscription {
    Subscription {
        status: user.subscription_status.clone().into(),
        trial_started_at: user.trial_started_at.map(|t| t.with_timezone(&Utc)),
        expires_at: user.subscription_expires_at.map(|t| t.with_timezone(&Utc)),
        ai_chats_used_today: u32::try_from(user.ai_chats_used_today).unwrap_or(0),
        ai_chat_reset_date: user.ai_chat_reset_date,
    }
}

/// Repository for subscription state transitions and quota tracking.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    db: DatabaseConnection,
}

impl SubscriptionRepository {
    /// Creates a new subscription repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn lock_user_by_id(
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(txn)
            .await
    }

    async fn lock_user_by_email(
        txn: &DatabaseTransaction,
        email: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// Starts the free trial. Allowed exactly once per account: a set
    /// trial stamp means the trial can never start again, whatever the
    /// current status.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the database fails.
    pub async fn start_trial(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<TrialStart, SubscriptionError> {
        let txn = self.db.begin().await?;
        let user = Self::lock_user_by_id(&txn, user_id)
            .await?
            .ok_or_else(|| SubscriptionError::UserNotFound(user_id.to_string()))?;

        if user.trial_started_at.is_some() {
            txn.commit().await?;
            warn!(user_id, "trial start denied, already used");
            return Ok(TrialStart::AlreadyUsed);
        }

        let email = user.email.clone();
        let mut active: users::ActiveModel = user.into();
        active.trial_started_at = Set(Some(now.into()));
        active.subscription_status = Set(SubscriptionStatus::Trial);
        active.update(&txn).await?;
        txn.commit().await?;

        info!(user_id, email = %email, "trial started");
        Ok(TrialStart::Started)
    }

    /// Activates a paid subscription after a captured payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the database fails.
    pub async fn activate(
        &self,
        email: &str,
        external_ref: &str,
        now: DateTime<Utc>,
        period_days: u32,
    ) -> Result<(), SubscriptionError> {
        let txn = self.db.begin().await?;
        let user = Self::lock_user_by_email(&txn, email)
            .await?
            .ok_or_else(|| SubscriptionError::UserNotFound(email.to_string()))?;

        let expiry = now + Duration::days(i64::from(period_days));
        let mut active: users::ActiveModel = user.into();
        active.subscription_status = Set(SubscriptionStatus::Active);
        active.subscription_expires_at = Set(Some(expiry.into()));
        active.external_subscription_ref = Set(Some(external_ref.to_string()));
        active.update(&txn).await?;
        txn.commit().await?;

        info!(email = %normalize_email(email), %expiry, "subscription activated");
        Ok(())
    }

    /// Renews a paid subscription. The new expiry extends the current one
    /// when it is still in the future, otherwise counts from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the database fails.
    pub async fn renew(
        &self,
        email: &str,
        external_ref: &str,
        now: DateTime<Utc>,
        period_days: u32,
    ) -> Result<(), SubscriptionError> {
        let txn = self.db.begin().await?;
        let user = Self::lock_user_by_email(&txn, email)
            .await?
            .ok_or_else(|| SubscriptionError::UserNotFound(email.to_string()))?;

        let base = user
            .subscription_expires_at
            .map(|t| t.with_timezone(&Utc))
            .filter(|expiry| *expiry > now)
            .unwrap_or(now);
        let expiry = base + Duration::days(i64::from(period_days));

        let mut active: users::ActiveModel = user.into();
        active.subscription_status = Set(SubscriptionStatus::Active);
        active.subscription_expires_at = Set(Some(expiry.into()));
        active.external_subscription_ref = Set(Some(external_ref.to_string()));
        active.update(&txn).await?;
        txn.commit().await?;

        info!(email = %normalize_email(email), %expiry, "subscription renewed");
        Ok(())
    }

    /// Cancels a paid subscription. The expiry is left untouched so the
    /// user retains access until it lapses.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the database fails.
    pub async fn cancel(&self, email: &str) -> Result<(), SubscriptionError> {
        let txn = self.db.begin().await?;
        let user = Self::lock_user_by_email(&txn, email)
            .await?
            .ok_or_else(|| SubscriptionError::UserNotFound(email.to_string()))?;

        let mut active: users::ActiveModel = user.into();
        active.subscription_status = Set(SubscriptionStatus::Cancelled);
        active.update(&txn).await?;
        txn.commit().await?;

        info!(email = %normalize_email(email), "subscription cancelled");
        Ok(())
    }

    /// Atomically consumes one AI chat from the user's daily allowance.
    ///
    /// The row is locked for the duration, so two concurrent requests
    /// cannot both take the last slot. The counter rolls over on the first
    /// consumption of a new day.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is missing or the database fails.
    pub async fn consume_ai_chat(
        &self,
        user_id: i64,
        policy: &SubscriptionPolicy,
        now: DateTime<Utc>,
    ) -> Result<AiChatOutcome, SubscriptionError> {
        let txn = self.db.begin().await?;
        let user = Self::lock_user_by_id(&txn, user_id)
            .await?
            .ok_or_else(|| SubscriptionError::UserNotFound(user_id.to_string()))?;

        let snapshot = subscription_of(&user);
        let limit = snapshot.daily_ai_chat_limit(policy, now);
        let today = now.date_naive();

        let used = if user.ai_chat_reset_date == Some(today) {
            u32::try_from(user.ai_chats_used_today).unwrap_or(0)
        } else {
            0
        };

        if used >= limit {
            txn.commit().await?;
            warn!(user_id, limit, "ai chat quota exhausted");
            return Ok(AiChatOutcome::Exceeded { limit });
        }

        let used_after = used + 1;
        let mut active: users::ActiveModel = user.into();
        active.ai_chats_used_today = Set(i32::try_from(used_after).unwrap_or(i32::MAX));
        active.ai_chat_reset_date = Set(Some(today));
        active.update(&txn).await?;
        txn.commit().await?;

        Ok(AiChatOutcome::Allowed {
            remaining: limit - used_after,
        })
    }
}
