//! User repository for credential-store operations.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};

use crate::entities::{companies, sea_orm_active_enums::SubscriptionStatus, users};

/// Normalizes an email for storage and lookup: trimmed and lower-cased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User repository for credential operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(normalize_email(email)))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user and their default company in one transaction.
    ///
    /// The user starts on the free tier with no trial stamp; the trial is
    /// an explicit later action.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is persisted in that
    /// case.
    pub async fn create_with_company(
        &self,
        email: &str,
        password_hash: &str,
        company_name: &str,
        currency: &str,
        now: DateTime<Utc>,
    ) -> Result<(users::Model, companies::Model), DbErr> {
        let txn = self.db.begin().await?;
        let created_at: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let user = users::ActiveModel {
            email: Set(normalize_email(email)),
            password_hash: Set(password_hash.to_string()),
            role: Set("USER".to_string()),
            created_at: Set(created_at),
            trial_started_at: Set(None),
            subscription_status: Set(SubscriptionStatus::Free),
            subscription_expires_at: Set(None),
            external_subscription_ref: Set(None),
            ai_chats_used_today: Set(0),
            ai_chat_reset_date: Set(None),
            ..Default::default()
        };
        let user = user.insert(&txn).await?;

        let company = companies::ActiveModel {
            owner_user_id: Set(user.id),
            name: Set(company_name.to_string()),
            currency: Set(currency.to_string()),
            created_at: Set(created_at),
            ..Default::default()
        };
        let company = company.insert(&txn).await?;

        txn.commit().await?;
        Ok((user, company))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Owner@Acme.IO "), "owner@acme.io");
        assert_eq!(normalize_email("plain@x.io"), "plain@x.io");
    }
}
