//! String-backed enums stored in the database.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription lifecycle status as stored on the user row.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SubscriptionStatus {
    /// Default: permanent free tier.
    #[sea_orm(string_value = "FREE")]
    Free,
    /// Premium trial, explicitly started by the user.
    #[sea_orm(string_value = "TRIAL")]
    Trial,
    /// Paid subscriber.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Trial ended.
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
    /// Subscription cancelled.
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl From<SubscriptionStatus> for finagent_core::subscription::SubscriptionStatus {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Free => Self::Free,
            SubscriptionStatus::Trial => Self::Trial,
            SubscriptionStatus::Active => Self::Active,
            SubscriptionStatus::Expired => Self::Expired,
            SubscriptionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<finagent_core::subscription::SubscriptionStatus> for SubscriptionStatus {
    fn from(status: finagent_core::subscription::SubscriptionStatus) -> Self {
        use finagent_core::subscription::SubscriptionStatus as Core;
        match status {
            Core::Free => Self::Free,
            Core::Trial => Self::Trial,
            Core::Active => Self::Active,
            Core::Expired => Self::Expired,
            Core::Cancelled => Self::Cancelled,
        }
    }
}

/// How a transaction entered the ledger.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum TransactionSource {
    /// Entered by hand through the API.
    #[sea_orm(string_value = "MANUAL")]
    Manual,
    /// Imported from an external feed.
    #[sea_orm(string_value = "IMPORTED")]
    Imported,
    /// Extracted from a scanned document.
    #[sea_orm(string_value = "SCANNED")]
    Scanned,
}

/// Classification of a category.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum CategoryKind {
    /// Income category.
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Expense category.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}
