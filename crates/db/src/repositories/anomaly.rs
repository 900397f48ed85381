//! Anomaly repository.
//!
//! Rows arrive from the anomaly consumer and are read or dismissed by the
//! owning tenant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::anomalies;

/// Anomaly repository.
#[derive(Debug, Clone)]
pub struct AnomalyRepository {
    db: DatabaseConnection,
}

impl AnomalyRepository {
    /// Creates a new anomaly repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a detected anomaly.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(
        &self,
        company_id: i64,
        transaction_id: Option<i64>,
        amount: Decimal,
        detected_at: DateTime<Utc>,
    ) -> Result<anomalies::Model, DbErr> {
        let row = anomalies::ActiveModel {
            company_id: Set(company_id),
            transaction_id: Set(transaction_id),
            amount: Set(amount),
            detected_at: Set(detected_at.into()),
            ..Default::default()
        };

        row.insert(&self.db).await
    }

    /// Lists a company's anomalies, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_company(&self, company_id: i64) -> Result<Vec<anomalies::Model>, DbErr> {
        anomalies::Entity::find()
            .filter(anomalies::Column::CompanyId.eq(company_id))
            .order_by_desc(anomalies::Column::DetectedAt)
            .order_by_desc(anomalies::Column::Id)
            .all(&self.db)
            .await
    }

    /// Finds an anomaly by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<anomalies::Model>, DbErr> {
        anomalies::Entity::find_by_id(id).one(&self.db).await
    }

    /// Deletes (dismisses) an anomaly.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_by_id(&self, id: i64) -> Result<(), DbErr> {
        anomalies::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }
}
