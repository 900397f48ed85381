//! Transaction repository for ledger operations and P&L aggregations.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::entities::{categories, sea_orm_active_enums::TransactionSource, transactions};

/// One category's summed amounts for the P&L breakdown.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CategorySumRow {
    /// Category name; NULL collapses to uncategorized downstream.
    pub category_name: Option<String>,
    /// Signed sum of amounts. NULL only on empty groups, coalesced by the
    /// caller.
    pub total: Option<Decimal>,
}

/// Transaction repository for ledger CRUD and aggregate queries.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a company's transactions with their categories, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_categories(
        &self,
        company_id: i64,
    ) -> Result<Vec<(transactions::Model, Option<categories::Model>)>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id))
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::Id)
            .find_also_related(categories::Entity)
            .all(&self.db)
            .await
    }

    /// Persists a new manually entered transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        company_id: i64,
        date: NaiveDate,
        amount: Decimal,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<transactions::Model, DbErr> {
        let row = transactions::ActiveModel {
            company_id: Set(company_id),
            category_id: Set(None),
            date: Set(date),
            amount: Set(amount),
            description: Set(description.to_string()),
            source: Set(TransactionSource::Manual),
            created_at: Set(now.into()),
            ..Default::default()
        };

        row.insert(&self.db).await
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id).one(&self.db).await
    }

    /// Hard-deletes a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_by_id(&self, id: i64) -> Result<(), DbErr> {
        transactions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Sums positive amounts (income) in an inclusive date range.
    /// Returns zero on empty input.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sum_positive(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal, DbErr> {
        self.sum_filtered(company_id, start, end, transactions::Column::Amount.gt(Decimal::ZERO))
            .await
    }

    /// Sums negative amounts (expenses) in an inclusive date range.
    /// The result is negative or zero; callers take the absolute value for
    /// display.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sum_negative(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal, DbErr> {
        self.sum_filtered(company_id, start, end, transactions::Column::Amount.lt(Decimal::ZERO))
            .await
    }

    async fn sum_filtered(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        amount_filter: sea_orm::sea_query::SimpleExpr,
    ) -> Result<Decimal, DbErr> {
        let total: Option<Option<Decimal>> = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::CompanyId.eq(company_id))
            .filter(amount_filter)
            .filter(transactions::Column::Date.between(start, end))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Sums amounts per category in an inclusive date range, ordered by
    /// descending sum. Transactions without a category group under a NULL
    /// name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sum_by_category(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategorySumRow>, DbErr> {
        transactions::Entity::find()
            .select_only()
            .column_as(categories::Column::Name, "category_name")
            .column_as(transactions::Column::Amount.sum(), "total")
            .join(JoinType::LeftJoin, transactions::Relation::Categories.def())
            .filter(transactions::Column::CompanyId.eq(company_id))
            .filter(transactions::Column::Date.between(start, end))
            .group_by(categories::Column::Name)
            .order_by_desc(transactions::Column::Amount.sum())
            .into_model::<CategorySumRow>()
            .all(&self.db)
            .await
    }

    /// Counts transactions in an inclusive date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::CompanyId.eq(company_id))
            .filter(transactions::Column::Date.between(start, end))
            .count(&self.db)
            .await
    }
}
