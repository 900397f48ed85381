//! Company repository for tenant-store operations.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::entities::companies;

/// Company repository for tenant lookups and ownership checks.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a company by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds the first company owned by a user (token-issue context).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_first_by_owner(
        &self,
        owner_user_id: i64,
    ) -> Result<Option<companies::Model>, DbErr> {
        companies::Entity::find()
            .filter(companies::Column::OwnerUserId.eq(owner_user_id))
            .order_by_asc(companies::Column::Id)
            .one(&self.db)
            .await
    }

    /// Returns true if the company exists and is owned by the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn exists_with_owner(
        &self,
        company_id: i64,
        owner_user_id: i64,
    ) -> Result<bool, DbErr> {
        let count = companies::Entity::find()
            .filter(companies::Column::Id.eq(company_id))
            .filter(companies::Column::OwnerUserId.eq(owner_user_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
