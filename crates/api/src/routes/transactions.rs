//! Transaction routes: list, create, and delete.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use finagent_db::TransactionRepository;
use finagent_db::entities::{categories, transactions};
use finagent_events::publish_transactions_new;
use finagent_shared::AppError;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::routes::ensure_owner;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{company_id}/transactions", get(list_transactions))
        .route("/{company_id}/transactions", post(create_transaction))
        .route(
            "/{company_id}/transactions/{transaction_id}",
            delete(delete_transaction),
        )
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Transaction date (YYYY-MM-DD).
    pub date: NaiveDate,
    /// Amount: positive is income, negative is expense.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
}

/// Wire view of a transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    /// Transaction ID.
    pub id: i64,
    /// Transaction date (YYYY-MM-DD).
    pub date: String,
    /// Signed amount.
    pub amount: Decimal,
    /// Description.
    pub description: String,
    /// Category name, if categorized.
    pub category_name: Option<String>,
}

fn to_view(txn: transactions::Model, category: Option<categories::Model>) -> TransactionView {
    TransactionView {
        id: txn.id,
        date: txn.date.format("%Y-%m-%d").to_string(),
        amount: txn.amount,
        description: txn.description,
        category_name: category.map(|c| c.name),
    }
}

fn validate_create(payload: &CreateTransactionRequest) -> Result<(), AppError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    if description.chars().count() > 512 {
        return Err(AppError::Validation(
            "Description must be at most 512 characters".to_string(),
        ));
    }
    Ok(())
}

/// GET /{company_id}/transactions - All transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, company_id, auth.user().id).await?;

    let transactions = TransactionRepository::new((*state.db).clone());
    let views: Vec<TransactionView> = transactions
        .list_with_categories(company_id)
        .await?
        .into_iter()
        .map(|(txn, category)| to_view(txn, category))
        .collect();

    Ok(Json(views))
}

/// POST /{company_id}/transactions - Persist a transaction, evict the
/// tenant's report cache, and publish the event for anomaly detection.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<i64>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, company_id, auth.user().id).await?;
    validate_create(&payload)?;

    let transactions = TransactionRepository::new((*state.db).clone());
    let saved = transactions
        .create(
            company_id,
            payload.date,
            payload.amount,
            payload.description.trim(),
            state.clock.now(),
        )
        .await?;

    info!(company_id, transaction_id = saved.id, amount = %saved.amount, "transaction created");

    // Post-commit side channels: cache eviction before the response so the
    // next report read recomputes, then the best-effort event publish.
    state.report_cache.evict_company(company_id);
    publish_transactions_new(&*state.publisher, company_id, &[saved.id]).await;

    Ok((StatusCode::CREATED, Json(to_view(saved, None))))
}

/// DELETE /{company_id}/transactions/{transaction_id} - Hard delete.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, transaction_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, company_id, auth.user().id).await?;

    let transactions = TransactionRepository::new((*state.db).clone());
    let txn = transactions
        .find_by_id(transaction_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

    // Defense in depth: the pipeline already checked tenant ownership, but
    // the row itself must belong to the path tenant too.
    if txn.company_id != company_id {
        warn!(
            company_id,
            transaction_id, "delete denied, transaction belongs to another tenant"
        );
        return Err(AppError::Forbidden(format!(
            "transaction {transaction_id} does not belong to company {company_id}"
        ))
        .into());
    }

    transactions.delete_by_id(transaction_id).await?;
    state.report_cache.evict_company(company_id);

    info!(company_id, transaction_id, "transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_validation_checks_description() {
        let valid = CreateTransactionRequest {
            date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            amount: dec!(50000),
            description: "Client payment".to_string(),
        };
        assert!(validate_create(&valid).is_ok());

        let blank = CreateTransactionRequest {
            description: "   ".to_string(),
            ..valid
        };
        assert!(matches!(
            validate_create(&blank),
            Err(AppError::Validation(_))
        ));

        let long = CreateTransactionRequest {
            date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            amount: dec!(1),
            description: "x".repeat(513),
        };
        assert!(matches!(
            validate_create(&long),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn view_serializes_date_as_iso_string() {
        let txn = transactions::Model {
            id: 1,
            company_id: 7,
            category_id: None,
            date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            amount: dec!(50000),
            description: "Client payment".to_string(),
            source: finagent_db::entities::sea_orm_active_enums::TransactionSource::Manual,
            created_at: chrono::Utc::now().into(),
        };

        let view = to_view(txn, None);
        assert_eq!(view.date, "2026-02-14");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["date"], "2026-02-14");
        assert_eq!(json["categoryName"], serde_json::Value::Null);
    }
}
