//! Reporting routes: cached P&L per period.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use finagent_core::reports::{CategorySum, PnLReport, build_report, resolve_period};
use finagent_db::TransactionRepository;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::routes::ensure_owner;

/// Creates the reporting routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{company_id}/reports/pnl", get(pnl))
        .route("/{company_id}/reports/summary", get(summary))
}

/// Query parameters for the P&L report.
#[derive(Debug, Deserialize)]
pub struct PnlQuery {
    /// Period key: "month", "quarter", "year", or "YYYY-MM".
    pub period: Option<String>,
}

/// Computes a report, reading through the per-tenant cache.
async fn cached_report(
    state: &AppState,
    company_id: i64,
    period: &str,
) -> Result<Arc<PnLReport>, ApiError> {
    if let Some(report) = state.report_cache.get(company_id, period) {
        return Ok(report);
    }

    info!(company_id, period, "computing P&L report");

    let today = state.clock.today();
    let range = resolve_period(period, today);

    let transactions = TransactionRepository::new((*state.db).clone());
    let income = transactions
        .sum_positive(company_id, range.start, range.end)
        .await?;
    let raw_expense = transactions
        .sum_negative(company_id, range.start, range.end)
        .await?;
    let rows = transactions
        .sum_by_category(company_id, range.start, range.end)
        .await?
        .into_iter()
        .map(|row| CategorySum {
            category_name: row.category_name,
            total: row.total.unwrap_or_default(),
        })
        .collect();

    let report = Arc::new(build_report(period, range, income, raw_expense, rows));
    state
        .report_cache
        .insert(company_id, period, Arc::clone(&report));

    Ok(report)
}

/// GET /{company_id}/reports/pnl?period=month - P&L for one period.
async fn pnl(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<i64>,
    Query(query): Query<PnlQuery>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, company_id, auth.user().id).await?;

    let period = query.period.as_deref().unwrap_or("month");
    let report = cached_report(&state, company_id, period).await?;

    Ok(Json((*report).clone()))
}

/// GET /{company_id}/reports/summary - Month, quarter, and year reports
/// in one call.
async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, company_id, auth.user().id).await?;

    let monthly = cached_report(&state, company_id, "month").await?;
    let quarterly = cached_report(&state, company_id, "quarter").await?;
    let yearly = cached_report(&state, company_id, "year").await?;

    Ok(Json(serde_json::json!({
        "monthly": (*monthly).clone(),
        "quarterly": (*quarterly).clone(),
        "yearly": (*yearly).clone(),
    })))
}
