//! API route definitions.

use axum::Router;
use tracing::warn;

use finagent_db::CompanyRepository;
use finagent_shared::AppError;

use crate::AppState;

pub mod ai;
pub mod anomalies;
pub mod auth;
pub mod health;
pub mod payment;
pub mod reports;
pub mod subscription;
pub mod transactions;

/// Creates the `/api/v1` router. The pipeline middleware is layered by
/// [`crate::create_router`] on the top-level router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(subscription::routes())
        .merge(transactions::routes())
        .merge(reports::routes())
        .merge(anomalies::routes())
        .merge(ai::routes())
        .merge(payment::routes())
}

/// Stage 3 of the request pipeline: tenant-ownership check.
///
/// Fails with an opaque 403 that does not reveal whether the company
/// exists.
pub(crate) async fn ensure_owner(
    state: &AppState,
    company_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    let companies = CompanyRepository::new((*state.db).clone());
    match companies.exists_with_owner(company_id, user_id).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!(user_id, company_id, "tenant ownership check denied");
            Err(AppError::Forbidden(format!(
                "user {user_id} does not own company {company_id}"
            )))
        }
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}
