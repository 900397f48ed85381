//! Anomaly routes: list and dismiss.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use tracing::{info, warn};

use finagent_db::AnomalyRepository;
use finagent_shared::AppError;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::routes::ensure_owner;

/// Creates the anomaly routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{company_id}/anomalies", get(list_anomalies))
        .route("/{company_id}/anomalies/{anomaly_id}", delete(dismiss))
}

/// GET /{company_id}/anomalies - All anomalies, newest first.
async fn list_anomalies(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(company_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, company_id, auth.user().id).await?;

    let anomalies = AnomalyRepository::new((*state.db).clone());
    let rows = anomalies.list_for_company(company_id).await?;

    Ok(Json(rows))
}

/// DELETE /{company_id}/anomalies/{anomaly_id} - Dismiss an alert.
///
/// Dismissal is idempotent: an already-absent anomaly still yields 204.
async fn dismiss(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((company_id, anomaly_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_owner(&state, company_id, auth.user().id).await?;

    let anomalies = AnomalyRepository::new((*state.db).clone());
    match anomalies.find_by_id(anomaly_id).await? {
        Some(anomaly) if anomaly.company_id == company_id => {
            anomalies.delete_by_id(anomaly_id).await?;
            info!(company_id, anomaly_id, "anomaly dismissed");
        }
        Some(_) => {
            warn!(
                company_id,
                anomaly_id, "dismiss denied, anomaly belongs to another tenant"
            );
            return Err(AppError::Forbidden(format!(
                "anomaly {anomaly_id} does not belong to company {company_id}"
            ))
            .into());
        }
        None => {}
    }

    Ok(StatusCode::NO_CONTENT)
}
