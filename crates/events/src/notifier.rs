//! Best-effort owner notification for detected anomalies.
//!
//! One message from the anomaly worker produces at most one email. Every
//! failure along the way is logged and swallowed; mail problems must never
//! reach the consumer loop.

use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use finagent_db::entities::anomalies;
use finagent_db::{CompanyRepository, UserRepository};
use finagent_shared::MailService;

/// Sends anomaly alert emails to company owners.
#[derive(Clone)]
pub struct AnomalyNotifier {
    db: DatabaseConnection,
    mail: MailService,
}

impl AnomalyNotifier {
    /// Creates a new notifier.
    #[must_use]
    pub const fn new(db: DatabaseConnection, mail: MailService) -> Self {
        Self { db, mail }
    }

    /// Notifies the company owner about a batch of anomalies.
    ///
    /// Missing company or owner rows are logged and skipped. Send errors
    /// are logged and swallowed.
    pub async fn notify(&self, company_id: i64, anomalies: Vec<anomalies::Model>) {
        if anomalies.is_empty() {
            return;
        }

        let companies = CompanyRepository::new(self.db.clone());
        let company = match companies.find_by_id(company_id).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                warn!(company_id, "company not found, skipping anomaly alert");
                return;
            }
            Err(e) => {
                warn!(company_id, error = %e, "company lookup failed, skipping anomaly alert");
                return;
            }
        };

        let users = UserRepository::new(self.db.clone());
        let owner = match users.find_by_id(company.owner_user_id).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(
                    company_id,
                    owner_user_id = company.owner_user_id,
                    "owner not found, skipping anomaly alert"
                );
                return;
            }
            Err(e) => {
                warn!(company_id, error = %e, "owner lookup failed, skipping anomaly alert");
                return;
            }
        };

        let subject = build_subject(self.mail.from_name(), anomalies.len(), &company.name);
        let body = build_body(&company.name, &company.currency, &anomalies);

        match self.mail.send_email(&owner.email, &subject, &body).await {
            Ok(()) => info!(
                company_id,
                recipient = %owner.email,
                count = anomalies.len(),
                "anomaly alert sent"
            ),
            Err(e) => warn!(
                company_id,
                recipient = %owner.email,
                error = %e,
                "failed to send anomaly alert"
            ),
        }
    }
}

fn build_subject(app_name: &str, count: usize, company_name: &str) -> String {
    let plural = if count == 1 { "anomaly" } else { "anomalies" };
    format!("[{app_name}] {count} {plural} detected in {company_name}")
}

fn build_body(company_name: &str, currency: &str, anomalies: &[anomalies::Model]) -> String {
    let mut body = format!(
        "Unusual transactions were detected in {company_name}:\n\n"
    );

    for anomaly in anomalies {
        let txn = anomaly
            .transaction_id
            .map_or_else(|| "N/A".to_string(), |id| format!("#{id}"));
        body.push_str(&format!(
            "  - {currency} {} (transaction {txn}, detected {})\n",
            anomaly.amount.abs(),
            anomaly.detected_at.format("%d %b %Y, %H:%M")
        ));
    }

    body.push_str(
        "\nPlease review these transactions in your dashboard. If they look \
         correct you can dismiss the alerts; if not, take action immediately.\n",
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn anomaly(id: i64, txn: Option<i64>, amount: rust_decimal::Decimal) -> anomalies::Model {
        anomalies::Model {
            id,
            company_id: 7,
            transaction_id: txn,
            amount,
            detected_at: Utc.with_ymd_and_hms(2026, 6, 1, 10, 30, 0).unwrap().into(),
        }
    }

    #[test]
    fn subject_pluralizes() {
        assert_eq!(
            build_subject("Finagent", 1, "Acme"),
            "[Finagent] 1 anomaly detected in Acme"
        );
        assert_eq!(
            build_subject("Finagent", 3, "Acme"),
            "[Finagent] 3 anomalies detected in Acme"
        );
    }

    #[test]
    fn body_lists_each_anomaly() {
        let body = build_body(
            "Acme",
            "USD",
            &[
                anomaly(1, Some(42), dec!(-999999)),
                anomaly(2, None, dec!(120.50)),
            ],
        );

        assert!(body.contains("Acme"));
        assert!(body.contains("transaction #42"));
        assert!(body.contains("transaction N/A"));
        // Amounts are shown as magnitudes.
        assert!(body.contains("USD 999999"));
    }
}
