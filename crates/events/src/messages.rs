//! Wire shapes shared with the anomaly worker. JSON only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Event published after new transactions are committed.
///
/// Serialized as `{"companyId": <long>, "txnIds": [<long>, ...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsNewEvent {
    /// Tenant the transactions belong to.
    pub company_id: i64,
    /// IDs of the newly persisted transactions.
    pub txn_ids: Vec<i64>,
}

/// One detected anomaly in a results message.
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyEntry {
    /// Source transaction ID; null when the worker could not attribute one.
    pub id: Option<i64>,
    /// Flagged amount.
    pub amount: Decimal,
}

/// Message consumed from the anomaly results queue.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyResultsMessage {
    /// Tenant the anomalies belong to.
    pub company_id: i64,
    /// Detected anomalies; may be empty or absent.
    #[serde(default)]
    pub anomalies: Vec<AnomalyEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn transactions_event_serializes_with_camel_case_keys() {
        let event = TransactionsNewEvent {
            company_id: 7,
            txn_ids: vec![42, 43],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["companyId"], 7);
        assert_eq!(json["txnIds"], serde_json::json!([42, 43]));
    }

    #[test]
    fn results_message_parses_worker_payload() {
        let raw = r#"{"companyId":7,"anomalies":[{"id":42,"amount":-999999}]}"#;
        let msg: AnomalyResultsMessage = serde_json::from_str(raw).unwrap();

        assert_eq!(msg.company_id, 7);
        assert_eq!(msg.anomalies.len(), 1);
        assert_eq!(msg.anomalies[0].id, Some(42));
        assert_eq!(msg.anomalies[0].amount, dec!(-999999));
    }

    #[test]
    fn results_message_tolerates_missing_anomalies() {
        let msg: AnomalyResultsMessage = serde_json::from_str(r#"{"companyId":7}"#).unwrap();
        assert!(msg.anomalies.is_empty());
    }

    #[test]
    fn anomaly_entry_tolerates_null_id() {
        let raw = r#"{"companyId":7,"anomalies":[{"id":null,"amount":"12.5"}]}"#;
        let msg: AnomalyResultsMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.anomalies[0].id, None);
        assert_eq!(msg.anomalies[0].amount, dec!(12.5));
    }
}
