//! Append-only audit trail of status and payment changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::apprehension::PaymentStatus;
use crate::dates::iso_timestamp;
use crate::money::format_amount_fixed;
use crate::schema::{Collection, Entity};

pub const ACTION_STATUS_CHANGE: &str = "Status Change";
pub const ACTION_PAYMENT: &str = "Payment";

/// One audit entry in `historyLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLogEntry {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub details: String,
    /// Email of the operator who made the change.
    #[serde(default)]
    pub performed_by: Option<String>,
    /// ISO 8601 timestamp string.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or_number: Option<String>,
    /// Pre-formatted amount, e.g. `₱1500.00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_payment: Option<String>,
}

impl HistoryLogEntry {
    /// Entry for a non-payment status transition.
    pub fn status_change(
        record_id: &str,
        status: PaymentStatus,
        performed_by: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            action_type: ACTION_STATUS_CHANGE.to_string(),
            details: format!("Status changed to {status} for document ID: {record_id}"),
            performed_by: Some(performed_by.to_string()),
            timestamp: iso_timestamp(at),
            or_number: None,
            total_payment: None,
        }
    }

    /// Entry for a recorded payment.
    pub fn payment(amount: f64, or_number: &str, performed_by: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            action_type: ACTION_PAYMENT.to_string(),
            details: format!("Payment of {amount} made"),
            performed_by: Some(performed_by.to_string()),
            timestamp: iso_timestamp(at),
            or_number: Some(or_number.to_string()),
            total_payment: Some(format_amount_fixed(amount)),
        }
    }

    pub fn performer(&self) -> &str {
        self.performed_by
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

impl Entity for HistoryLogEntry {
    const COLLECTION: Collection = Collection::HistoryLogs;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
