//! Status and payment transitions for a single apprehension.
//!
//! The dialog flow captures a [`StatusChangeContext`] when it opens and hands
//! it to the submit handler, so nothing about the selected record lives in
//! shared state between the two steps.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::apprehension::{ApprehensionRecord, PaymentStatus};
use crate::history::HistoryLogEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Invalid input. Ensure OR Number is provided and the amount matches.")]
    InvalidPayment,

    #[error("cannot set an apprehension to status '{0}'")]
    UnsupportedStatus(PaymentStatus),
}

/// The record selected when the status dialog was opened.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChangeContext {
    pub record_id: String,
    pub current_status: PaymentStatus,
    /// Amount owed at the time of selection; a payment must match it exactly.
    pub selected_total: f64,
}

impl StatusChangeContext {
    pub fn open(record: &ApprehensionRecord) -> Self {
        let selected_total = if record.total_amount.is_finite() {
            record.total_amount
        } else {
            0.0
        };
        Self {
            record_id: record.id.clone(),
            current_status: record.status,
            selected_total,
        }
    }

    /// Payment fields are only relevant when the chosen status is `paid`.
    pub fn needs_payment_fields(status: PaymentStatus) -> bool {
        status == PaymentStatus::Paid
    }

    /// Check a submitted change against the captured selection.
    ///
    /// A payment needs a non-empty OR number and an amount that is positive
    /// and exactly equal to the selected total; there is no rounding tolerance.
    pub fn validate(&self, request: &StatusChangeRequest) -> Result<Transition, PaymentError> {
        match request.status {
            PaymentStatus::Paid => {
                let or_number = request.or_number.trim();
                let amount = request.amount;
                if or_number.is_empty()
                    || !amount.is_finite()
                    || amount <= 0.0
                    || amount != self.selected_total
                {
                    return Err(PaymentError::InvalidPayment);
                }
                Ok(Transition::Paid {
                    or_number: or_number.to_string(),
                    amount,
                })
            }
            PaymentStatus::Unpaid | PaymentStatus::Overdue => {
                Ok(Transition::Status(request.status))
            }
            PaymentStatus::Unknown => Err(PaymentError::UnsupportedStatus(request.status)),
        }
    }
}

/// What the operator submitted from the dialog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusChangeRequest {
    pub status: PaymentStatus,
    pub or_number: String,
    pub amount: f64,
}

/// A validated change, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Paid { or_number: String, amount: f64 },
    Status(PaymentStatus),
}

impl Transition {
    /// Partial document update for the apprehension.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            Self::Paid { or_number, amount } => {
                fields.insert("status".into(), json!(PaymentStatus::Paid.as_str()));
                fields.insert("orNumber".into(), json!(or_number));
                fields.insert("totalAmount".into(), json!(amount));
            }
            Self::Status(status) => {
                fields.insert("status".into(), json!(status.as_str()));
            }
        }
        fields
    }

    /// Audit entry describing this change.
    pub fn history_entry(
        &self,
        context: &StatusChangeContext,
        performed_by: &str,
        at: DateTime<Utc>,
    ) -> HistoryLogEntry {
        match self {
            Self::Paid { or_number, amount } => {
                HistoryLogEntry::payment(*amount, or_number, performed_by, at)
            }
            Self::Status(status) => {
                HistoryLogEntry::status_change(&context.record_id, *status, performed_by, at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(total: f64) -> StatusChangeContext {
        let record = ApprehensionRecord {
            id: "appr-1".into(),
            status: PaymentStatus::Unpaid,
            total_amount: total,
            ..Default::default()
        };
        StatusChangeContext::open(&record)
    }

    fn pay(or_number: &str, amount: f64) -> StatusChangeRequest {
        StatusChangeRequest {
            status: PaymentStatus::Paid,
            or_number: or_number.into(),
            amount,
        }
    }

    #[test]
    fn exact_payment_is_accepted() {
        let t = context(1500.0).validate(&pay("OR-7", 1500.0)).unwrap();
        assert_eq!(
            t,
            Transition::Paid {
                or_number: "OR-7".into(),
                amount: 1500.0
            }
        );
        let fields = t.fields();
        assert_eq!(fields["status"], json!("paid"));
        assert_eq!(fields["orNumber"], json!("OR-7"));
        assert_eq!(fields["totalAmount"], json!(1500.0));
    }

    #[test]
    fn mismatched_amount_is_rejected() {
        let err = context(1500.0).validate(&pay("OR-7", 1499.99)).unwrap_err();
        assert_eq!(err, PaymentError::InvalidPayment);
        assert_eq!(
            err.to_string(),
            "Invalid input. Ensure OR Number is provided and the amount matches."
        );
    }

    #[test]
    fn missing_or_number_is_rejected() {
        assert!(context(100.0).validate(&pay("  ", 100.0)).is_err());
    }

    #[test]
    fn zero_amount_is_rejected_even_when_total_is_zero() {
        assert!(context(0.0).validate(&pay("OR-1", 0.0)).is_err());
    }

    #[test]
    fn non_payment_status_needs_no_receipt() {
        let t = context(100.0)
            .validate(&StatusChangeRequest {
                status: PaymentStatus::Overdue,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(t, Transition::Status(PaymentStatus::Overdue));
        assert_eq!(t.fields().len(), 1);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = context(1.0)
            .validate(&StatusChangeRequest::default())
            .unwrap_err();
        assert_eq!(err, PaymentError::UnsupportedStatus(PaymentStatus::Unknown));
    }

    #[test]
    fn history_entry_follows_transition() {
        let ctx = context(250.0);
        let at = DateTime::from_timestamp(0, 0).unwrap();
        let paid = Transition::Paid {
            or_number: "OR-2".into(),
            amount: 250.0,
        }
        .history_entry(&ctx, "ops@lgu.ph", at);
        assert_eq!(paid.action_type, "Payment");
        assert_eq!(paid.or_number.as_deref(), Some("OR-2"));

        let status =
            Transition::Status(PaymentStatus::Unpaid).history_entry(&ctx, "ops@lgu.ph", at);
        assert_eq!(
            status.details,
            "Status changed to unpaid for document ID: appr-1"
        );
    }

    #[test]
    fn payment_fields_shown_only_for_paid() {
        assert!(StatusChangeContext::needs_payment_fields(PaymentStatus::Paid));
        assert!(!StatusChangeContext::needs_payment_fields(PaymentStatus::Overdue));
    }
}
