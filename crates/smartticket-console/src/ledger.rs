//! Reports page: paid and unpaid ledgers, status changes, and payments.

use chrono::Utc;
use smartticket_core::{
    ApprehensionRecord, Collection, HistoryLogEntry, PaymentError, StatusChangeContext,
    StatusChangeRequest, format_amount,
};
use smartticket_store::{create_record, get_record};
use tracing::{error, info, warn};

use crate::console::{Console, Outcome, View};
use crate::error::ConsoleError;
use crate::table::Table;

impl Console {
    /// One ledger table, most recent first, with its footer total.
    pub async fn ledger(&self, view: &View) -> Result<Table, ConsoleError> {
        self.render(view).await
    }

    /// Capture the selection for the status dialog from the stored record.
    pub async fn open_status_dialog(&self, id: &str) -> Result<StatusChangeContext, ConsoleError> {
        let record: ApprehensionRecord = get_record(self.store(), id)
            .await?
            .ok_or_else(|| ConsoleError::Missing {
                what: "apprehension",
                id: id.to_string(),
            })?;
        Ok(StatusChangeContext::open(&record))
    }

    /// Apply the dialog's submission to the record captured in `context`.
    ///
    /// An invalid payment shows the validation message and writes nothing.
    /// Otherwise the record is updated, an audit entry is appended, and `view`
    /// is re-listed.
    pub async fn submit_status_change(
        &self,
        context: &StatusChangeContext,
        request: StatusChangeRequest,
        view: &View,
    ) -> Result<Outcome, ConsoleError> {
        let transition = match context.validate(&request) {
            Ok(t) => t,
            Err(e @ PaymentError::InvalidPayment) => {
                warn!(record = %context.record_id, "payment rejected");
                self.notifier().error("Error!", &e.to_string());
                return Err(e.into());
            }
            Err(e) => return Err(self.invalid(e.into())),
        };

        let table = self
            .apply_mutation(view, async {
                self.store()
                    .update(
                        Collection::Apprehensions,
                        &context.record_id,
                        transition.fields(),
                    )
                    .await?;
                info!(record = %context.record_id, ?transition, "apprehension updated");
                self.log_history(|performed_by| {
                    transition.history_entry(context, performed_by, Utc::now())
                })
                .await
            })
            .await
            .map_err(|e| match e {
                ConsoleError::NotAuthenticated => {
                    error!(record = %context.record_id, "history not logged: no session");
                    self.notifier().error("Error!", &e.to_string());
                    e
                }
                other => self.fail("There was an error updating the status.", other),
            })?;
        Ok(Outcome::Reloaded(table))
    }

    /// Append an audit entry attributed to the signed-in operator.
    async fn log_history<F>(&self, entry: F) -> Result<(), ConsoleError>
    where
        F: FnOnce(&str) -> HistoryLogEntry + Send,
    {
        let session = self.session().await?;
        let entry = entry(&session.email);
        let id = create_record(self.store(), &entry).await?;
        info!(id = %id, action = %entry.action_type, "history logged");
        Ok(())
    }

    /// The payment summary behind a paid row's Details button.
    pub fn show_payment_details(&self, or_number: &str, amount: f64) {
        self.notifier().info(
            "Payment Details",
            &format!(
                "OR Number: {or_number}\nAmount Paid: {}",
                format_amount(amount)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::fixture;
    use crate::dispatch::{ActionId, Dispatcher};
    use smartticket_core::{PaymentStatus, StatusGroup};
    use smartticket_store::{AuthClient, list_records};

    async fn seed(fx: &crate::console::testing::Fixture, amount: f64) -> String {
        let record = ApprehensionRecord {
            full_name: "Juan Dela Cruz".into(),
            address: "Elm St".into(),
            status: PaymentStatus::Unpaid,
            total_amount: amount,
            timestamp: 1_709_625_600,
            ..Default::default()
        };
        create_record(fx.store.as_ref(), &record).await.unwrap()
    }

    async fn sign_in(fx: &crate::console::testing::Fixture) {
        fx.auth.create_account("ops@lgu.ph", "secret1").await.unwrap();
        fx.auth.sign_in("ops@lgu.ph", "secret1").await.unwrap();
    }

    fn pay(or_number: &str, amount: f64) -> StatusChangeRequest {
        StatusChangeRequest {
            status: PaymentStatus::Paid,
            or_number: or_number.into(),
            amount,
        }
    }

    #[tokio::test]
    async fn exact_payment_moves_record_to_paid_ledger() {
        let fx = fixture(true);
        sign_in(&fx).await;
        let id = seed(&fx, 1500.0).await;

        let ctx = fx.console.open_status_dialog(&id).await.unwrap();
        let outcome = fx
            .console
            .submit_status_change(&ctx, pay("OR-77", 1500.0), &View::ledger(StatusGroup::Paid))
            .await
            .unwrap();
        let Outcome::Reloaded(table) = outcome else {
            panic!("expected reload");
        };
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.footer.as_deref(), Some("Total Paid Amount: ₱1,500"));

        let record: ApprehensionRecord =
            get_record(fx.store.as_ref(), &id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Paid);
        assert_eq!(record.receipt(), Some("OR-77"));

        let logs: Vec<HistoryLogEntry> = list_records(fx.store.as_ref()).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action_type, "Payment");
        assert_eq!(logs[0].details, "Payment of 1500 made");
        assert_eq!(logs[0].total_payment.as_deref(), Some("₱1500.00"));
        assert_eq!(logs[0].performer(), "ops@lgu.ph");
    }

    #[tokio::test]
    async fn mismatched_amount_writes_nothing() {
        let fx = fixture(true);
        sign_in(&fx).await;
        let id = seed(&fx, 1500.0).await;
        let ctx = fx.console.open_status_dialog(&id).await.unwrap();

        let err = fx
            .console
            .submit_status_change(&ctx, pay("OR-77", 1000.0), &View::ledger(StatusGroup::Paid))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Payment(PaymentError::InvalidPayment)));
        assert_eq!(
            fx.notifier.last().unwrap().text,
            "Invalid input. Ensure OR Number is provided and the amount matches."
        );
        let record: ApprehensionRecord =
            get_record(fx.store.as_ref(), &id).await.unwrap().unwrap();
        assert_eq!(record.status, PaymentStatus::Unpaid);
        assert_eq!(fx.store.count(Collection::HistoryLogs), 0);
    }

    #[tokio::test]
    async fn status_change_logs_history() {
        let fx = fixture(true);
        sign_in(&fx).await;
        let id = seed(&fx, 200.0).await;
        let ctx = fx.console.open_status_dialog(&id).await.unwrap();
        fx.console
            .submit_status_change(
                &ctx,
                StatusChangeRequest {
                    status: PaymentStatus::Overdue,
                    ..Default::default()
                },
                &View::ledger(StatusGroup::UnpaidOrOverdue),
            )
            .await
            .unwrap();
        let logs: Vec<HistoryLogEntry> = list_records(fx.store.as_ref()).await.unwrap();
        assert_eq!(
            logs[0].details,
            format!("Status changed to overdue for document ID: {id}")
        );
    }

    #[tokio::test]
    async fn history_needs_a_session() {
        let fx = fixture(true);
        let id = seed(&fx, 200.0).await;
        let ctx = fx.console.open_status_dialog(&id).await.unwrap();
        let err = fx
            .console
            .submit_status_change(
                &ctx,
                StatusChangeRequest {
                    status: PaymentStatus::Overdue,
                    ..Default::default()
                },
                &View::ledger(StatusGroup::UnpaidOrOverdue),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::NotAuthenticated));
        assert_eq!(
            fx.notifier.last().unwrap().text,
            "No authenticated user found."
        );
        assert_eq!(fx.store.count(Collection::HistoryLogs), 0);
    }

    #[tokio::test]
    async fn dialog_opened_from_row_uses_row_total() {
        let fx = fixture(true);
        sign_in(&fx).await;
        seed(&fx, 750.0).await;
        let view = View::ledger(StatusGroup::UnpaidOrOverdue);
        let table = fx.console.ledger(&view).await.unwrap();
        let event = table.rows[0]
            .actions
            .iter()
            .find(|a| a.action == ActionId::ChangeStatus)
            .cloned()
            .unwrap();
        let ctx = match Dispatcher::standard().dispatch(&fx.console, event).await.unwrap() {
            Outcome::StatusDialog(ctx) => ctx,
            other => panic!("unexpected outcome {other:?}"),
        };
        assert_eq!(ctx.selected_total, 750.0);
        let outcome = fx
            .console
            .submit_status_change(&ctx, pay("OR-1", 750.0), &view)
            .await
            .unwrap();
        let Outcome::Reloaded(unpaid) = outcome else {
            panic!("expected reload");
        };
        assert!(unpaid.is_empty());
        assert_eq!(unpaid.footer.as_deref(), Some("Unpaid/Overdue Total: ₱0"));
    }
}
