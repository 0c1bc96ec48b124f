//! Row actions keyed by action id.
//!
//! A table row carries [`ActionEvent`]s. The front-end hands the chosen one
//! to a [`Dispatcher`], which looks the id up and runs its handler.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use futures::future::BoxFuture;
use smartticket_core::money::parse_amount;
use smartticket_core::{PaymentStatus, StatusChangeContext};
use tracing::debug;

use crate::console::{Console, Outcome};
use crate::error::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    EditUser,
    DeleteUser,
    EditDriver,
    DeleteDriver,
    ChangeStatus,
    ViewDetails,
}

impl ActionId {
    pub const ALL: [ActionId; 6] = [
        ActionId::EditUser,
        ActionId::DeleteUser,
        ActionId::EditDriver,
        ActionId::DeleteDriver,
        ActionId::ChangeStatus,
        ActionId::ViewDetails,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EditUser => "edit-user",
            Self::DeleteUser => "delete-user",
            Self::EditDriver => "edit-driver",
            Self::DeleteDriver => "delete-driver",
            Self::ChangeStatus => "change-status",
            Self::ViewDetails => "view-details",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ConsoleError::Unhandled(s.to_string()))
    }
}

/// A click on a row button: which action, which record, and the button's data attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    pub action: ActionId,
    pub record_id: String,
    pub data: BTreeMap<String, String>,
}

impl ActionEvent {
    pub fn new(action: ActionId, record_id: &str, data: BTreeMap<String, String>) -> Self {
        Self {
            action,
            record_id: record_id.to_string(),
            data,
        }
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    fn require(&self, key: &'static str) -> Result<&str, ConsoleError> {
        self.data(key).ok_or(ConsoleError::MissingData {
            action: self.action.as_str(),
            key,
        })
    }
}

pub type Handler =
    for<'a> fn(&'a Console, ActionEvent) -> BoxFuture<'a, Result<Outcome, ConsoleError>>;

/// Action id to handler table.
pub struct Dispatcher {
    handlers: HashMap<ActionId, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::standard()
    }
}

impl Dispatcher {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Table with a handler for every row action the console renders.
    pub fn standard() -> Self {
        let mut d = Self::empty();
        d.register(ActionId::EditUser, edit_user);
        d.register(ActionId::DeleteUser, delete_user);
        d.register(ActionId::EditDriver, edit_driver);
        d.register(ActionId::DeleteDriver, delete_driver);
        d.register(ActionId::ChangeStatus, change_status);
        d.register(ActionId::ViewDetails, view_details);
        d
    }

    pub fn register(&mut self, action: ActionId, handler: Handler) {
        self.handlers.insert(action, handler);
    }

    pub async fn dispatch(
        &self,
        console: &Console,
        event: ActionEvent,
    ) -> Result<Outcome, ConsoleError> {
        let handler = self
            .handlers
            .get(&event.action)
            .ok_or_else(|| ConsoleError::Unhandled(event.action.to_string()))?;
        debug!(action = %event.action, record = %event.record_id, "dispatching action");
        handler(console, event).await
    }
}

fn edit_user(console: &Console, event: ActionEvent) -> BoxFuture<'_, Result<Outcome, ConsoleError>> {
    Box::pin(async move {
        let form = console.user_edit_form(&event.record_id).await?;
        Ok(Outcome::EditUser {
            id: event.record_id,
            form,
        })
    })
}

fn delete_user(
    console: &Console,
    event: ActionEvent,
) -> BoxFuture<'_, Result<Outcome, ConsoleError>> {
    Box::pin(async move { console.delete_user(&event.record_id).await })
}

fn edit_driver(
    console: &Console,
    event: ActionEvent,
) -> BoxFuture<'_, Result<Outcome, ConsoleError>> {
    Box::pin(async move {
        let form = console.driver_edit_form(&event.record_id).await?;
        Ok(Outcome::EditDriver {
            id: event.record_id,
            form,
        })
    })
}

fn delete_driver(
    console: &Console,
    event: ActionEvent,
) -> BoxFuture<'_, Result<Outcome, ConsoleError>> {
    Box::pin(async move { console.delete_driver(&event.record_id).await })
}

/// Opens the status dialog from the button's own attributes.
fn change_status(
    _console: &Console,
    event: ActionEvent,
) -> BoxFuture<'_, Result<Outcome, ConsoleError>> {
    Box::pin(async move {
        let current_status = event
            .data("status")
            .and_then(|s| s.parse::<PaymentStatus>().ok())
            .unwrap_or_default();
        let selected_total = parse_amount(event.require("total")?);
        Ok(Outcome::StatusDialog(StatusChangeContext {
            record_id: event.record_id,
            current_status,
            selected_total,
        }))
    })
}

fn view_details(
    console: &Console,
    event: ActionEvent,
) -> BoxFuture<'_, Result<Outcome, ConsoleError>> {
    Box::pin(async move {
        let or_number = event.data("or").unwrap_or_default();
        let amount = parse_amount(event.require("amount")?);
        console.show_payment_details(or_number, amount);
        Ok(Outcome::Shown)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use std::sync::Arc;

    #[test]
    fn ids_round_trip_through_strings() {
        for id in ActionId::ALL {
            assert_eq!(id.as_str().parse::<ActionId>().unwrap(), id);
        }
        assert!("launch-missiles".parse::<ActionId>().is_err());
    }

    #[tokio::test]
    async fn change_status_opens_dialog_from_attributes() {
        let console = Console::in_memory(Arc::new(RecordingNotifier::answering(true)));
        let event = ActionEvent::new(
            ActionId::ChangeStatus,
            "a1",
            BTreeMap::from([
                ("status".to_string(), "overdue".to_string()),
                ("total".to_string(), "1500".to_string()),
            ]),
        );
        let outcome = Dispatcher::standard()
            .dispatch(&console, event)
            .await
            .unwrap();
        let ctx = match outcome {
            Outcome::StatusDialog(ctx) => ctx,
            other => panic!("expected a status dialog, got {other:?}"),
        };
        assert_eq!(ctx.record_id, "a1");
        assert_eq!(ctx.current_status, PaymentStatus::Overdue);
        assert_eq!(ctx.selected_total, 1500.0);
    }

    #[tokio::test]
    async fn view_details_shows_payment_dialog() {
        let notifier = Arc::new(RecordingNotifier::answering(true));
        let console = Console::in_memory(notifier.clone());
        let event = ActionEvent::new(
            ActionId::ViewDetails,
            "a1",
            BTreeMap::from([
                ("or".to_string(), "OR-9".to_string()),
                ("amount".to_string(), "2500".to_string()),
            ]),
        );
        Dispatcher::standard()
            .dispatch(&console, event)
            .await
            .unwrap();
        let dialog = notifier.last().unwrap();
        assert_eq!(dialog.title, "Payment Details");
        assert_eq!(dialog.text, "OR Number: OR-9\nAmount Paid: ₱2,500");
    }

    #[tokio::test]
    async fn missing_handler_is_reported() {
        let console = Console::in_memory(Arc::new(RecordingNotifier::answering(true)));
        let event = ActionEvent::new(ActionId::DeleteUser, "u1", BTreeMap::new());
        let err = Dispatcher::empty()
            .dispatch(&console, event)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Unhandled(a) if a == "delete-user"));
    }

    #[tokio::test]
    async fn missing_total_attribute_is_an_error() {
        let console = Console::in_memory(Arc::new(RecordingNotifier::answering(true)));
        let event = ActionEvent::new(ActionId::ChangeStatus, "a1", BTreeMap::new());
        let err = Dispatcher::standard()
            .dispatch(&console, event)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::MissingData {
                key: "total",
                ..
            }
        ));
    }
}
