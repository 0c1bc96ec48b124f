//! Console pages: table rendering, form controllers, action dispatch, and spreadsheet export.

mod error;
pub use error::ConsoleError;

pub mod console;
pub mod dispatch;
pub mod drivers;
pub mod export;
pub mod history;
pub mod ledger;
pub mod login;
pub mod notify;
pub mod reports;
pub mod settings;
pub mod table;
pub mod users;

pub use console::{Console, Outcome, Upload, View};
pub use dispatch::{ActionEvent, ActionId, Dispatcher};
pub use notify::{Dialog, DialogKind, Notifier};
pub use reports::DashboardSummary;
pub use table::{Row, Table};
