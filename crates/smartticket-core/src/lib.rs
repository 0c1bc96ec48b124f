//! Core of the SmartTicket console: record types, the reporting engine, ledger
//! filters, payment transitions, and form validation.

pub mod apprehension;
pub mod config;
pub mod dates;
pub mod history;
pub mod ledger;
pub mod money;
pub mod payment;
pub mod registry;
pub mod schema;
pub mod stats;
pub mod validate;

pub use apprehension::{ApprehensionRecord, PaymentStatus, Violation};
pub use config::{ConfigError, ConsoleConfig};
pub use history::HistoryLogEntry;
pub use ledger::{LedgerFilter, LedgerView, StatusGroup, filter_by_status_and_criteria};
pub use money::{format_amount, format_amount_fixed};
pub use payment::{PaymentError, StatusChangeContext, StatusChangeRequest, Transition};
pub use registry::{DriverForm, DriverRecord, NewUserForm, ProfileUpdate, UserEdit, UserRecord};
pub use schema::{Collection, Entity};
pub use stats::{
    Dimension, FrequencyTable, FrequencyTables, Recommendation, build_frequency_tables,
    build_frequency_tables_in, recommend,
};
pub use validate::FormError;
